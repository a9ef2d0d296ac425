//! A positioned, optionally animated bitmap sourced from one or two planes.

use crate::color::Color;
use crate::constants::PLANE_BYTES;

/// All zero, long enough to stand in for `Sprite::Mono`'s absent plane1 —
/// a mono bitmap can never need more bytes per frame than a full
/// framebuffer plane.
const ZERO_PLANE: [u8; PLANE_BYTES] = [0; PLANE_BYTES];

/// A `width` x `height` bitmap positioned at `(x, y)`, with an optional
/// animation strip: the bitmap holds `frame_count` frames back to back,
/// each `width * ((height + 7) / 8)` bytes per plane.
///
/// `Mono` sources a single plane; the destination's plane1 is treated as
/// if it were all zero, since a 2-bit framebuffer has no concept of
/// "leave this plane untouched" for a drawing primitive. `Shaded` supplies
/// both planes explicitly.
pub enum Sprite<'a> {
    Mono(SpriteFrames<'a>),
    Shaded(SpriteFrames<'a>, &'a [u8]),
}

/// The fields common to both sprite variants: position, extent, animation
/// state, and the primary (plane0) bitmap.
pub struct SpriteFrames<'a> {
    bitmap: &'a [u8],
    pub width: u16,
    pub height: u16,
    pub x: i32,
    pub y: i32,
    pub key: Option<Color>,
    pub mirror_x: bool,
    pub mirror_y: bool,
    frame_count: u16,
    current_frame: u16,
}

impl<'a> SpriteFrames<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bitmap: &'a [u8],
        width: u16,
        height: u16,
        frame_count: u16,
        x: i32,
        y: i32,
        key: Option<Color>,
    ) -> Self {
        Self {
            bitmap,
            width,
            height,
            x,
            y,
            key,
            mirror_x: false,
            mirror_y: false,
            frame_count: frame_count.max(1),
            current_frame: 0,
        }
    }

    fn pages(&self) -> usize {
        (self.height as usize + 7) / 8
    }

    fn frame_bytes(&self) -> usize {
        self.width as usize * self.pages()
    }

    fn current_frame_bytes(&self) -> &'a [u8] {
        let frame_bytes = self.frame_bytes();
        let start = self.current_frame as usize * frame_bytes;
        &self.bitmap[start..start + frame_bytes]
    }
}

impl<'a> Sprite<'a> {
    /// Build a single-plane sprite; the destination's plane1 is treated as
    /// all zero wherever this sprite is blitted.
    #[allow(clippy::too_many_arguments)]
    pub fn mono(
        bitmap: &'a [u8],
        width: u16,
        height: u16,
        frame_count: u16,
        x: i32,
        y: i32,
        key: Option<Color>,
    ) -> Self {
        Sprite::Mono(SpriteFrames::new(bitmap, width, height, frame_count, x, y, key))
    }

    /// Build a two-plane sprite.
    #[allow(clippy::too_many_arguments)]
    pub fn shaded(
        plane0: &'a [u8],
        plane1: &'a [u8],
        width: u16,
        height: u16,
        frame_count: u16,
        x: i32,
        y: i32,
        key: Option<Color>,
    ) -> Self {
        Sprite::Shaded(SpriteFrames::new(plane0, width, height, frame_count, x, y, key), plane1)
    }

    fn frames(&self) -> &SpriteFrames<'a> {
        match self {
            Sprite::Mono(f) => f,
            Sprite::Shaded(f, _) => f,
        }
    }

    fn frames_mut(&mut self) -> &mut SpriteFrames<'a> {
        match self {
            Sprite::Mono(f) => f,
            Sprite::Shaded(f, _) => f,
        }
    }

    pub fn width(&self) -> u16 {
        self.frames().width
    }

    pub fn height(&self) -> u16 {
        self.frames().height
    }

    pub fn x(&self) -> i32 {
        self.frames().x
    }

    pub fn y(&self) -> i32 {
        self.frames().y
    }

    pub fn key(&self) -> Option<Color> {
        self.frames().key
    }

    pub fn mirror_x(&self) -> bool {
        self.frames().mirror_x
    }

    pub fn mirror_y(&self) -> bool {
        self.frames().mirror_y
    }

    pub fn frame_count(&self) -> u16 {
        self.frames().frame_count
    }

    pub fn current_frame(&self) -> u16 {
        self.frames().current_frame
    }

    /// Select the active frame, wrapping modulo `frame_count`.
    pub fn set_frame(&mut self, frame: u16) {
        let f = self.frames_mut();
        f.current_frame = frame % f.frame_count;
    }

    /// Advance to the next frame, wrapping back to 0 after the last.
    pub fn next_frame(&mut self) {
        let f = self.frames_mut();
        f.current_frame = (f.current_frame + 1) % f.frame_count;
    }

    /// The `(plane0, plane1)` byte slices for the current frame. For
    /// `Mono`, plane1 is a same-length all-zero slice.
    pub fn current_frame_planes(&self) -> (&'a [u8], &'a [u8]) {
        match self {
            Sprite::Mono(f) => {
                let p0 = f.current_frame_bytes();
                (p0, &ZERO_PLANE[..p0.len()])
            }
            Sprite::Shaded(f, plane1) => {
                let frame_bytes = f.frame_bytes();
                let start = f.current_frame as usize * frame_bytes;
                (f.current_frame_bytes(), &plane1[start..start + frame_bytes])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color;

    #[test]
    fn mono_sprite_synthesizes_zero_plane1() {
        let bitmap = [0xaau8; 8];
        let sprite = Sprite::mono(&bitmap, 8, 8, 1, 0, 0, None);
        let (p0, p1) = sprite.current_frame_planes();
        assert_eq!(p0, &bitmap[..]);
        assert!(p1.iter().all(|&b| b == 0));
        assert_eq!(p1.len(), p0.len());
    }

    #[test]
    fn shaded_sprite_returns_both_planes() {
        let p0 = [0xaau8; 8];
        let p1 = [0x55u8; 8];
        let sprite = Sprite::shaded(&p0, &p1, 8, 8, 1, 0, 0, Some(color::BLACK));
        let (s0, s1) = sprite.current_frame_planes();
        assert_eq!(s0, &p0[..]);
        assert_eq!(s1, &p1[..]);
        assert_eq!(sprite.key(), Some(color::BLACK));
    }

    #[test]
    fn multi_frame_advances_and_wraps() {
        let bitmap = [0u8; 16]; // two 8x8 frames, one page each
        let mut sprite = Sprite::mono(&bitmap, 8, 8, 2, 0, 0, None);
        assert_eq!(sprite.current_frame(), 0);
        sprite.next_frame();
        assert_eq!(sprite.current_frame(), 1);
        sprite.next_frame();
        assert_eq!(sprite.current_frame(), 0);
        sprite.set_frame(5);
        assert_eq!(sprite.current_frame(), 1);
    }
}
