//! The 2D drawing primitive set: the concrete reference implementation of the
//! [`Rasterizer`] contract over [`Framebuffer`].
//!
//! All coordinates clip to `[0, WIDTH) x [0, HEIGHT)`; a shape that falls
//! entirely outside the panel, or has non-positive width/height, is a no-op.

use crate::color::{self, Color};
use crate::constants::{HEIGHT, WIDTH};
use crate::font::Font;
use crate::framebuffer::{set_bit, Framebuffer};
use crate::sprite::Sprite;

/// The drawing operations a consumer writes a frame through. `Framebuffer`
/// is the only implementation in this crate, but the trait is the seam a
/// different rasterizer (a hardware blitter, a software renderer with a
/// different clipping policy) would plug in at.
pub trait Rasterizer {
    fn fill(&mut self, color: Color);
    fn set_pixel(&mut self, x: i32, y: i32, color: Color);
    fn get_pixel(&self, x: i32, y: i32) -> Color;
    fn hline(&mut self, x: i32, y: i32, width: i32, color: Color);
    fn vline(&mut self, x: i32, y: i32, height: i32, color: Color);
    fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color);
    fn rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color);
    fn filled_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color);
    fn draw_text(&mut self, font: &Font<'_>, text: &str, x: i32, y: i32, color: Color);

    /// Blit a `width` x `height` two-plane source bitmap (its own
    /// column-major page layout, stride = `width`) at `(x, y)`. `key`
    /// disables drawing for source pixels whose decoded color equals it.
    #[allow(clippy::too_many_arguments)]
    fn blit(
        &mut self,
        src0: &[u8],
        src1: &[u8],
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        key: Option<Color>,
        mirror_x: bool,
        mirror_y: bool,
    );

    /// Like [`Rasterizer::blit`], but `mask` (same stride as the source)
    /// suppresses any source pixel whose mask bit is set, instead of
    /// color-keying.
    #[allow(clippy::too_many_arguments)]
    fn blit_with_mask(
        &mut self,
        src0: &[u8],
        src1: &[u8],
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        mirror_x: bool,
        mirror_y: bool,
        mask: &[u8],
    );

    /// Draw a [`Sprite`]'s current frame at its stored position.
    fn draw_sprite(&mut self, sprite: &Sprite<'_>) {
        let (src0, src1) = sprite.current_frame_planes();
        self.blit(
            src0,
            src1,
            sprite.x(),
            sprite.y(),
            sprite.width() as i32,
            sprite.height() as i32,
            sprite.key(),
            sprite.mirror_x(),
            sprite.mirror_y(),
        );
    }

    /// Draw a [`Sprite`]'s current frame masked by another sprite's plane0.
    fn draw_sprite_with_mask(&mut self, sprite: &Sprite<'_>, mask: &Sprite<'_>) {
        let (src0, src1) = sprite.current_frame_planes();
        let (mask0, _) = mask.current_frame_planes();
        self.blit_with_mask(
            src0,
            src1,
            sprite.x(),
            sprite.y(),
            sprite.width() as i32,
            sprite.height() as i32,
            sprite.mirror_x(),
            sprite.mirror_y(),
            mask0,
        );
    }
}

/// Compute the `len`-bit mask (`len` in `0..=8`) left-shifted by `shift`,
/// and its complement. Both fit a `u8` for any `len + shift <= 8`.
#[inline]
fn span_mask(len: i32, shift: i32) -> (u8, u8) {
    let m = (((1i32 << len) - 1) << shift) as u8;
    (m, !m)
}

#[inline]
fn apply_mask(byte: &mut u8, mask: u8, inv_mask: u8, set: bool) {
    if set {
        *byte |= mask;
    } else {
        *byte &= inv_mask;
    }
}

impl Rasterizer for Framebuffer {
    fn fill(&mut self, color: Color) {
        Framebuffer::fill(self, color);
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        Framebuffer::set_pixel(self, x, y, color);
    }

    fn get_pixel(&self, x: i32, y: i32) -> Color {
        Framebuffer::get_pixel(self, x, y)
    }

    fn hline(&mut self, x: i32, y: i32, width: i32, color: Color) {
        if y < 0 || y >= HEIGHT as i32 {
            return;
        }
        if x >= WIDTH as i32 || width <= 0 {
            return;
        }
        let (mut x, mut width) = (x, width);
        if x < 0 {
            width += x;
            x = 0;
        }
        let mut x2 = x + width;
        if x2 > WIDTH as i32 {
            x2 = WIDTH as i32;
        }
        if x2 <= x {
            return;
        }
        let w = WIDTH as i32;
        let o = (y >> 3) * w;
        let oe = o + x2;
        let m = 1u8 << (y & 7);
        let im = !m;
        let (p0, p1) = color::decompose(color);
        for off in (o + x)..oe {
            apply_mask(&mut self.plane0[off as usize], m, im, p0);
            apply_mask(&mut self.plane1[off as usize], m, im, p1);
        }
    }

    fn vline(&mut self, x: i32, y: i32, height: i32, color: Color) {
        if x < 0 || x >= WIDTH as i32 {
            return;
        }
        if y >= HEIGHT as i32 || height <= 0 {
            return;
        }
        let (mut y, mut height) = (y, height);
        if y < 0 {
            height += y;
            y = 0;
        }
        if y + height > HEIGHT as i32 {
            height = HEIGHT as i32 - y;
        }
        if height <= 0 {
            return;
        }
        let w = WIDTH as i32;
        let mut o = (y >> 3) * w + x;
        let (p0, p1) = color::decompose(color);

        let yb = y & 7;
        let ybh = 8 - yb;
        let mut remaining = height;
        let (m, im) = span_mask(remaining.min(ybh), yb);
        apply_mask(&mut self.plane0[o as usize], m, im, p0);
        apply_mask(&mut self.plane1[o as usize], m, im, p1);
        remaining -= ybh;

        let v0: u8 = if p0 { 0xff } else { 0 };
        let v1: u8 = if p1 { 0xff } else { 0 };
        while remaining >= 8 {
            o += w;
            self.plane0[o as usize] = v0;
            self.plane1[o as usize] = v1;
            remaining -= 8;
        }
        if remaining > 0 {
            o += w;
            let (m, im) = span_mask(remaining, 0);
            apply_mask(&mut self.plane0[o as usize], m, im, p0);
            apply_mask(&mut self.plane1[o as usize], m, im, p1);
        }
    }

    fn rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color) {
        self.hline(x, y, width, color);
        self.hline(x, y + height - 1, width, color);
        self.vline(x, y, height, color);
        self.vline(x + width - 1, y, height, color);
    }

    fn filled_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color) {
        if x > WIDTH as i32 - 1 || y > HEIGHT as i32 - 1 || width <= 0 || height <= 0 {
            return;
        }
        let (mut x, mut width) = (x, width);
        let (mut y, mut height) = (y, height);
        if x < 0 {
            width += x;
            x = 0;
        }
        if y < 0 {
            height += y;
            y = 0;
        }
        let mut x2 = x + width;
        let mut y2 = y + height;
        if x2 > WIDTH as i32 {
            x2 = WIDTH as i32;
            width = WIDTH as i32 - x;
        }
        if y2 > HEIGHT as i32 {
            y2 = HEIGHT as i32;
            height = HEIGHT as i32 - y;
        }
        if width <= 0 || height <= 0 {
            return;
        }

        let w = WIDTH as i32;
        let mut o = (y >> 3) * w;
        let mut oe = o + x2;
        o += x;
        let stride = w - width;

        let (p0, p1) = color::decompose(color);
        let v0: u8 = if p0 { 0xff } else { 0 };
        let v1: u8 = if p1 { 0xff } else { 0 };

        let yb = y & 7;
        let ybh = 8 - yb;
        let mut remaining = height;
        let (m, im) = span_mask(remaining.min(ybh), yb);
        let mut row = o;
        while row < oe {
            apply_mask(&mut self.plane0[row as usize], m, im, p0);
            apply_mask(&mut self.plane1[row as usize], m, im, p1);
            row += 1;
        }
        remaining -= ybh;

        while remaining >= 8 {
            o += stride;
            oe += w;
            let mut row = o;
            while row < oe {
                self.plane0[row as usize] = v0;
                self.plane1[row as usize] = v1;
                row += 1;
            }
            remaining -= 8;
        }
        if remaining > 0 {
            o += stride;
            oe += w;
            let (m, im) = span_mask(remaining, 0);
            let mut row = o;
            while row < oe {
                apply_mask(&mut self.plane0[row as usize], m, im, p0);
                apply_mask(&mut self.plane1[row as usize], m, im, p1);
                row += 1;
            }
        }
    }

    fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        if x0 == x1 {
            if y0 == y1 {
                self.set_pixel(x0, y0, color);
            } else if y0 < y1 {
                self.vline(x0, y0, y1 - y0 + 1, color);
            } else {
                self.vline(x0, y1, y0 - y1 + 1, color);
            }
            return;
        }
        if y0 == y1 {
            if x0 < x1 {
                self.hline(x0, y0, x1 - x0 + 1, color);
            } else {
                self.hline(x1, y0, x0 - x1 + 1, color);
            }
            return;
        }

        let (mut x0, mut y0, mut x1, mut y1) = (x0, y0, x1, y1);
        let mut dx = x1 - x0;
        let mut dy = y1 - y0;
        let mut sx: i32 = 1;
        if dy < 0 {
            core::mem::swap(&mut x0, &mut x1);
            core::mem::swap(&mut y0, &mut y1);
            dy = -dy;
            dx = -dx;
        }
        if dx < 0 {
            dx = -dx;
            sx = -1;
        }

        let mut x = x0;
        let mut y = y0;
        let plot = |fb: &mut Self, x: i32, y: i32| {
            if (0..WIDTH as i32).contains(&x) && (0..HEIGHT as i32).contains(&y) {
                fb.set_pixel(x, y, color);
            }
        };

        if dx > dy {
            let mut err = dx >> 1;
            while x != x1 {
                plot(self, x, y);
                err -= dy;
                if err < 0 {
                    y += 1;
                    err += dx;
                }
                x += sx;
            }
        } else {
            let mut err = dy >> 1;
            while y != y1 {
                plot(self, x, y);
                err -= dx;
                if err < 0 {
                    x += sx;
                    err += dy;
                }
                y += 1;
            }
        }
        plot(self, x, y);
    }

    fn draw_text(&mut self, font: &Font<'_>, text: &str, x: i32, y: i32, color: Color) {
        let (p0, p1) = color::decompose(color);
        let shift_up = y & 7;
        let shift_down = 8 - shift_up;
        let w = WIDTH as i32;
        let mut ou = (y >> 3) * w;
        let mut ol = ou + w;
        let mut x = x;

        for ch in text.chars() {
            let code = ch as i32 - 0x20;
            if let Some(glyph) = font.glyph(code) {
                for gx in 0..font.width as i32 {
                    if (0..WIDTH as i32).contains(&x) {
                        let gb = glyph[gx as usize];
                        let gb_upper = ((gb as u16) << shift_up) as u8;
                        let gbl: u8 = if shift_down >= 8 { 0 } else { gb >> (shift_down as u32) };
                        let idx_u = ou + x;
                        if (0..(self.plane0.len() as i32)).contains(&idx_u) {
                            paint_glyph_byte(
                                &mut self.plane0[idx_u as usize],
                                &mut self.plane1[idx_u as usize],
                                gb_upper,
                                p0,
                                p1,
                            );
                        }
                        if shift_down != 8 {
                            let idx_l = ol + x;
                            if (0..(self.plane0.len() as i32)).contains(&idx_l) {
                                paint_glyph_byte(
                                    &mut self.plane0[idx_l as usize],
                                    &mut self.plane1[idx_l as usize],
                                    gbl,
                                    p0,
                                    p1,
                                );
                            }
                        }
                    }
                    ou += 1;
                    ol += 1;
                    x += 1;
                }
            }
            ou += font.space as i32;
            ol += font.space as i32;
            x += font.space as i32;
        }
    }

    fn blit(
        &mut self,
        src0: &[u8],
        src1: &[u8],
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        key: Option<Color>,
        mirror_x: bool,
        mirror_y: bool,
    ) {
        blit_impl(self, src0, src1, x, y, width, height, key, mirror_x, mirror_y, None);
    }

    fn blit_with_mask(
        &mut self,
        src0: &[u8],
        src1: &[u8],
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        mirror_x: bool,
        mirror_y: bool,
        mask: &[u8],
    ) {
        blit_impl(self, src0, src1, x, y, width, height, None, mirror_x, mirror_y, Some(mask));
    }
}

/// A glyph column's bits, pre-shifted into the upper destination byte
/// position, then painted through the current plane's set/clear bitmask
/// so that unset glyph bits clear the destination rather than leaving it.
fn paint_glyph_byte(p0: &mut u8, p1: &mut u8, bits: u8, want0: bool, want1: bool) {
    let set_mask = if want0 { bits } else { 0 };
    let clear_mask = !(if want0 { 0 } else { bits });
    *p0 = (*p0 | set_mask) & clear_mask;
    let set_mask = if want1 { bits } else { 0 };
    let clear_mask = !(if want1 { 0 } else { bits });
    *p1 = (*p1 | set_mask) & clear_mask;
}

#[allow(clippy::too_many_arguments)]
fn blit_impl(
    fb: &mut Framebuffer,
    src0: &[u8],
    src1: &[u8],
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    key: Option<Color>,
    mirror_x: bool,
    mirror_y: bool,
    mask: Option<&[u8]>,
) {
    if x + width < 0 || x >= WIDTH as i32 {
        return;
    }
    if y + height < 0 || y >= HEIGHT as i32 {
        return;
    }

    let stride = width;
    let mut srcx: i32 = 0;
    let mut srcy: i32 = 0;
    let mut dstx = x;
    let mut dsty = y;
    let mut width = width;
    let mut height = height;
    let sdx: i32;

    if mirror_x {
        sdx = -1;
        srcx += width - 1;
        if dstx < 0 {
            srcx += dstx;
            width += dstx;
            dstx = 0;
        }
    } else {
        sdx = 1;
        if dstx < 0 {
            srcx = -dstx;
            width += dstx;
            dstx = 0;
        }
    }
    if dstx + width > WIDTH as i32 {
        width = WIDTH as i32 - dstx;
    }
    if mirror_y {
        srcy = height - 1;
        if dsty < 0 {
            srcy += dsty;
            height += dsty;
            dsty = 0;
        }
    } else if dsty < 0 {
        srcy = -dsty;
        height += dsty;
        dsty = 0;
    }
    if dsty + height > HEIGHT as i32 {
        height = HEIGHT as i32 - dsty;
    }
    if width <= 0 || height <= 0 {
        return;
    }

    let mut srco = (srcy >> 3) * stride + srcx;
    let mut srcm = 1u8 << (srcy & 7);

    let w = WIDTH as i32;
    let mut dsto = (dsty >> 3) * w + dstx;
    let mut dstm = 1u8 << (dsty & 7);

    let mut rows_left = height;
    while rows_left != 0 {
        let mut srcco = srco;
        let mut dstco = dsto;
        let mut i = width;
        while i != 0 {
            let masked_out = mask.is_some_and(|m| m[srcco as usize] & srcm != 0);
            if !masked_out {
                let v = color::compose(src0[srcco as usize] & srcm != 0, src1[srcco as usize] & srcm != 0);
                if mask.is_some() || key != Some(v) {
                    let (p0, p1) = color::decompose(v);
                    set_bit(&mut fb.plane0[dstco as usize], dstm, p0);
                    set_bit(&mut fb.plane1[dstco as usize], dstm, p1);
                }
            }
            srcco += sdx;
            dstco += 1;
            i -= 1;
        }
        dstm <<= 1;
        if dstm == 0 {
            dsto += w;
            dstm = 1;
        }
        if mirror_y {
            srcm >>= 1;
            if srcm == 0 {
                srco -= stride;
                srcm = 0x80;
            }
        } else {
            srcm <<= 1;
            if srcm == 0 {
                srco += stride;
                srcm = 1;
            }
        }
        rows_left -= 1;
    }
}
