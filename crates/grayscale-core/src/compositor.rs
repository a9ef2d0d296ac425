//! Temporal dithering: turning a 2-bit framebuffer into three 1-bit
//! sub-frames the panel streams in succession within one apparent frame.
//!
//! The eye integrates the three sub-frames into four apparent brightness
//! levels: `BLACK` dark in all three, `WHITE` lit in all three, and
//! `DARKGRAY`/`LIGHTGRAY` lit in one out of three (at different phases,
//! which is irrelevant to a persistence-of-vision viewer but keeps the
//! average duty cycle identical for both).

use crate::constants::PLANE_BYTES;
use crate::framebuffer::Framebuffer;

/// Which of the three temporal sub-frames to compose next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subframe {
    First,
    Second,
    Third,
}

impl Subframe {
    /// The subframe that follows this one, cycling `First -> Second -> Third -> First`.
    pub fn next(self) -> Self {
        match self {
            Subframe::First => Subframe::Second,
            Subframe::Second => Subframe::Third,
            Subframe::Third => Subframe::First,
        }
    }
}

/// Compose one subframe's 1-bit bitstream into `out` from the framebuffer's
/// two planes. `out.len()` must equal `PLANE_BYTES`.
///
/// Fixed remap, byte-for-byte: subframe 0 is `p0 | p1` (lit for `DARKGRAY`,
/// `LIGHTGRAY`, and `WHITE`), subframe 1 is `p1` (lit for `LIGHTGRAY` and
/// `WHITE`), subframe 2 is `p0 & !p1` (lit for `DARKGRAY` only).
pub fn compose(fb: &Framebuffer, subframe: Subframe, out: &mut [u8]) {
    debug_assert_eq!(out.len(), PLANE_BYTES);
    let p0 = fb.plane0();
    let p1 = fb.plane1();
    match subframe {
        Subframe::First => {
            for i in 0..PLANE_BYTES {
                out[i] = p0[i] | p1[i];
            }
        }
        Subframe::Second => {
            out.copy_from_slice(p1);
        }
        Subframe::Third => {
            for i in 0..PLANE_BYTES {
                out[i] = p0[i] & !p1[i];
            }
        }
    }
}
