//! The four apparent brightness levels and their bit decomposition.

/// A 2-bit apparent gray level. `bit0` selects `plane0`, `bit1` selects
/// `plane1`; the compositor (`crate::compositor`) is what turns this pairing
/// into the duty-cycle math that makes `DARKGRAY`/`LIGHTGRAY` distinguishable
/// on hardware that only has one bit of native contrast.
pub type Color = u8;

/// Both planes clear.
pub const BLACK: Color = 0;
/// `plane0` only.
pub const DARKGRAY: Color = 1;
/// `plane1` only.
pub const LIGHTGRAY: Color = 2;
/// Both planes set.
pub const WHITE: Color = 3;

/// Split a color into its `(plane0_bit, plane1_bit)` pair.
#[inline]
pub const fn decompose(color: Color) -> (bool, bool) {
    (color & 1 != 0, color & 2 != 0)
}

/// Recombine a `(plane0_bit, plane1_bit)` pair into a color.
#[inline]
pub const fn compose(plane0_bit: bool, plane1_bit: bool) -> Color {
    (plane0_bit as u8) | ((plane1_bit as u8) << 1)
}
