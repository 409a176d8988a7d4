//! RGB888 to RGB565 conversion.

use embedded_graphics_core::pixelcolor::{Rgb565, Rgb888, raw::RawU16};
use embedded_graphics_core::prelude::RgbColor;

/// Packs an 8-bit-per-channel color into the panel's 16-bit RRRRR-GGGGGG-BBBBB layout.
///
/// Each channel is first widened to 16 bits (`v << 8 | v`) and then
/// truncated, so the result matches the top bits of every channel.
/// Alpha is not an argument: the panel has no per-pixel alpha.
pub fn rgba_to_565(r: u8, g: u8, b: u8) -> u16 {
    let widen = |v: u8| (v as u16) << 8 | v as u16;
    let (r16, g16, b16) = (widen(r), widen(g), widen(b));

    (r16 & 0xF800) | ((g16 & 0xFC00) >> 5) | ((b16 & 0xF800) >> 11)
}

/// Same conversion as [`rgba_to_565`], as an `embedded-graphics` color.
pub fn to_rgb565(color: Rgb888) -> Rgb565 {
    Rgb565::from(RawU16::new(rgba_to_565(color.r(), color.g(), color.b())))
}

/// Wire bytes for one pixel: RGB565, high byte first.
pub(crate) fn pixel_bytes(color: Rgb888) -> [u8; 2] {
    rgba_to_565(color.r(), color.g(), color.b()).to_be_bytes()
}
