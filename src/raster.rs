//! Decoded RGBA pixel sources accepted by [`St7789::draw_image`](crate::St7789::draw_image).

use core::fmt;

/// A decoded image that can be sampled pixel by pixel.
pub trait RgbaRaster {
    /// Width and height in pixels.
    fn dimensions(&self) -> (u16, u16);

    /// RGBA at `(x, y)`; callers stay within [`dimensions`](Self::dimensions).
    fn rgba(&self, x: u16, y: u16) -> [u8; 4];
}

impl<T: RgbaRaster + ?Sized> RgbaRaster for &T {
    fn dimensions(&self) -> (u16, u16) {
        T::dimensions(self)
    }

    fn rgba(&self, x: u16, y: u16) -> [u8; 4] {
        T::rgba(self, x, y)
    }
}

#[derive(Debug)]
pub enum ImageError {
    /// Pixel buffer length is not `width * height * 4`
    Truncated { expected: usize, actual: usize },
    /// BMP header or pixel data could not be parsed
    #[cfg(feature = "bmp")]
    Bmp(tinybmp::ParseError),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::Truncated { expected, actual } => {
                write!(f, "RGBA buffer is {actual} bytes, expected {expected}")
            }
            #[cfg(feature = "bmp")]
            ImageError::Bmp(e) => write!(f, "BMP decode failed: {e:?}"),
        }
    }
}

/// Row-major, tightly packed RGBA8888 pixels.
#[derive(Debug, Clone, Copy)]
pub struct RgbaImage<'a> {
    width: u16,
    height: u16,
    data: &'a [u8],
}

impl<'a> RgbaImage<'a> {
    pub fn new(width: u16, height: u16, data: &'a [u8]) -> Result<Self, ImageError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(ImageError::Truncated {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }
}

impl RgbaRaster for RgbaImage<'_> {
    fn dimensions(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn rgba(&self, x: u16, y: u16) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}

#[cfg(feature = "bmp")]
mod bmp {
    use super::{ImageError, RgbaRaster};
    use embedded_graphics_core::geometry::{OriginDimensions, Point};
    use embedded_graphics_core::pixelcolor::Rgb888;
    use embedded_graphics_core::prelude::RgbColor;
    use tinybmp::Bmp;

    /// Parses a BMP file held in memory. Any bit depth `tinybmp` supports is
    /// converted to RGB888 on access.
    pub fn decode_bmp(data: &[u8]) -> Result<Bmp<'_, Rgb888>, ImageError> {
        Bmp::from_slice(data).map_err(ImageError::Bmp)
    }

    impl RgbaRaster for Bmp<'_, Rgb888> {
        // Oversized files saturate so they can never match a panel size.
        fn dimensions(&self) -> (u16, u16) {
            let size = self.size();
            (
                u16::try_from(size.width).unwrap_or(u16::MAX),
                u16::try_from(size.height).unwrap_or(u16::MAX),
            )
        }

        fn rgba(&self, x: u16, y: u16) -> [u8; 4] {
            self.pixel(Point::new(x as i32, y as i32))
                .map(|c| [c.r(), c.g(), c.b(), 0xFF])
                .unwrap_or([0, 0, 0, 0xFF])
        }
    }
}

#[cfg(feature = "bmp")]
pub use bmp::decode_bmp;

/// Uncompressed 24-bit bottom-up BMP with `rgb(x, y)` at each pixel.
#[cfg(all(test, feature = "bmp"))]
pub(crate) fn bmp24(
    width: u32,
    height: u32,
    rgb: impl Fn(u32, u32) -> [u8; 3],
) -> std::vec::Vec<u8> {
    let stride = (width * 3).next_multiple_of(4);
    let image_size = stride * height;

    let mut out = std::vec::Vec::with_capacity(54 + image_size as usize);
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(54 + image_size).to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&54u32.to_le_bytes());
    // BITMAPINFOHEADER
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&(width as i32).to_le_bytes());
    out.extend_from_slice(&(height as i32).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&24u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&image_size.to_le_bytes());
    out.extend_from_slice(&[0; 16]);

    for y in (0..height).rev() {
        let row_end = out.len() + stride as usize;
        for x in 0..width {
            let [r, g, b] = rgb(x, y);
            out.extend_from_slice(&[b, g, r]);
        }
        out.resize(row_end, 0);
    }
    out
}
