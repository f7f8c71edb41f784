//! Read-only pixel access
//!
//! The scanner only needs RGB samples at integer coordinates, so it works
//! against the [`PixelSource`] trait rather than a concrete image type.
//! Pixel data is always borrowed; nothing here mutates or copies it.

use image::RgbaImage;

use super::types::{CropError, Rect, Result};

/// Bytes per RGBA sample
const RGBA_CHANNELS: usize = 4;

/// Read-only access to RGB samples of a width x height image.
///
/// Implementations may assume `x < width()` and `y < height()`.
pub trait PixelSource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn rgb_at(&self, x: u32, y: u32) -> [u8; 3];
}

impl<T: PixelSource + ?Sized> PixelSource for &T {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    #[inline]
    fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        (**self).rgb_at(x, y)
    }
}

impl PixelSource for RgbaImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    #[inline]
    fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        let p = self.get_pixel(x, y).0;
        [p[0], p[1], p[2]]
    }
}

// ============================================================
// PixelBuffer
// ============================================================

/// Borrowed, row-major RGBA byte buffer
#[derive(Debug, Clone, Copy)]
pub struct PixelBuffer<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> PixelBuffer<'a> {
    /// Wrap `data` as a `width` x `height` RGBA buffer.
    ///
    /// Fails with `InvalidInput` for zero dimensions and `BufferTooSmall`
    /// when `data` holds fewer than `width * height * 4` bytes.
    pub fn new(data: &'a [u8], width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(CropError::InvalidInput(format!(
                "image dimensions must be positive, got {width}x{height}"
            )));
        }

        let expected = width as usize * height as usize * RGBA_CHANNELS;
        if data.len() < expected {
            return Err(CropError::BufferTooSmall {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            data,
            width,
            height,
        })
    }
}

impl PixelSource for PixelBuffer<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * RGBA_CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

// ============================================================
// SubView
// ============================================================

/// Window onto a rectangular region of another source.
///
/// Coordinates passed to [`PixelSource::rgb_at`] are local to the window.
#[derive(Debug, Clone, Copy)]
pub struct SubView<'a, S: PixelSource + ?Sized> {
    source: &'a S,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl<'a, S: PixelSource + ?Sized> SubView<'a, S> {
    /// Create a view over `region`, which must be valid and lie inside `source`
    pub fn new(source: &'a S, region: Rect) -> Result<Self> {
        let bounds = Rect::full(source.width(), source.height());
        if !region.is_valid() || !bounds.contains(&region) {
            return Err(CropError::InvalidInput(format!(
                "region {region} is outside the {}x{} image",
                source.width(),
                source.height()
            )));
        }

        // Bounds check above keeps every field inside u32 range.
        Ok(Self {
            source,
            x: region.x as u32,
            y: region.y as u32,
            width: region.width as u32,
            height: region.height as u32,
        })
    }

    /// Offset of the window within its source
    pub fn origin(&self) -> (u32, u32) {
        (self.x, self.y)
    }
}

impl<S: PixelSource + ?Sized> PixelSource for SubView<'_, S> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        self.source.rgb_at(self.x + x, self.y + y)
    }
}
