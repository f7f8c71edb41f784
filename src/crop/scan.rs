//! Border scanning
//!
//! Finds the tightest box of non-border content by shrinking each edge
//! inward until a row or column contains a pixel that does not match the
//! border color.
//!
//! # Algorithm
//!
//! 1. Scan rows top to bottom for the first non-border row (`top`)
//! 2. Scan rows bottom to top, stopping at `top` (`bottom`)
//! 3. Scan columns left to right, over rows `top..=bottom` only (`left`)
//! 4. Scan columns right to left, stopping at `left` (`right`)
//!
//! Column scans only look at the row range already established by the
//! row scans. Only the R, G and B channels are compared; alpha is ignored.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::pixels::{PixelBuffer, PixelSource};
use super::types::{BorderLimits, Color, CropError, Result};

// ============================================================
// Border Color Mode
// ============================================================

/// Which border color to look for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BorderColor {
    /// Try white first, then black
    #[default]
    Auto,
    /// White borders only
    White,
    /// Black borders only
    Black,
}

impl BorderColor {
    /// The single color scanned in this mode, `None` for auto
    pub fn fixed_color(&self) -> Option<Color> {
        match self {
            BorderColor::Auto => None,
            BorderColor::White => Some(Color::WHITE),
            BorderColor::Black => Some(Color::BLACK),
        }
    }
}

/// Result of a scan in a given [`BorderColor`] mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanOutcome {
    /// Content limits in buffer-local coordinates
    pub limits: BorderLimits,
    /// Color whose scan produced `limits`
    pub color_used: Color,
    /// Whether auto mode fell back from white to black
    pub fell_back: bool,
}

// ============================================================
// Border Scanner
// ============================================================

/// Uniform-color border scanner
pub struct BorderScanner;

impl BorderScanner {
    /// Scan a raw row-major RGBA buffer for borders of `color`
    pub fn scan_buffer(
        data: &[u8],
        width: u32,
        height: u32,
        color: Color,
        tolerance: u32,
    ) -> Result<BorderLimits> {
        let buffer = PixelBuffer::new(data, width, height)?;
        Self::scan_borders(&buffer, color, tolerance)
    }

    /// Compute the content limits of `source` for a single border color
    pub fn scan_borders<S: PixelSource + ?Sized>(
        source: &S,
        color: Color,
        tolerance: u32,
    ) -> Result<BorderLimits> {
        let (width, height) = (source.width(), source.height());
        if width == 0 || height == 0 {
            return Err(CropError::InvalidInput(format!(
                "cannot scan a {width}x{height} buffer"
            )));
        }

        let w = i64::from(width);
        let h = i64::from(height);

        let is_border_row =
            |y: u32| (0..width).all(|x| color.matches(source.rgb_at(x, y), tolerance));

        let top = (0..height)
            .find(|&y| !is_border_row(y))
            .map_or(h, i64::from);

        let bottom = if top >= h {
            top - 1
        } else {
            (top as u32..height)
                .rev()
                .find(|&y| !is_border_row(y))
                .map_or(top - 1, i64::from)
        };

        // Rows outside top..=bottom are not consulted for columns.
        let is_border_col = |x: u32| {
            (top..=bottom).all(|y| color.matches(source.rgb_at(x, y as u32), tolerance))
        };

        let left = (0..width)
            .find(|&x| !is_border_col(x))
            .map_or(w, i64::from);

        let right = if left >= w {
            left - 1
        } else {
            (left as u32..width)
                .rev()
                .find(|&x| !is_border_col(x))
                .map_or(left - 1, i64::from)
        };

        let limits = BorderLimits::new(top, bottom, left, right);
        debug!(
            color = %color,
            tolerance,
            top,
            bottom,
            left,
            right,
            "border scan finished"
        );
        Ok(limits)
    }

    /// Scan according to `mode`.
    ///
    /// In auto mode white is scanned first. If that removes nothing or
    /// leaves no content, black is scanned once and its result is used.
    pub fn scan_with_mode<S: PixelSource + ?Sized>(
        source: &S,
        mode: BorderColor,
        tolerance: u32,
    ) -> Result<ScanOutcome> {
        if let Some(color) = mode.fixed_color() {
            let limits = Self::scan_borders(source, color, tolerance)?;
            return Ok(ScanOutcome {
                limits,
                color_used: color,
                fell_back: false,
            });
        }

        let white = Self::scan_borders(source, Color::WHITE, tolerance)?;
        if !white.is_empty() && !white.covers_full(source.width(), source.height()) {
            return Ok(ScanOutcome {
                limits: white,
                color_used: Color::WHITE,
                fell_back: false,
            });
        }

        info!("no white border removed, trying black");
        let black = Self::scan_borders(source, Color::BLACK, tolerance)?;
        Ok(ScanOutcome {
            limits: black,
            color_used: Color::BLACK,
            fell_back: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::types::Rect;
    use image::{Rgba, RgbaImage};

    const RED: Rgba<u8> = Rgba([200, 30, 40, 255]);

    fn bordered(width: u32, height: u32, n: u32, border: Rgba<u8>) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(width, height, border);
        for y in n..height - n {
            for x in n..width - n {
                img.put_pixel(x, y, RED);
            }
        }
        img
    }

    // TC-SCAN-001: uniform border, white and black
    #[test]
    fn test_uniform_border_limits() {
        for (border, color) in [
            (Rgba([255, 255, 255, 255]), Color::WHITE),
            (Rgba([0, 0, 0, 255]), Color::BLACK),
        ] {
            let img = bordered(40, 30, 4, border);
            let limits = BorderScanner::scan_borders(&img, color, 0).unwrap();
            assert_eq!(limits, BorderLimits::new(4, 30 - 1 - 4, 4, 40 - 1 - 4));
        }
    }

    // TC-SCAN-002: fully border-colored images give the empty sentinel
    #[test]
    fn test_all_border_is_empty() {
        let white = RgbaImage::from_pixel(12, 8, Rgba([255, 255, 255, 255]));
        let limits = BorderScanner::scan_borders(&white, Color::WHITE, 0).unwrap();
        assert!(limits.is_empty());
        assert_eq!(limits, BorderLimits::new(8, 7, 12, 11));
        assert!(!limits.to_local_rect().is_valid());

        let black = RgbaImage::from_pixel(5, 9, Rgba([0, 0, 0, 255]));
        let limits = BorderScanner::scan_borders(&black, Color::BLACK, 0).unwrap();
        assert!(limits.is_empty());
        assert!(!limits.to_local_rect().is_valid());
    }

    #[test]
    fn test_no_border_keeps_everything() {
        let img = RgbaImage::from_pixel(6, 4, RED);
        let limits = BorderScanner::scan_borders(&img, Color::WHITE, 0).unwrap();
        assert!(limits.covers_full(6, 4));
    }

    #[test]
    fn test_asymmetric_border() {
        let mut img = RgbaImage::from_pixel(50, 40, Rgba([255, 255, 255, 255]));
        for y in 3..31 {
            for x in 7..45 {
                img.put_pixel(x, y, RED);
            }
        }
        let limits = BorderScanner::scan_borders(&img, Color::WHITE, 0).unwrap();
        assert_eq!(limits.to_local_rect(), Rect::new(7, 3, 38, 28));
    }

    #[test]
    fn test_single_pixel_content() {
        let mut img = RgbaImage::from_pixel(9, 9, Rgba([255, 255, 255, 255]));
        img.put_pixel(6, 2, RED);
        let limits = BorderScanner::scan_borders(&img, Color::WHITE, 0).unwrap();
        assert_eq!(limits, BorderLimits::new(2, 2, 6, 6));
        assert_eq!(limits.to_local_rect(), Rect::new(6, 2, 1, 1));
    }

    #[test]
    fn test_alpha_is_ignored() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 0]));
        img.put_pixel(5, 5, Rgba([0, 0, 0, 0]));
        let limits = BorderScanner::scan_borders(&img, Color::WHITE, 0).unwrap();
        assert_eq!(limits, BorderLimits::new(5, 5, 5, 5));
    }

    // TC-SCAN-003: larger tolerance never grows the content box
    #[test]
    fn test_tolerance_monotonicity() {
        let mut img = RgbaImage::from_pixel(60, 60, Rgba([255, 255, 255, 255]));
        // Rings of progressively darker off-white around dark content.
        for ring in 0..10u32 {
            let shade = 255 - (ring as u8) * 6;
            for y in ring..60 - ring {
                for x in ring..60 - ring {
                    img.put_pixel(x, y, Rgba([shade, shade, shade, 255]));
                }
            }
        }
        for y in 20..40 {
            for x in 20..40 {
                img.put_pixel(x, y, RED);
            }
        }

        let mut previous: Option<Rect> = None;
        for tolerance in [0u32, 3, 6, 12, 24, 48, 54, 100] {
            let rect = BorderScanner::scan_borders(&img, Color::WHITE, tolerance)
                .unwrap()
                .to_local_rect();
            if let Some(prev) = previous {
                assert!(prev.contains(&rect), "tolerance {tolerance}: {rect} not in {prev}");
            }
            previous = Some(rect);
        }
        assert_eq!(previous, Some(Rect::new(20, 20, 20, 20)));
    }

    #[test]
    fn test_scan_buffer_matches_image_scan() {
        let img = bordered(20, 16, 2, Rgba([0, 0, 0, 255]));
        let from_buffer =
            BorderScanner::scan_buffer(img.as_raw(), 20, 16, Color::BLACK, 0).unwrap();
        let from_image = BorderScanner::scan_borders(&img, Color::BLACK, 0).unwrap();
        assert_eq!(from_buffer, from_image);
    }

    #[test]
    fn test_scan_buffer_rejects_bad_dimensions() {
        let data = vec![0u8; 16];
        assert!(matches!(
            BorderScanner::scan_buffer(&data, 0, 4, Color::WHITE, 0),
            Err(CropError::InvalidInput(_))
        ));
        assert!(matches!(
            BorderScanner::scan_buffer(&data, 4, 4, Color::WHITE, 0),
            Err(CropError::BufferTooSmall { .. })
        ));
    }

    // TC-SCAN-004: auto mode falls back to black exactly once
    #[test]
    fn test_auto_mode_falls_back_to_black() {
        let img = bordered(30, 30, 5, Rgba([0, 0, 0, 255]));
        let outcome = BorderScanner::scan_with_mode(&img, BorderColor::Auto, 0).unwrap();
        assert!(outcome.fell_back);
        assert_eq!(outcome.color_used, Color::BLACK);
        assert_eq!(outcome.limits, BorderLimits::new(5, 24, 5, 24));
    }

    #[test]
    fn test_auto_mode_prefers_white() {
        let img = bordered(30, 30, 3, Rgba([255, 255, 255, 255]));
        let outcome = BorderScanner::scan_with_mode(&img, BorderColor::Auto, 0).unwrap();
        assert!(!outcome.fell_back);
        assert_eq!(outcome.color_used, Color::WHITE);
        assert_eq!(outcome.limits, BorderLimits::new(3, 26, 3, 26));
    }

    #[test]
    fn test_auto_mode_all_white_falls_back() {
        let img = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        let outcome = BorderScanner::scan_with_mode(&img, BorderColor::Auto, 0).unwrap();
        assert!(outcome.fell_back);
        // A white image has no black border either.
        assert!(outcome.limits.covers_full(10, 10));
    }

    #[test]
    fn test_fixed_mode_does_not_fall_back() {
        let img = bordered(30, 30, 5, Rgba([0, 0, 0, 255]));
        let outcome = BorderScanner::scan_with_mode(&img, BorderColor::White, 0).unwrap();
        assert!(!outcome.fell_back);
        assert!(outcome.limits.covers_full(30, 30));
    }

    #[test]
    fn test_border_color_modes() {
        assert_eq!(BorderColor::default(), BorderColor::Auto);
        assert_eq!(BorderColor::Auto.fixed_color(), None);
        assert_eq!(BorderColor::White.fixed_color(), Some(Color::WHITE));
        assert_eq!(BorderColor::Black.fixed_color(), Some(Color::BLACK));
    }
}
