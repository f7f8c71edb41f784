//! Border detection & crop geometry
//!
//! Detects uniform white or black borders around the content of an image
//! and derives crop rectangles from them.
//!
//! # Features
//!
//! - Four-edge border scan with per-channel tolerance
//! - Automatic white-then-black color selection
//! - Closest common aspect ratio suggestion (5% tolerance)
//! - Strict-ratio crops centered in the detected content
//! - Sub-region detection translated back to image coordinates
//!
//! # Example
//!
//! ```rust
//! use border_crop::{BorderColor, BorderScanner, CropGeometry, Rect, RatioMatcher};
//! use image::{Rgba, RgbaImage};
//!
//! let mut img = RgbaImage::from_pixel(200, 120, Rgba([255, 255, 255, 255]));
//! for y in 10..100 {
//!     for x in 20..180 {
//!         img.put_pixel(x, y, Rgba([40, 40, 40, 255]));
//!     }
//! }
//!
//! let outcome = BorderScanner::scan_with_mode(&img, BorderColor::Auto, 10).unwrap();
//! let detected = CropGeometry::translate(outcome.limits, Rect::full(200, 120));
//! assert_eq!(detected, Rect::new(20, 10, 160, 90));
//!
//! let ratio = RatioMatcher::closest_ratio(detected.width, detected.height).unwrap();
//! assert_eq!(ratio.name, "16:9");
//! ```

// Submodules
mod geometry;
mod pixels;
mod ratio;
mod scan;
mod types;

// Re-export public API
pub use geometry::CropGeometry;
pub use pixels::{PixelBuffer, PixelSource, SubView};
pub use ratio::{AspectRatioSpec, Orientation, RatioMatcher, ASPECT_RATIO_TOLERANCE, COMMON_RATIOS};
pub use scan::{BorderColor, BorderScanner, ScanOutcome};
pub use types::{BorderLimits, Color, CropError, Rect, Result};

// ============================================================
// Constants
// ============================================================

/// Default per-channel tolerance
pub const DEFAULT_TOLERANCE: u32 = 10;

/// Tolerance at which every pixel matches any border color
pub const MAX_EFFECTIVE_TOLERANCE: u32 = 255;

// ============================================================
// Options
// ============================================================

/// Border detection options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectOptions {
    /// Border color mode
    pub border_color: BorderColor,
    /// Per-channel tolerance (0 = exact match)
    pub tolerance: u32,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            border_color: BorderColor::Auto,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl DetectOptions {
    /// Create a new options builder
    pub fn builder() -> DetectOptionsBuilder {
        DetectOptionsBuilder::default()
    }

    /// Exact-match options for a single color
    pub fn exact(border_color: BorderColor) -> Self {
        Self {
            border_color,
            tolerance: 0,
        }
    }
}

/// Builder for DetectOptions
#[derive(Debug, Default)]
pub struct DetectOptionsBuilder {
    options: DetectOptions,
}

impl DetectOptionsBuilder {
    /// Set border color mode
    #[must_use]
    pub fn border_color(mut self, color: BorderColor) -> Self {
        self.options.border_color = color;
        self
    }

    /// Set tolerance; values above 255 behave like 255
    #[must_use]
    pub fn tolerance(mut self, tolerance: u32) -> Self {
        self.options.tolerance = tolerance.min(MAX_EFFECTIVE_TOLERANCE);
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> DetectOptions {
        self.options
    }
}
