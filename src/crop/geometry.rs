//! Crop geometry
//!
//! Turns scan limits and ratio suggestions into final crop rectangles in
//! full-image coordinates.

use tracing::debug;

use super::types::{BorderLimits, CropError, Rect, Result};

/// Crop rectangle derivation
pub struct CropGeometry;

impl CropGeometry {
    /// Largest box of `ratio_value` (width / height) centered in `source`.
    ///
    /// Each output field is rounded independently, then the box is clamped
    /// back inside `source`. Fails with `RatioFitFailure` for degenerate
    /// input or output.
    pub fn fit_ratio(source: Rect, ratio_value: f64) -> Result<Rect> {
        if !source.is_valid() {
            return Err(CropError::RatioFitFailure(format!(
                "source rectangle {source} has no area"
            )));
        }
        if !ratio_value.is_finite() || ratio_value <= 0.0 {
            return Err(CropError::RatioFitFailure(format!(
                "ratio {ratio_value} is not a positive number"
            )));
        }

        let source_w = source.width as f64;
        let source_h = source.height as f64;

        let mut width = source_w;
        let mut height = width / ratio_value;
        if height > source_h {
            height = source_h;
            width = height * ratio_value;
        }

        let x = source.x as f64 + (source_w - width) / 2.0;
        let y = source.y as f64 + (source_h - height) / 2.0;

        let rounded = Rect::new(
            x.round() as i64,
            y.round() as i64,
            width.round() as i64,
            height.round() as i64,
        );
        let fitted = Self::clamp_within(rounded, source);
        debug!(%source, ratio_value, %fitted, "fitted ratio");

        if fitted.is_valid() {
            Ok(fitted)
        } else {
            Err(CropError::RatioFitFailure(format!(
                "ratio {ratio_value:.4} leaves no area inside {source}"
            )))
        }
    }

    /// Clamp a user-selected region to the image bounds.
    ///
    /// Fails with `InvalidInput` when nothing of the region remains.
    pub fn clamp_region(region: Rect, image_width: u32, image_height: u32) -> Result<Rect> {
        if image_width == 0 || image_height == 0 {
            return Err(CropError::InvalidInput(format!(
                "image dimensions must be positive, got {image_width}x{image_height}"
            )));
        }

        let x = region.x.max(0);
        let y = region.y.max(0);
        let width = region.width.min(i64::from(image_width) - x);
        let height = region.height.min(i64::from(image_height) - y);

        if width <= 0 || height <= 0 {
            return Err(CropError::InvalidInput(format!(
                "region {region} is empty or outside the {image_width}x{image_height} image"
            )));
        }

        Ok(Rect::new(x, y, width, height))
    }

    /// Content rectangle for limits found inside `origin`, in full-image
    /// coordinates
    pub fn translate(limits: BorderLimits, origin: Rect) -> Rect {
        let local = limits.to_local_rect();
        Rect::new(
            local.x + origin.x,
            local.y + origin.y,
            local.width,
            local.height,
        )
    }

    /// Reject rectangles without area.
    ///
    /// Every rectangle handed to rendering or export passes through here.
    pub fn validate(rect: Rect) -> Result<Rect> {
        if rect.is_valid() {
            Ok(rect)
        } else {
            Err(CropError::NoContentDetected)
        }
    }

    fn clamp_within(rect: Rect, bounds: Rect) -> Rect {
        let x = rect.x.max(bounds.x);
        let y = rect.y.max(bounds.y);
        let right = rect.right().min(bounds.right());
        let bottom = rect.bottom().min(bounds.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }
}
