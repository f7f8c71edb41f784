//! Core types for the crop engine
//!
//! Rectangles, colors, scan limits and the error type shared by the
//! scanner, ratio matcher and geometry helpers.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================
// Error Types
// ============================================================

/// Crop engine error types
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CropError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No valid content detected; check border color, tolerance or region")]
    NoContentDetected,

    #[error("Ratio fit failed: {0}")]
    RatioFitFailure(String),

    #[error("Pixel buffer too small: expected {expected} bytes, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, CropError>;

// ============================================================
// Rect
// ============================================================

/// Axis-aligned rectangle in pixel coordinates.
///
/// Coordinates are in full-image space unless a function documents
/// otherwise. A rectangle with non-positive width or height is the
/// "no content" sentinel and never reaches rendering or export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    /// Create a new rectangle
    pub const fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole image of the given size
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, i64::from(width), i64::from(height))
    }

    /// True when both dimensions are positive
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Exclusive right edge
    pub fn right(&self) -> i64 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> i64 {
        self.y + self.height
    }

    /// Whether `other` lies entirely inside `self`
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} at ({}, {})",
            self.width, self.height, self.x, self.y
        )
    }
}

// ============================================================
// Color
// ============================================================

/// 8-bit RGB border color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// True when every channel of `rgb` is within `tolerance` of this color
    #[inline]
    pub fn matches(&self, rgb: [u8; 3], tolerance: u32) -> bool {
        u32::from(self.r.abs_diff(rgb[0])) <= tolerance
            && u32::from(self.g.abs_diff(rgb[1])) <= tolerance
            && u32::from(self.b.abs_diff(rgb[2])) <= tolerance
    }

    /// Short name for the two named border colors, hex otherwise
    pub fn label(&self) -> String {
        match *self {
            Color::WHITE => "white".to_string(),
            Color::BLACK => "black".to_string(),
            Color { r, g, b } => format!("#{r:02X}{g:02X}{b:02X}"),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

// ============================================================
// Border Limits
// ============================================================

/// Inclusive content limits found by a border scan, in buffer-local
/// coordinates.
///
/// `right < left` or `bottom < top` means the scanned area was all border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderLimits {
    pub top: i64,
    pub bottom: i64,
    pub left: i64,
    pub right: i64,
}

impl BorderLimits {
    pub const fn new(top: i64, bottom: i64, left: i64, right: i64) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// True when no content remains
    pub fn is_empty(&self) -> bool {
        self.right < self.left || self.bottom < self.top
    }

    /// True when nothing was removed from a `width` x `height` buffer
    pub fn covers_full(&self, width: u32, height: u32) -> bool {
        self.top == 0
            && self.left == 0
            && self.bottom == i64::from(height) - 1
            && self.right == i64::from(width) - 1
    }

    /// Content rectangle in buffer-local coordinates
    pub fn to_local_rect(&self) -> Rect {
        Rect::new(
            self.left,
            self.top,
            self.right - self.left + 1,
            self.bottom - self.top + 1,
        )
    }
}
