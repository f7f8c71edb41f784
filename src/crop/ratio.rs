//! Aspect ratio matching
//!
//! Matches a content box against a small catalog of common aspect ratios.

use serde::Serialize;
use std::fmt;

/// Maximum relative difference for a catalog ratio to be suggested
pub const ASPECT_RATIO_TOLERANCE: f64 = 0.05;

/// Orientation of a catalog ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
    Square,
}

impl Orientation {
    pub fn name(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Square => "square",
        }
    }
}

/// A named aspect ratio from [`COMMON_RATIOS`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AspectRatioSpec {
    pub name: &'static str,
    pub ratio_value: f64,
    pub orientation: Orientation,
}

impl fmt::Display for AspectRatioSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.orientation.name())
    }
}

const fn spec(name: &'static str, ratio_value: f64, orientation: Orientation) -> AspectRatioSpec {
    AspectRatioSpec {
        name,
        ratio_value,
        orientation,
    }
}

/// Catalog of suggested ratios, in match priority order
pub const COMMON_RATIOS: [AspectRatioSpec; 7] = [
    spec("16:9", 16.0 / 9.0, Orientation::Landscape),
    spec("9:16", 9.0 / 16.0, Orientation::Portrait),
    spec("4:3", 4.0 / 3.0, Orientation::Landscape),
    spec("3:4", 3.0 / 4.0, Orientation::Portrait),
    spec("1:1", 1.0, Orientation::Square),
    spec("3:2", 3.0 / 2.0, Orientation::Landscape),
    spec("2:3", 2.0 / 3.0, Orientation::Portrait),
];

/// Closest-ratio lookup over [`COMMON_RATIOS`]
pub struct RatioMatcher;

impl RatioMatcher {
    /// Closest catalog ratio to `width / height`, if any is within tolerance.
    ///
    /// Returns `None` for non-positive dimensions.
    pub fn closest_ratio(width: i64, height: i64) -> Option<AspectRatioSpec> {
        if width <= 0 || height <= 0 {
            return None;
        }
        Self::closest_to(width as f64 / height as f64)
    }

    /// Closest catalog ratio to an observed ratio value.
    ///
    /// Ties keep the earlier catalog entry.
    pub fn closest_to(observed: f64) -> Option<AspectRatioSpec> {
        if !observed.is_finite() || observed <= 0.0 {
            return None;
        }

        let mut best: Option<AspectRatioSpec> = None;
        let mut min_difference = f64::INFINITY;

        for candidate in &COMMON_RATIOS {
            let difference = (observed - candidate.ratio_value).abs();
            if difference / candidate.ratio_value < ASPECT_RATIO_TOLERANCE
                && difference < min_difference
            {
                min_difference = difference;
                best = Some(*candidate);
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_sixteen_nine() {
        let spec = RatioMatcher::closest_ratio(16, 9).unwrap();
        assert_eq!(spec.name, "16:9");
        assert_eq!(spec.orientation, Orientation::Landscape);

        let spec = RatioMatcher::closest_ratio(1920, 1080).unwrap();
        assert_eq!(spec.name, "16:9");
    }

    #[test]
    fn test_square() {
        assert_eq!(RatioMatcher::closest_ratio(100, 100).unwrap().name, "1:1");
    }

    #[test]
    fn test_near_four_three() {
        assert_eq!(RatioMatcher::closest_to(1.35).unwrap().name, "4:3");
        assert_eq!(RatioMatcher::closest_ratio(135, 100).unwrap().name, "4:3");
    }

    #[test]
    fn test_far_from_catalog() {
        assert!(RatioMatcher::closest_to(2.5).is_none());
        assert!(RatioMatcher::closest_ratio(5, 2).is_none());
    }

    #[test]
    fn test_portrait_ratios() {
        assert_eq!(RatioMatcher::closest_ratio(9, 16).unwrap().name, "9:16");
        assert_eq!(RatioMatcher::closest_ratio(300, 400).unwrap().name, "3:4");
        assert_eq!(RatioMatcher::closest_ratio(200, 300).unwrap().name, "2:3");
    }

    #[test]
    fn test_tolerance_is_strict() {
        // Exactly 5% above 1:1 does not qualify; just below does.
        assert!(RatioMatcher::closest_to(1.05).is_none());
        assert_eq!(RatioMatcher::closest_to(1.049).unwrap().name, "1:1");
    }

    #[test]
    fn test_gap_between_neighbours() {
        // 1.45 is within 5% of 3:2 (3.3%) but not of 4:3 (8.75%).
        assert_eq!(RatioMatcher::closest_to(1.45).unwrap().name, "3:2");
        assert_eq!(RatioMatcher::closest_to(1.39).unwrap().name, "4:3");
        // 1.42 falls between the 4:3 and 3:2 windows.
        assert!(RatioMatcher::closest_to(1.42).is_none());
    }

    #[test]
    fn test_non_positive_dimensions() {
        assert!(RatioMatcher::closest_ratio(0, 10).is_none());
        assert!(RatioMatcher::closest_ratio(10, -1).is_none());
        assert!(RatioMatcher::closest_to(f64::NAN).is_none());
    }

    #[test]
    fn test_catalog_order() {
        let names: Vec<_> = COMMON_RATIOS.iter().map(|r| r.name).collect();
        assert_eq!(names, ["16:9", "9:16", "4:3", "3:4", "1:1", "3:2", "2:3"]);
        assert_eq!(COMMON_RATIOS[5].ratio_value, 1.5);
    }

    #[test]
    fn test_display() {
        assert_eq!(COMMON_RATIOS[1].to_string(), "9:16 (portrait)");
    }
}
