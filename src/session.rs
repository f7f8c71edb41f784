//! Crop session state machine
//!
//! [`CropController`] owns the single [`CropSession`] for the loaded image
//! and drives it through detection, ratio suggestion and the final crop.
//!
//! ```text
//! Idle --load--> Ready --select_region--> RegionSelected
//!                  |                           |
//!                  +---------- detect ---------+
//!                              |
//!                          Detecting
//!                     /                 \
//!          ratio matched              no match
//!                |                       |
//!        SuggestionPending ---accept/reject---> Cropped
//! ```
//!
//! Every operation either commits a complete new session value or leaves
//! the previous one untouched.

use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::crop::{
    AspectRatioSpec, BorderScanner, Color, CropError, CropGeometry, DetectOptions, PixelSource,
    RatioMatcher, Rect, Result, SubView,
};

// ============================================================
// Session
// ============================================================

/// Controller states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No image loaded
    #[default]
    Idle,
    /// Image loaded, nothing detected yet
    Ready,
    /// A sub-region restricts detection
    RegionSelected,
    /// Border scan in progress
    Detecting,
    /// A ratio suggestion awaits accept or reject
    SuggestionPending,
    /// A final crop rectangle is available
    Cropped,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Ready => "Ready",
            SessionState::RegionSelected => "RegionSelected",
            SessionState::Detecting => "Detecting",
            SessionState::SuggestionPending => "SuggestionPending",
            SessionState::Cropped => "Cropped",
        }
    }
}

/// Data carried between the steps of one crop cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CropSession {
    state: SessionState,
    image_size: Option<(u32, u32)>,
    region: Option<Rect>,
    detected: Option<Rect>,
    color_used: Option<Color>,
    suggestion: Option<AspectRatioSpec>,
    applied_ratio: Option<AspectRatioSpec>,
    final_rect: Option<Rect>,
}

impl CropSession {
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Loaded image dimensions
    pub fn image_size(&self) -> Option<(u32, u32)> {
        self.image_size
    }

    /// Active sub-region, already clamped to the image
    pub fn region(&self) -> Option<Rect> {
        self.region
    }

    /// Last detected content rectangle (full-image coordinates)
    pub fn detected(&self) -> Option<Rect> {
        self.detected
    }

    /// Border color that produced the last detection
    pub fn color_used(&self) -> Option<Color> {
        self.color_used
    }

    /// Last ratio suggestion
    pub fn suggestion(&self) -> Option<AspectRatioSpec> {
        self.suggestion
    }

    /// Ratio used for the final crop, if a suggestion was accepted and fit
    pub fn applied_ratio(&self) -> Option<AspectRatioSpec> {
        self.applied_ratio
    }

    /// Final crop rectangle
    pub fn final_rect(&self) -> Option<Rect> {
        self.final_rect
    }

    /// State detection returns to when a cycle ends without a crop
    fn base_state(&self) -> SessionState {
        if self.region.is_some() {
            SessionState::RegionSelected
        } else {
            SessionState::Ready
        }
    }

    /// Drop everything produced by a previous detection cycle
    fn discard_cycle(&mut self) {
        self.detected = None;
        self.color_used = None;
        self.suggestion = None;
        self.applied_ratio = None;
        self.final_rect = None;
    }
}

/// Result of a detection step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectionOutcome {
    /// A common ratio is close; accept or reject it to finish the crop
    Suggested {
        detected: Rect,
        suggestion: AspectRatioSpec,
    },
    /// No ratio matched; the detected content was applied directly
    Cropped(Rect),
}

impl DetectionOutcome {
    /// Detected content rectangle
    pub fn detected(&self) -> Rect {
        match self {
            DetectionOutcome::Suggested { detected, .. } => *detected,
            DetectionOutcome::Cropped(rect) => *rect,
        }
    }
}

/// Serializable summary of a session, for reporting
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub input: Option<PathBuf>,
    pub state: SessionState,
    pub image_size: Option<(u32, u32)>,
    pub region: Option<Rect>,
    pub color_used: Option<String>,
    pub detected: Option<Rect>,
    pub suggestion: Option<AspectRatioSpec>,
    pub applied_ratio: Option<AspectRatioSpec>,
    pub final_rect: Option<Rect>,
}

// ============================================================
// Controller
// ============================================================

/// Sequences detection, suggestion and cropping for one image at a time
#[derive(Debug, Default)]
pub struct CropController {
    session: CropSession,
}

impl CropController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session
    pub fn session(&self) -> &CropSession {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state
    }

    /// Start a new session for a `width` x `height` image
    pub fn load_image(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(CropError::InvalidInput(format!(
                "image dimensions must be positive, got {width}x{height}"
            )));
        }

        self.session = CropSession {
            state: SessionState::Ready,
            image_size: Some((width, height)),
            ..Default::default()
        };
        info!(width, height, "image loaded");
        Ok(())
    }

    /// Discard the session entirely
    pub fn reset(&mut self) {
        self.session = CropSession::default();
        debug!("session reset");
    }

    /// Restrict detection to `region` (image coordinates).
    ///
    /// The region is clamped to the image; the clamped value is returned.
    pub fn select_region(&mut self, region: Rect) -> Result<Rect> {
        let (width, height) = self.require_image()?;
        let clamped = CropGeometry::clamp_region(region, width, height)?;

        self.session.discard_cycle();
        self.session.region = Some(clamped);
        self.session.state = SessionState::RegionSelected;
        info!(%region, %clamped, "region selected");
        Ok(clamped)
    }

    /// Remove any sub-region restriction
    pub fn clear_region(&mut self) -> Result<()> {
        self.require_image()?;
        self.session.discard_cycle();
        self.session.region = None;
        self.session.state = SessionState::Ready;
        Ok(())
    }

    /// Scan `source` for borders and either suggest a ratio or crop.
    ///
    /// `source` must be the loaded image. On `NoContentDetected` the session
    /// returns to `Ready` (or `RegionSelected`); on any other failure it is
    /// left as it was.
    pub fn detect<S: PixelSource + ?Sized>(
        &mut self,
        source: &S,
        options: &DetectOptions,
    ) -> Result<DetectionOutcome> {
        let (width, height) = self.require_image()?;
        if (source.width(), source.height()) != (width, height) {
            return Err(CropError::InvalidInput(format!(
                "pixel source is {}x{}, session image is {width}x{height}",
                source.width(),
                source.height()
            )));
        }

        let committed = self.session.clone();
        self.session.discard_cycle();
        self.session.state = SessionState::Detecting;

        let origin = self
            .session
            .region
            .unwrap_or_else(|| Rect::full(width, height));

        let scanned = SubView::new(source, origin).and_then(|view| {
            BorderScanner::scan_with_mode(&view, options.border_color, options.tolerance)
        });
        let outcome = match scanned {
            Ok(outcome) => outcome,
            Err(e) => {
                self.session = committed;
                return Err(e);
            }
        };

        self.session.color_used = Some(outcome.color_used);
        let detected = match CropGeometry::validate(CropGeometry::translate(outcome.limits, origin))
        {
            Ok(rect) => rect,
            Err(e) => {
                self.session.state = self.session.base_state();
                info!(color = %outcome.color_used, "no content detected");
                return Err(e);
            }
        };

        self.session.detected = Some(detected);
        info!(
            %detected,
            color = %outcome.color_used,
            fell_back = outcome.fell_back,
            "content detected"
        );

        match RatioMatcher::closest_ratio(detected.width, detected.height) {
            Some(suggestion) => {
                self.session.suggestion = Some(suggestion);
                self.session.state = SessionState::SuggestionPending;
                info!(ratio = suggestion.name, "aspect ratio suggested");
                Ok(DetectionOutcome::Suggested {
                    detected,
                    suggestion,
                })
            }
            None => {
                let rect = self.apply(detected)?;
                Ok(DetectionOutcome::Cropped(rect))
            }
        }
    }

    /// Crop to the suggested ratio.
    ///
    /// If the strict crop is degenerate the detected content is used
    /// instead.
    pub fn accept_suggestion(&mut self) -> Result<Rect> {
        let (detected, suggestion) = self.require_suggestion()?;
        let rect = match Self::strict_crop(detected, &suggestion) {
            Some(rect) => {
                self.session.applied_ratio = Some(suggestion);
                rect
            }
            None => detected,
        };
        self.apply(rect)
    }

    /// Crop to the detected content, ignoring the suggestion
    pub fn reject_suggestion(&mut self) -> Result<Rect> {
        let (detected, suggestion) = self.require_suggestion()?;
        debug!(ratio = suggestion.name, "suggestion rejected");
        self.apply(detected)
    }

    /// Run a full cycle, asking `decide` whether to take a suggestion
    pub fn run_cycle<S, F>(
        &mut self,
        source: &S,
        options: &DetectOptions,
        decide: F,
    ) -> Result<Rect>
    where
        S: PixelSource + ?Sized,
        F: FnOnce(Rect, &AspectRatioSpec) -> bool,
    {
        match self.detect(source, options)? {
            DetectionOutcome::Cropped(rect) => Ok(rect),
            DetectionOutcome::Suggested {
                detected,
                suggestion,
            } => {
                if decide(detected, &suggestion) {
                    self.accept_suggestion()
                } else {
                    self.reject_suggestion()
                }
            }
        }
    }

    /// Snapshot of the session for reporting
    pub fn report(&self, input: Option<PathBuf>) -> DetectionReport {
        let s = &self.session;
        DetectionReport {
            input,
            state: s.state,
            image_size: s.image_size,
            region: s.region,
            color_used: s.color_used.map(|c| c.label()),
            detected: s.detected,
            suggestion: s.suggestion,
            applied_ratio: s.applied_ratio,
            final_rect: s.final_rect,
        }
    }

    fn strict_crop(detected: Rect, suggestion: &AspectRatioSpec) -> Option<Rect> {
        match CropGeometry::fit_ratio(detected, suggestion.ratio_value) {
            Ok(rect) => Some(rect),
            Err(e) => {
                warn!(
                    error = %e,
                    ratio = suggestion.name,
                    "strict ratio crop failed, using detected content"
                );
                None
            }
        }
    }

    fn apply(&mut self, rect: Rect) -> Result<Rect> {
        let rect = CropGeometry::validate(rect)?;
        self.session.final_rect = Some(rect);
        self.session.state = SessionState::Cropped;
        info!(%rect, "crop applied");
        Ok(rect)
    }

    fn require_image(&self) -> Result<(u32, u32)> {
        self.session
            .image_size
            .ok_or_else(|| CropError::InvalidInput("no image loaded".to_string()))
    }

    fn require_suggestion(&self) -> Result<(Rect, AspectRatioSpec)> {
        match (self.session.state, self.session.detected, self.session.suggestion) {
            (SessionState::SuggestionPending, Some(detected), Some(suggestion)) => {
                Ok((detected, suggestion))
            }
            (state, _, _) => Err(CropError::InvalidInput(format!(
                "no ratio suggestion pending (state: {})",
                state.name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::{BorderColor, Orientation, COMMON_RATIOS};
    use image::{Rgba, RgbaImage};

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const INK: Rgba<u8> = Rgba([120, 60, 30, 255]);

    fn with_content(width: u32, height: u32, background: Rgba<u8>, content: Rect) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(width, height, background);
        for y in content.y..content.bottom() {
            for x in content.x..content.right() {
                img.put_pixel(x as u32, y as u32, INK);
            }
        }
        img
    }

    fn loaded(img: &RgbaImage) -> CropController {
        let mut controller = CropController::new();
        controller.load_image(img.width(), img.height()).unwrap();
        controller
    }

    #[test]
    fn test_initial_state_is_idle() {
        let controller = CropController::new();
        assert_eq!(controller.state(), SessionState::Idle);
        assert!(controller.session().image_size().is_none());
    }

    #[test]
    fn test_load_image() {
        let mut controller = CropController::new();
        controller.load_image(640, 480).unwrap();
        assert_eq!(controller.state(), SessionState::Ready);
        assert_eq!(controller.session().image_size(), Some((640, 480)));

        assert!(matches!(
            controller.load_image(0, 480),
            Err(CropError::InvalidInput(_))
        ));
        // Failed load keeps the previous session.
        assert_eq!(controller.session().image_size(), Some((640, 480)));
    }

    #[test]
    fn test_detect_without_image() {
        let img = RgbaImage::from_pixel(4, 4, WHITE);
        let mut controller = CropController::new();
        let result = controller.detect(&img, &DetectOptions::default());
        assert!(matches!(result, Err(CropError::InvalidInput(_))));
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn test_detect_size_mismatch() {
        let img = RgbaImage::from_pixel(4, 4, WHITE);
        let mut controller = CropController::new();
        controller.load_image(5, 4).unwrap();
        assert!(controller.detect(&img, &DetectOptions::default()).is_err());
        assert_eq!(controller.state(), SessionState::Ready);
    }

    // TC-SES-001: no ratio match crops directly
    #[test]
    fn test_detect_without_suggestion_crops() {
        // 100x40 content: 2.5:1, far from every catalog ratio.
        let img = with_content(200, 100, WHITE, Rect::new(50, 30, 100, 40));
        let mut controller = loaded(&img);

        let outcome = controller
            .detect(&img, &DetectOptions::exact(BorderColor::White))
            .unwrap();
        assert_eq!(outcome, DetectionOutcome::Cropped(Rect::new(50, 30, 100, 40)));
        assert_eq!(controller.state(), SessionState::Cropped);
        assert_eq!(
            controller.session().final_rect(),
            Some(Rect::new(50, 30, 100, 40))
        );
        assert!(controller.session().suggestion().is_none());
    }

    // TC-SES-002: suggestion accepted
    #[test]
    fn test_suggestion_accept() {
        // 161x90 content: within 5% of 16:9.
        let img = with_content(300, 200, WHITE, Rect::new(20, 10, 161, 90));
        let mut controller = loaded(&img);

        let outcome = controller
            .detect(&img, &DetectOptions::default())
            .unwrap();
        let DetectionOutcome::Suggested {
            detected,
            suggestion,
        } = outcome
        else {
            panic!("expected a suggestion, got {outcome:?}");
        };
        assert_eq!(detected, Rect::new(20, 10, 161, 90));
        assert_eq!(suggestion.name, "16:9");
        assert_eq!(controller.state(), SessionState::SuggestionPending);

        let rect = controller.accept_suggestion().unwrap();
        assert_eq!(rect, Rect::new(21, 10, 160, 90));
        assert_eq!(controller.state(), SessionState::Cropped);
        assert_eq!(controller.session().applied_ratio().unwrap().name, "16:9");
    }

    // TC-SES-003: suggestion rejected
    #[test]
    fn test_suggestion_reject() {
        let img = with_content(300, 200, WHITE, Rect::new(20, 10, 161, 90));
        let mut controller = loaded(&img);
        controller.detect(&img, &DetectOptions::default()).unwrap();

        let rect = controller.reject_suggestion().unwrap();
        assert_eq!(rect, Rect::new(20, 10, 161, 90));
        assert_eq!(controller.state(), SessionState::Cropped);
        assert!(controller.session().applied_ratio().is_none());
        assert_eq!(controller.session().suggestion().unwrap().name, "16:9");
    }

    #[test]
    fn test_accept_without_suggestion() {
        let img = with_content(200, 100, WHITE, Rect::new(50, 30, 100, 40));
        let mut controller = loaded(&img);
        assert!(matches!(
            controller.accept_suggestion(),
            Err(CropError::InvalidInput(_))
        ));
        controller.detect(&img, &DetectOptions::default()).unwrap();
        // Already cropped; nothing pending.
        assert!(controller.reject_suggestion().is_err());
        assert_eq!(controller.state(), SessionState::Cropped);
    }

    // TC-SES-004: black border under auto mode
    #[test]
    fn test_auto_mode_black_border() {
        let img = with_content(120, 80, BLACK, Rect::new(10, 8, 90, 40));
        let mut controller = loaded(&img);

        let outcome = controller.detect(&img, &DetectOptions::default()).unwrap();
        assert_eq!(outcome.detected(), Rect::new(10, 8, 90, 40));
        assert_eq!(controller.session().color_used(), Some(Color::BLACK));
    }

    // TC-SES-005: all-border image
    #[test]
    fn test_no_content_returns_to_ready() {
        let img = RgbaImage::from_pixel(50, 50, BLACK);
        let mut controller = loaded(&img);

        let result = controller.detect(&img, &DetectOptions::exact(BorderColor::Black));
        assert_eq!(result, Err(CropError::NoContentDetected));
        assert_eq!(controller.state(), SessionState::Ready);
        assert!(controller.session().detected().is_none());
        assert!(controller.session().final_rect().is_none());
    }

    #[test]
    fn test_no_content_in_region_returns_to_region_selected() {
        let img = with_content(100, 100, WHITE, Rect::new(60, 60, 20, 20));
        let mut controller = loaded(&img);
        controller.select_region(Rect::new(0, 0, 40, 40)).unwrap();

        let result = controller.detect(&img, &DetectOptions::exact(BorderColor::White));
        assert_eq!(result, Err(CropError::NoContentDetected));
        assert_eq!(controller.state(), SessionState::RegionSelected);
    }

    // TC-SES-006: sub-region detection in image coordinates
    #[test]
    fn test_region_detection_translates() {
        let mut img = RgbaImage::from_pixel(200, 200, BLACK);
        for y in 20..80 {
            for x in 10..60 {
                img.put_pixel(x, y, WHITE);
            }
        }
        for y in 25..76 {
            for x in 13..56 {
                img.put_pixel(x, y, INK);
            }
        }

        let mut controller = loaded(&img);
        let region = controller.select_region(Rect::new(10, 20, 50, 60)).unwrap();
        assert_eq!(region, Rect::new(10, 20, 50, 60));
        assert_eq!(controller.state(), SessionState::RegionSelected);

        let outcome = controller
            .detect(&img, &DetectOptions::exact(BorderColor::White))
            .unwrap();
        assert_eq!(outcome.detected(), Rect::new(13, 25, 43, 51));
    }

    // TC-SES-007: invalid region leaves the session unchanged
    #[test]
    fn test_invalid_region_keeps_session() {
        let img = with_content(200, 100, WHITE, Rect::new(50, 30, 100, 40));
        let mut controller = loaded(&img);
        controller.detect(&img, &DetectOptions::default()).unwrap();
        let before = controller.session().clone();

        let result = controller.select_region(Rect::new(250, 10, 20, 20));
        assert!(matches!(result, Err(CropError::InvalidInput(_))));
        assert_eq!(controller.session(), &before);
    }

    #[test]
    fn test_select_region_without_image() {
        let mut controller = CropController::new();
        assert!(controller.select_region(Rect::new(0, 0, 10, 10)).is_err());
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn test_new_detection_discards_suggestion() {
        let img = with_content(300, 200, WHITE, Rect::new(20, 10, 161, 90));
        let mut controller = loaded(&img);
        controller.detect(&img, &DetectOptions::default()).unwrap();
        assert!(controller.session().suggestion().is_some());

        // Restricting to a 2.5:1 slice of the content yields no suggestion.
        controller.select_region(Rect::new(20, 10, 100, 40)).unwrap();
        assert!(controller.session().suggestion().is_none());
        assert!(controller.session().detected().is_none());

        let outcome = controller
            .detect(&img, &DetectOptions::exact(BorderColor::White))
            .unwrap();
        assert!(matches!(outcome, DetectionOutcome::Cropped(_)));
        assert!(controller.session().suggestion().is_none());
    }

    #[test]
    fn test_clear_region() {
        let img = RgbaImage::from_pixel(10, 10, WHITE);
        let mut controller = loaded(&img);
        controller.select_region(Rect::new(2, 2, 5, 5)).unwrap();
        controller.clear_region().unwrap();
        assert_eq!(controller.state(), SessionState::Ready);
        assert!(controller.session().region().is_none());
    }

    #[test]
    fn test_reset() {
        let img = RgbaImage::from_pixel(10, 10, WHITE);
        let mut controller = loaded(&img);
        controller.reset();
        assert_eq!(controller.session(), &CropSession::default());
    }

    #[test]
    fn test_strict_fit_failure_falls_back() {
        let detected = Rect::new(5, 5, 40, 30);
        let broken = AspectRatioSpec {
            name: "broken",
            ratio_value: f64::NAN,
            orientation: Orientation::Square,
        };
        assert_eq!(CropController::strict_crop(detected, &broken), None);
        assert_eq!(
            CropController::strict_crop(detected, &COMMON_RATIOS[2]),
            Some(detected)
        );
    }

    #[test]
    fn test_accept_degenerate_suggestion_keeps_detected() {
        let detected = Rect::new(5, 5, 40, 30);
        let mut controller = CropController::new();
        controller.session = CropSession {
            state: SessionState::SuggestionPending,
            image_size: Some((60, 50)),
            detected: Some(detected),
            suggestion: Some(AspectRatioSpec {
                name: "broken",
                ratio_value: f64::NAN,
                orientation: Orientation::Square,
            }),
            ..Default::default()
        };

        assert_eq!(controller.accept_suggestion().unwrap(), detected);
        assert_eq!(controller.state(), SessionState::Cropped);
        assert_eq!(controller.session().final_rect(), Some(detected));
        assert!(controller.session().applied_ratio().is_none());
    }

    #[test]
    fn test_run_cycle_decider() {
        let img = with_content(300, 200, WHITE, Rect::new(20, 10, 161, 90));

        let mut controller = loaded(&img);
        let accepted = controller
            .run_cycle(&img, &DetectOptions::default(), |_, _| true)
            .unwrap();
        assert_eq!(accepted, Rect::new(21, 10, 160, 90));

        let mut controller = loaded(&img);
        let rejected = controller
            .run_cycle(&img, &DetectOptions::default(), |_, s| s.name != "16:9")
            .unwrap();
        assert_eq!(rejected, Rect::new(20, 10, 161, 90));
    }

    #[test]
    fn test_report() {
        let img = with_content(200, 100, WHITE, Rect::new(50, 30, 100, 40));
        let mut controller = loaded(&img);
        controller.detect(&img, &DetectOptions::default()).unwrap();

        let report = controller.report(Some(PathBuf::from("in.png")));
        assert_eq!(report.state, SessionState::Cropped);
        assert_eq!(report.color_used.as_deref(), Some("white"));
        assert_eq!(report.final_rect, Some(Rect::new(50, 30, 100, 40)));

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"state\":\"cropped\""));
    }
}
