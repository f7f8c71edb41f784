//! Per-file crop pipeline
//!
//! Loads one image, runs a crop session over it and writes the result.
//! Each call owns its own [`CropController`], so a pipeline can be shared
//! across worker threads for batch runs.

use image::RgbaImage;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{Config, RatioPolicy};
use crate::crop::{AspectRatioSpec, CropError, Rect};
use crate::image_io::{self, CropSummary, ImageIoError};
use crate::progress::{CropStage, ProgressCallback};
use crate::session::{CropController, DetectionOutcome, DetectionReport};

/// Pipeline error types
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Image(#[from] ImageIoError),

    #[error("Output already exists: {0}")]
    OutputExists(PathBuf),
}

impl From<CropError> for PipelineError {
    fn from(e: CropError) -> Self {
        PipelineError::Image(ImageIoError::Crop(e))
    }
}

impl PipelineError {
    /// Underlying crop engine error, if any
    pub fn crop_error(&self) -> Option<&CropError> {
        match self {
            PipelineError::Image(ImageIoError::Crop(e)) => Some(e),
            _ => None,
        }
    }

    pub fn is_no_content(&self) -> bool {
        matches!(self.crop_error(), Some(CropError::NoContentDetected))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PipelineError::Image(ImageIoError::ImageNotFound(_)))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

// ============================================================
// Ratio decisions
// ============================================================

/// Decides whether a suggested aspect ratio is applied
pub trait RatioDecider: Sync {
    fn decide(&self, input: &Path, detected: Rect, suggestion: &AspectRatioSpec) -> bool;
}

/// Fixed policy; `Prompt` cannot ask here and rejects.
impl RatioDecider for RatioPolicy {
    fn decide(&self, _input: &Path, _detected: Rect, _suggestion: &AspectRatioSpec) -> bool {
        matches!(self, RatioPolicy::Accept)
    }
}

// ============================================================
// Results
// ============================================================

/// Outcome of processing one file
#[derive(Debug, Clone, Serialize)]
pub struct CropResult {
    pub report: DetectionReport,
    /// Where the crop was (or on a dry run, would be) written
    pub output: PathBuf,
    pub written: bool,
    pub summary: CropSummary,
    pub elapsed_seconds: f64,
}

// ============================================================
// Pipeline
// ============================================================

/// Crop pipeline for image files
#[derive(Debug, Clone, Default)]
pub struct CropPipeline {
    config: Config,
    region: Option<Rect>,
}

impl CropPipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            region: None,
        }
    }

    /// Restrict detection to `region` in every processed image
    #[must_use]
    pub fn with_region(mut self, region: Option<Rect>) -> Self {
        self.region = region;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Output path for `input` under `output_dir`
    pub fn get_output_path(&self, input: &Path, output_dir: &Path) -> PathBuf {
        image_io::output_path_for(input, output_dir, &self.config.output_suffix)
    }

    /// Output paths that a batch of `(input, output_dir)` jobs would clobber.
    ///
    /// A path is reported when two inputs map to it, or when it is itself
    /// one of the inputs. Sorted, without duplicates.
    pub fn conflicting_outputs(&self, jobs: &[(PathBuf, PathBuf)]) -> Vec<PathBuf> {
        let mut claims: HashMap<PathBuf, usize> = HashMap::new();
        for (input, output_dir) in jobs {
            *claims.entry(self.get_output_path(input, output_dir)).or_default() += 1;
        }

        let mut conflicts: Vec<PathBuf> = claims
            .into_iter()
            .filter(|(output, count)| {
                *count > 1 || jobs.iter().any(|(input, _)| input == output)
            })
            .map(|(output, _)| output)
            .collect();
        conflicts.sort();
        conflicts
    }

    /// Detect borders without deciding on a suggestion or writing anything.
    ///
    /// A matched ratio leaves the report in `suggestion_pending`.
    pub fn detect(&self, input: &Path, progress: &dyn ProgressCallback) -> Result<DetectionReport> {
        let name = display_name(input);
        let (image, mut controller) = self.open_session(input, &name, progress)?;

        progress.on_step_start(&name, CropStage::Detecting);
        let outcome = controller.detect(&image, &self.config.detect_options())?;
        progress.on_step_complete(
            &name,
            CropStage::Detecting,
            &format!("content {}", outcome.detected()),
        );

        Ok(controller.report(Some(input.to_path_buf())))
    }

    /// Crop `input` and write the result under `output_dir`
    pub fn process(
        &self,
        input: &Path,
        output_dir: &Path,
        decider: &dyn RatioDecider,
        progress: &dyn ProgressCallback,
    ) -> Result<CropResult> {
        self.run(input, output_dir, decider, progress, true)
    }

    /// Same as [`process`](Self::process) but never writes
    pub fn dry_run(
        &self,
        input: &Path,
        output_dir: &Path,
        decider: &dyn RatioDecider,
        progress: &dyn ProgressCallback,
    ) -> Result<CropResult> {
        self.run(input, output_dir, decider, progress, false)
    }

    fn run(
        &self,
        input: &Path,
        output_dir: &Path,
        decider: &dyn RatioDecider,
        progress: &dyn ProgressCallback,
        write: bool,
    ) -> Result<CropResult> {
        let start = Instant::now();
        let name = display_name(input);
        let output = self.get_output_path(input, output_dir);
        if write && output.exists() && !self.config.overwrite {
            return Err(PipelineError::OutputExists(output));
        }

        let (image, mut controller) = self.open_session(input, &name, progress)?;

        progress.on_step_start(&name, CropStage::Detecting);
        let outcome = controller.detect(&image, &self.config.detect_options())?;
        progress.on_step_complete(
            &name,
            CropStage::Detecting,
            &format!("content {}", outcome.detected()),
        );

        let rect = match outcome {
            DetectionOutcome::Cropped(rect) => rect,
            DetectionOutcome::Suggested {
                detected,
                suggestion,
            } => {
                progress.on_step_start(&name, CropStage::Suggesting);
                let accepted = decider.decide(input, detected, &suggestion);
                let rect = if accepted {
                    controller.accept_suggestion()?
                } else {
                    controller.reject_suggestion()?
                };
                let verdict = if accepted { "accepted" } else { "rejected" };
                progress.on_step_complete(
                    &name,
                    CropStage::Suggesting,
                    &format!("{suggestion} {verdict}"),
                );
                rect
            }
        };

        progress.on_step_start(&name, CropStage::Cropping);
        let cropped = image_io::extract_crop(&image, rect)?;
        let summary = CropSummary::of(&cropped)?;
        progress.on_step_complete(
            &name,
            CropStage::Cropping,
            &format!("{}x{}, ~{:.1} KiB", summary.width, summary.height, summary.estimated_kib()),
        );

        if write {
            progress.on_step_start(&name, CropStage::Saving);
            image_io::save_image(&cropped, &output)?;
            progress.on_step_complete(&name, CropStage::Saving, &output.display().to_string());
            info!(input = %input.display(), output = %output.display(), %rect, "crop written");
        } else {
            debug!(input = %input.display(), %rect, "dry run, nothing written");
        }

        Ok(CropResult {
            report: controller.report(Some(input.to_path_buf())),
            output,
            written: write,
            summary,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        })
    }

    fn open_session(
        &self,
        input: &Path,
        name: &str,
        progress: &dyn ProgressCallback,
    ) -> Result<(RgbaImage, CropController)> {
        progress.on_step_start(name, CropStage::Loading);
        let image = image_io::load_image(input)?;

        let mut controller = CropController::new();
        controller.load_image(image.width(), image.height())?;
        if let Some(region) = self.region {
            let clamped = controller.select_region(region)?;
            if clamped != region {
                progress.on_debug(&format!("{name}: region clamped to {clamped}"));
            }
        }
        progress.on_step_complete(
            name,
            CropStage::Loading,
            &format!("{}x{}", image.width(), image.height()),
        );

        Ok((image, controller))
    }
}

fn display_name(input: &Path) -> String {
    input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string())
}
