//! Progress reporting for crop runs.
//!
//! Stage display and verbosity gating for the CLI, a callback trait the
//! pipeline reports through, and the batch summary tally.

use std::fmt;

/// Stages of one image's crop cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropStage {
    /// Decoding the input
    #[default]
    Loading,
    /// Scanning for borders
    Detecting,
    /// Waiting on a ratio decision
    Suggesting,
    /// Extracting the crop
    Cropping,
    /// Writing the output
    Saving,
}

impl CropStage {
    pub fn name(&self) -> &'static str {
        match self {
            CropStage::Loading => "Loading",
            CropStage::Detecting => "Detecting",
            CropStage::Suggesting => "Suggesting",
            CropStage::Cropping => "Cropping",
            CropStage::Saving => "Saving",
        }
    }

    /// Status line shown while the stage runs
    pub fn description(&self) -> &'static str {
        match self {
            CropStage::Loading => "reading image",
            CropStage::Detecting => "detecting borders",
            CropStage::Suggesting => "checking aspect ratio",
            CropStage::Cropping => "cropping",
            CropStage::Saving => "writing output",
        }
    }
}

impl fmt::Display for CropStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.description())
    }
}

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// No output
    Quiet,
    /// Results only
    #[default]
    Normal,
    /// Stage-by-stage output
    Verbose,
    /// Stage output plus debug details
    VeryVerbose,
}

impl OutputMode {
    /// Mode for a `-v` count, with `--quiet` taking precedence
    pub fn from_flags(verbosity: u8, quiet: bool) -> Self {
        if quiet {
            return OutputMode::Quiet;
        }
        match verbosity {
            0 => OutputMode::Normal,
            1 => OutputMode::Verbose,
            _ => OutputMode::VeryVerbose,
        }
    }

    /// Check if output should be shown at this mode
    pub fn should_show(&self, required: OutputMode) -> bool {
        use OutputMode::*;
        match (self, required) {
            (Quiet, _) => false,
            (Normal, Quiet | Normal) => true,
            (Verbose, Quiet | Normal | Verbose) => true,
            (VeryVerbose, _) => true,
            _ => false,
        }
    }
}

/// Progress hooks invoked by the crop pipeline.
///
/// `input` is the display name of the file being processed; batch runs call
/// these from several worker threads at once.
pub trait ProgressCallback: Sync {
    fn on_step_start(&self, _input: &str, _stage: CropStage) {}
    fn on_step_complete(&self, _input: &str, _stage: CropStage, _message: &str) {}
    fn on_debug(&self, _message: &str) {}
}

/// Callback that reports nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {}

/// Per-run tally for batch crops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total_files: usize,
    pub cropped: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl BatchSummary {
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            ..Self::default()
        }
    }

    pub fn record_cropped(&mut self) {
        self.cropped += 1;
    }

    /// Output already existed
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// Print final summary
    pub fn print(&self, elapsed_secs: f64) {
        println!();
        println!("{}", "=".repeat(60));
        println!("Crop Summary");
        println!("{}", "=".repeat(60));
        println!("  Total files:  {}", self.total_files);
        println!("  Cropped:      {}", self.cropped);
        println!("  Skipped:      {}", self.skipped);
        println!("  Errors:       {}", self.errors);
        println!("{}", "=".repeat(60));
        println!("Total time: {:.2}s", elapsed_secs);
    }
}
