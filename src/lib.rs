//! border-crop - Border detection and crop geometry for images
//!
//! Finds uniform white or black borders around image content, suggests a
//! close common aspect ratio, and computes the final crop rectangle.
//!
//! # Modules
//!
//! - [`crop`]: border scanning, ratio matching and crop geometry
//! - [`session`]: the crop session state machine
//! - [`image_io`]: decoding, crop extraction and export
//! - [`pipeline`]: per-file processing used by the CLI
//! - [`config`]: TOML configuration with CLI overrides
//! - [`progress`]: stage reporting and verbosity
//! - [`cli`]: command-line definitions and exit codes

pub mod cli;
pub mod config;
pub mod crop;
pub mod image_io;
pub mod pipeline;
pub mod progress;
pub mod session;

// Crop engine
pub use crop::{
    AspectRatioSpec, BorderColor, BorderLimits, BorderScanner, Color, CropError, CropGeometry,
    DetectOptions, DetectOptionsBuilder, Orientation, PixelBuffer, PixelSource, RatioMatcher, Rect,
    ScanOutcome, SubView, ASPECT_RATIO_TOLERANCE, COMMON_RATIOS, DEFAULT_TOLERANCE,
};

// Session
pub use session::{
    CropController, CropSession, DetectionOutcome, DetectionReport, SessionState,
};

// I/O
pub use image_io::{CropSummary, ImageIoError};

// Pipeline
pub use pipeline::{CropPipeline, CropResult, PipelineError, RatioDecider};

// Config
pub use config::{CliOverrides, Config, ConfigError, RatioPolicy};

// Progress
pub use progress::{BatchSummary, CropStage, OutputMode, ProgressCallback, SilentProgress};

// CLI
pub use cli::{exit_codes, Cli, Commands, ConfigArgs, CropArgs, DetectArgs, ScanArgs};
