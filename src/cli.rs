//! Command-line interface definitions

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{CliOverrides, RatioPolicy};
use crate::crop::{BorderColor, Rect};

/// Process exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INVALID_ARGS: i32 = 2;
    pub const INPUT_NOT_FOUND: i32 = 3;
    /// Nothing but border was found
    pub const NO_CONTENT: i32 = 4;
}

#[derive(Debug, Parser)]
#[command(
    name = "border-crop",
    version,
    about = "Detect and remove uniform white or black borders from images"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v stages, -vv debug logging)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Detect borders and write cropped images
    Crop(CropArgs),
    /// Report detected content without writing anything
    Detect(DetectArgs),
    /// List the aspect ratios used for suggestions
    Ratios,
    /// Show the config file location and effective settings
    Config(ConfigArgs),
}

/// Detection flags shared by `crop` and `detect`
#[derive(Debug, Clone, Args)]
pub struct ScanArgs {
    /// Border color to remove
    #[arg(long, value_enum)]
    pub color: Option<BorderColor>,

    /// Per-channel color tolerance (0 = exact match)
    #[arg(short, long)]
    pub tolerance: Option<u32>,

    /// Only look for borders inside this region: x,y,width,height
    #[arg(long, value_parser = parse_region)]
    pub region: Option<Rect>,

    /// Config file (default: the user config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct CropArgs {
    /// Image files or directories
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output directory (default: next to each input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub scan: ScanArgs,

    /// What to do with a suggested aspect ratio
    #[arg(long, value_enum)]
    pub ratio: Option<RatioPolicy>,

    /// Suffix appended to output file names
    #[arg(long)]
    pub suffix: Option<String>,

    /// Replace existing output files
    #[arg(long)]
    pub overwrite: bool,

    /// Worker threads for batch runs (default: CPU count)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Detect and report, but write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Print one JSON record per input
    #[arg(long)]
    pub json: bool,
}

impl CropArgs {
    /// Output directory for `input`
    pub fn output_dir_for(&self, input: &Path) -> PathBuf {
        match &self.output {
            Some(dir) => dir.clone(),
            None => input
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct DetectArgs {
    /// Image file
    pub input: PathBuf,

    #[command(flatten)]
    pub scan: ScanArgs,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Print the effective config as TOML
    #[arg(long)]
    pub print: bool,

    /// Config file to read instead of the default
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Parse `x,y,width,height`
pub fn parse_region(s: &str) -> Result<Rect, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(format!("expected x,y,width,height, got '{s}'"));
    }

    let mut values = [0i64; 4];
    for (value, part) in values.iter_mut().zip(&parts) {
        *value = part
            .parse()
            .map_err(|_| format!("'{part}' is not an integer"))?;
    }

    let [x, y, width, height] = values;
    if width <= 0 || height <= 0 {
        return Err(format!("region size must be positive, got {width}x{height}"));
    }
    Ok(Rect::new(x, y, width, height))
}

/// Overrides for the values set explicitly in `crop` arguments
pub fn create_cli_overrides(args: &CropArgs) -> CliOverrides {
    let mut overrides = scan_overrides(&args.scan);
    overrides.ratio_policy = args.ratio;
    overrides.output_suffix = args.suffix.clone();
    if args.overwrite {
        overrides.overwrite = Some(true);
    }
    overrides.threads = args.threads;
    overrides
}

/// Overrides for the detection flags alone
pub fn scan_overrides(scan: &ScanArgs) -> CliOverrides {
    CliOverrides {
        border_color: scan.color,
        tolerance: scan.tolerance,
        ..CliOverrides::new()
    }
}
