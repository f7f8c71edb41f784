//! border-crop - Remove uniform borders from images
//!
//! CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use border_crop::cli::{create_cli_overrides, scan_overrides};
use border_crop::{
    exit_codes, image_io, AspectRatioSpec, BatchSummary, Cli, Commands, Config, ConfigArgs,
    CropArgs, CropPipeline, CropResult, CropStage, DetectArgs, DetectionReport, OutputMode,
    PipelineError, ProgressCallback, RatioDecider, RatioPolicy, Rect, ASPECT_RATIO_TOLERANCE,
    COMMON_RATIOS,
};

fn main() {
    let cli = Cli::parse();
    let mode = OutputMode::from_flags(cli.verbose, cli.quiet);
    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Crop(args) => run_crop(args, mode),
        Commands::Detect(args) => run_detect(args, mode),
        Commands::Ratios => run_ratios(),
        Commands::Config(args) => run_config(args),
    };

    std::process::exit(match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_codes::GENERAL_ERROR
        }
    });
}

/// Log to stderr; `RUST_LOG` overrides the level picked from the flags.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 | 1 => "warn",
            2 => "info",
            _ => "debug",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("border_crop={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ============ Progress Callback Implementation ============

/// Stage output for the CLI, or a progress bar for batch runs
struct CliProgress {
    mode: OutputMode,
    bar: Option<ProgressBar>,
}

impl CliProgress {
    fn new(mode: OutputMode, bar: Option<ProgressBar>) -> Self {
        Self { mode, bar }
    }
}

impl ProgressCallback for CliProgress {
    fn on_step_start(&self, input: &str, stage: CropStage) {
        if stage == CropStage::Loading {
            if let Some(bar) = &self.bar {
                bar.set_message(input.to_string());
            }
        }
        if self.mode.should_show(OutputMode::Verbose) {
            if stage == CropStage::Loading {
                println!("Processing: {}", input);
            }
            println!("  [{}] {}", input, stage);
        }
    }

    fn on_step_complete(&self, input: &str, stage: CropStage, message: &str) {
        if self.mode.should_show(OutputMode::Verbose) {
            println!("    [{}] {}: {}", input, stage.name(), message);
        }
    }

    fn on_debug(&self, message: &str) {
        if self.mode.should_show(OutputMode::VeryVerbose) {
            println!("    [DEBUG] {}", message);
        }
    }
}

fn batch_progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

// ============ Ratio Prompt ============

/// Asks on stdin whether to snap to the suggested ratio
struct PromptDecider;

impl RatioDecider for PromptDecider {
    fn decide(&self, input: &Path, detected: Rect, suggestion: &AspectRatioSpec) -> bool {
        eprint!(
            "{}: content {} is close to {}. Crop to exactly {}? [y/N] ",
            input.display(),
            detected,
            suggestion,
            suggestion.name
        );
        std::io::stderr().flush().ok();

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

// ============ Crop Command ============

fn run_crop(args: &CropArgs, mode: OutputMode) -> Result<i32> {
    let start_time = Instant::now();

    let file_config = match load_config(args.scan.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return Ok(exit_codes::INVALID_ARGS);
        }
    };
    let config = file_config.merge_with_cli(&create_cli_overrides(args));

    let files = match image_io::collect_image_files(&args.inputs, &config.output_suffix) {
        Ok(files) if !files.is_empty() => files,
        Ok(_) => {
            eprintln!("Error: No image files found in input paths");
            return Ok(exit_codes::INPUT_NOT_FOUND);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(exit_codes::INPUT_NOT_FOUND);
        }
    };

    let pipeline = CropPipeline::new(config).with_region(args.scan.region);
    let policy = pipeline.config().ratio_policy;

    let jobs: Vec<(PathBuf, PathBuf)> = files
        .iter()
        .map(|input| (input.clone(), args.output_dir_for(input)))
        .collect();
    let conflicts = pipeline.conflicting_outputs(&jobs);
    if !conflicts.is_empty() {
        for output in &conflicts {
            eprintln!("Error: {} would be written by more than one input", output.display());
        }
        return Ok(exit_codes::INVALID_ARGS);
    }

    // Prompts only make sense for a single image on an interactive terminal.
    let decider: Box<dyn RatioDecider> =
        if policy == RatioPolicy::Prompt && files.len() == 1 && std::io::stdin().is_terminal() {
            Box::new(PromptDecider)
        } else {
            Box::new(policy)
        };

    let threads = pipeline.config().threads.unwrap_or_else(num_cpus::get).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("failed to start worker pool")?;

    let bar = (files.len() > 1 && mode == OutputMode::Normal && !args.json)
        .then(|| batch_progress_bar(files.len()));
    let progress = CliProgress::new(mode, bar.clone());

    let results: Vec<(PathBuf, Result<CropResult, PipelineError>)> = pool.install(|| {
        jobs.par_iter()
            .map(|(input, output_dir)| {
                let result = if args.dry_run {
                    pipeline.dry_run(input, output_dir, decider.as_ref(), &progress)
                } else {
                    pipeline.process(input, output_dir, decider.as_ref(), &progress)
                };
                if let Some(bar) = &progress.bar {
                    bar.inc(1);
                }
                (input.clone(), result)
            })
            .collect()
    });

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let mut summary = BatchSummary::new(files.len());
    let mut error_codes = Vec::new();

    for (input, result) in &results {
        match result {
            Ok(result) => {
                summary.record_cropped();
                if args.json {
                    println!("{}", serde_json::to_string(result)?);
                } else if mode.should_show(OutputMode::Normal) {
                    print_crop_result(input, result);
                }
            }
            Err(PipelineError::OutputExists(path)) => {
                summary.record_skipped();
                if mode.should_show(OutputMode::Normal) {
                    println!("Skipping (exists): {}", path.display());
                }
            }
            Err(e) => {
                eprintln!("Error processing {}: {}", input.display(), e);
                summary.record_error();
                error_codes.push(exit_code_for(e));
            }
        }
    }

    if files.len() > 1 && !args.json && mode.should_show(OutputMode::Normal) {
        summary.print(start_time.elapsed().as_secs_f64());
    }

    Ok(batch_exit_code(&error_codes))
}

/// A single shared failure kind keeps its specific code
fn batch_exit_code(error_codes: &[i32]) -> i32 {
    match error_codes.split_first() {
        None => exit_codes::SUCCESS,
        Some((first, rest)) if rest.iter().all(|c| c == first) => *first,
        Some(_) => exit_codes::GENERAL_ERROR,
    }
}

fn print_crop_result(input: &Path, result: &CropResult) {
    let rect = result
        .report
        .final_rect
        .map(|r| r.to_string())
        .unwrap_or_default();
    let ratio = result
        .report
        .applied_ratio
        .map(|r| format!(" [{}]", r.name))
        .unwrap_or_default();
    let action = if result.written { "wrote" } else { "would write" };

    println!(
        "{}: {}{} -> {} {} ({}x{}, ~{:.1} KiB)",
        input.display(),
        rect,
        ratio,
        action,
        result.output.display(),
        result.summary.width,
        result.summary.height,
        result.summary.estimated_kib()
    );
}

// ============ Detect Command ============

fn run_detect(args: &DetectArgs, mode: OutputMode) -> Result<i32> {
    let file_config = match load_config(args.scan.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return Ok(exit_codes::INVALID_ARGS);
        }
    };
    let config = file_config.merge_with_cli(&scan_overrides(&args.scan));
    let pipeline = CropPipeline::new(config).with_region(args.scan.region);

    match pipeline.detect(&args.input, &CliProgress::new(mode, None)) {
        Ok(report) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if mode.should_show(OutputMode::Normal) {
                print_report(&report);
            }
            Ok(exit_codes::SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(exit_code_for(&e))
        }
    }
}

fn print_report(report: &DetectionReport) {
    fn or_none<T: ToString>(value: Option<T>) -> String {
        value.map(|v| v.to_string()).unwrap_or_else(|| "none".to_string())
    }

    if let Some(input) = &report.input {
        println!("Input:      {}", input.display());
    }
    if let Some((width, height)) = report.image_size {
        println!("Image:      {}x{}", width, height);
    }
    if let Some(region) = report.region {
        println!("Region:     {}", region);
    }
    println!("Border:     {}", or_none(report.color_used.as_deref()));
    println!("Content:    {}", or_none(report.detected));
    println!("Suggestion: {}", or_none(report.suggestion));
}

// ============ Ratios Command ============

fn run_ratios() -> Result<i32> {
    println!("{:<6} {:>8}  Orientation", "Name", "Ratio");
    for ratio in &COMMON_RATIOS {
        println!(
            "{:<6} {:>8.4}  {}",
            ratio.name,
            ratio.ratio_value,
            ratio.orientation.name()
        );
    }
    println!();
    println!(
        "Suggested when within {:.0}% of the detected content ratio.",
        ASPECT_RATIO_TOLERANCE * 100.0
    );
    Ok(exit_codes::SUCCESS)
}

// ============ Config Command ============

fn run_config(args: &ConfigArgs) -> Result<i32> {
    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return Ok(exit_codes::INVALID_ARGS);
        }
    };

    if !args.print {
        match args.config.clone().or_else(Config::default_path) {
            Some(path) => {
                let status = if path.exists() { "found" } else { "not found, using defaults" };
                println!("Config file: {} ({})", path.display(), status);
            }
            None => println!("Config file: no config directory on this platform"),
        }
        println!();
    }
    print!("{}", config.to_toml()?);
    Ok(exit_codes::SUCCESS)
}

// ============ Helper Functions ============

/// Explicit paths must load; a broken default config is ignored with a warning.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(Config::load().unwrap_or_else(|e| {
            warn!(error = %e, "ignoring unreadable default config");
            Config::default()
        })),
    }
}

fn exit_code_for(error: &PipelineError) -> i32 {
    if error.is_not_found() {
        exit_codes::INPUT_NOT_FOUND
    } else if error.is_no_content() {
        exit_codes::NO_CONTENT
    } else {
        exit_codes::GENERAL_ERROR
    }
}
