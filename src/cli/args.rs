//! CLI argument definitions.

use crate::config::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Camera-trap image analysis: animal detection and species classification.
#[derive(Debug, Parser)]
#[command(name = "camtrap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Input image files or directories to analyze.
    pub inputs: Vec<PathBuf>,

    /// Common options for analysis.
    #[command(flatten)]
    pub analyze: AnalyzeArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage models.
    Models {
        /// Models action to perform.
        #[command(subcommand)]
        action: ModelsAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Models subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ModelsAction {
    /// Verify configured model and label files exist.
    Check,
}

/// Arguments for the analyze command.
#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct AnalyzeArgs {
    /// Path to the detector ONNX model file (overrides config).
    #[arg(long, env = "CAMTRAP_DETECTOR_PATH")]
    pub detector_path: Option<PathBuf>,

    /// Path to the detector labels file (overrides config).
    #[arg(long, env = "CAMTRAP_DETECTOR_LABELS")]
    pub detector_labels: Option<PathBuf>,

    /// Path to the species classifier ONNX model file (overrides config).
    #[arg(long, env = "CAMTRAP_CLASSIFIER_PATH")]
    pub classifier_path: Option<PathBuf>,

    /// Path to the species classifier labels file (overrides config).
    #[arg(long, env = "CAMTRAP_CLASSIFIER_LABELS")]
    pub classifier_labels: Option<PathBuf>,

    /// Output formats (comma-separated: json,csv).
    #[arg(short, long, value_delimiter = ',', env = "CAMTRAP_FORMAT")]
    pub format: Option<Vec<OutputFormat>>,

    /// Output directory for reports (default: current directory).
    #[arg(short, long, env = "CAMTRAP_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Number of images processed concurrently.
    #[arg(short, long, value_parser = parse_workers, env = "CAMTRAP_WORKERS")]
    pub workers: Option<usize>,

    /// Suppress progress output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace+ORT info, -vvv: trace+ORT debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Enable CUDA GPU acceleration.
    #[arg(long, conflicts_with = "cpu")]
    pub gpu: bool,

    /// Force CPU inference.
    #[arg(long, conflicts_with = "gpu")]
    pub cpu: bool,
}

/// Parse and validate worker count.
fn parse_workers(s: &str) -> Result<usize, String> {
    use crate::constants::MAX_WORKERS;

    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 || value > MAX_WORKERS {
        return Err(format!("workers must be between 1 and {MAX_WORKERS}, got {value}"));
    }

    Ok(value)
}
