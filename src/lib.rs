//! Camtrap - camera-trap image analysis CLI tool.
//!
//! This crate provides a two-stage pipeline over camera-trap imagery: an
//! animal detector locates candidate regions, an optional species classifier
//! refines each region into a species label.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod imaging;
pub mod inference;
pub mod output;
pub mod pipeline;
pub mod registry;

use clap::Parser;
use cli::{AnalyzeArgs, Cli, Command};
use config::{
    Config, InferenceDevice, ModelConfig, OutputFormat, config_file_path, load_default_config,
    save_default_config, validate_config, validate_model_config,
};
use constants::combined_filenames;
use output::{BatchReport, progress, write_csv_report, write_json_report};
use pipeline::{collect_input_files, process_batch};
use registry::{ModelRegistry, OnnxModelLoader};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub use error::{Error, Result};

/// Main entry point for camtrap CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.analyze.verbose, cli.analyze.quiet);

    let config = load_default_config()?;

    if let Some(command) = cli.command {
        return handle_command(command, &config);
    }

    // Show help if no inputs provided
    if cli.inputs.is_empty() {
        cli::help::print_smart_help(&config);
        return Ok(());
    }

    analyze_files(&cli.inputs, &cli.analyze, config)
}

/// Analyze input images with the given options.
fn analyze_files(inputs: &[PathBuf], args: &AnalyzeArgs, config: Config) -> Result<()> {
    let files = collect_input_files(inputs)?;
    if files.is_empty() {
        return Err(Error::NoValidImageFiles);
    }

    info!("Found {} image file(s) to process", files.len());

    let config = apply_cli_overrides(config, args)?;
    validate_config(&config)?;

    // validate_config guarantees the detector is present
    let detector_config = config
        .models
        .detector
        .clone()
        .ok_or_else(|| Error::Internal {
            message: "detector missing after validation".to_string(),
        })?;
    let model_name = detector_config.path.display().to_string();

    let device = if args.gpu {
        InferenceDevice::Gpu
    } else if args.cpu {
        InferenceDevice::Cpu
    } else {
        config.inference.device
    };

    let workers = args.workers.unwrap_or(config.batch.workers);
    let formats = args
        .format
        .clone()
        .unwrap_or_else(|| config.output.formats.clone());
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&output_dir).map_err(|e| Error::OutputDirCreate {
        path: output_dir.clone(),
        source: e,
    })?;

    let loader = OnnxModelLoader::new(
        detector_config,
        config.models.classifier.clone(),
        device,
    );
    let registry = ModelRegistry::new(Arc::new(loader));

    let progress_bar = progress::create_batch_progress(files.len(), !args.quiet);

    let runtime = tokio::runtime::Runtime::new()?;
    let outcome = runtime.block_on(async {
        let detector = registry.detector().await?;
        let classifier = registry.classifier().await?;
        Ok::<_, Error>(process_batch(files, detector, classifier, workers, progress_bar).await)
    })?;

    for format in &formats {
        let path = match format {
            OutputFormat::Json => {
                let path = output_dir.join(combined_filenames::JSON);
                let report =
                    BatchReport::new(&model_name, outcome.summary.clone(), outcome.reports.clone());
                write_json_report(&path, &report)?;
                path
            }
            OutputFormat::Csv => {
                let path = output_dir.join(combined_filenames::CSV);
                write_csv_report(&path, &outcome.reports)?;
                path
            }
        };
        info!("Wrote {} report: {}", format, path.display());
    }

    let summary = &outcome.summary;
    info!(
        "Complete: {} images, {} with animals, {} empty, {} errors in {:.2}s",
        summary.total_images,
        summary.animals_detected,
        summary.empty_images,
        summary.low_quality,
        summary.processing_time
    );
    for (species, count) in &summary.species_count {
        info!("  {species}: {count} image(s)");
    }
    if summary.low_quality > 0 {
        warn!("{} image(s) could not be processed", summary.low_quality);
    }

    Ok(())
}

/// Apply CLI model overrides on top of the loaded configuration.
///
/// Each model's path and labels must be overridden together; a lone half of
/// the pair is a configuration error.
fn apply_cli_overrides(mut config: Config, args: &AnalyzeArgs) -> Result<Config> {
    match (&args.detector_path, &args.detector_labels) {
        (Some(path), Some(labels)) => {
            config.models.detector = Some(ModelConfig {
                path: path.clone(),
                labels: labels.clone(),
            });
        }
        (None, None) => {}
        _ => {
            return Err(Error::ConfigValidation {
                message: "--detector-path and --detector-labels must be given together"
                    .to_string(),
            });
        }
    }

    match (&args.classifier_path, &args.classifier_labels) {
        (Some(path), Some(labels)) => {
            config.models.classifier = Some(ModelConfig {
                path: path.clone(),
                labels: labels.clone(),
            });
        }
        (None, None) => {}
        _ => {
            return Err(Error::ConfigValidation {
                message: "--classifier-path and --classifier-labels must be given together"
                    .to_string(),
            });
        }
    }

    Ok(config)
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // Build filter string based on verbosity level.
    // ORT logging is suppressed by default because CUDA fallback is expected in auto mode.
    // Use -v to see ORT warnings, -vv for info, -vvv for full trace.
    let filter_str = if quiet {
        "warn,ort=off".to_string()
    } else {
        match verbose {
            0 => "info,ort=off".to_string(),
            1 => "debug,ort=warn".to_string(),
            2 => "trace,ort=info".to_string(),
            _ => "trace".to_string(), // -vvv: no ORT filter, full trace
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    fmt().with_env_filter(filter).init();
}

#[allow(clippy::print_stdout)]
fn handle_command(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Config { action } => handle_config_command(action),
        Command::Models { action } => match action {
            cli::ModelsAction::Check => handle_models_check(config),
        },
    }
}

#[allow(clippy::print_stdout)]
fn handle_config_command(action: cli::ConfigAction) -> Result<()> {
    use cli::ConfigAction;

    match action {
        ConfigAction::Init => {
            let path = config_file_path()?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                let config = Config::default();
                let saved_path = save_default_config(&config)?;
                println!("Created configuration file: {}", saved_path.display());
                println!("\nNext steps: set [models.detector] path and labels, then run:");
                println!("  camtrap <images or directories>");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_default_config()?;
            println!("{config:#?}");
            Ok(())
        }
        ConfigAction::Path => {
            let path = config_file_path()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

#[allow(clippy::print_stdout)]
fn handle_models_check(config: &Config) -> Result<()> {
    match &config.models.detector {
        Some(detector) => match validate_model_config("detector", detector) {
            Ok(()) => println!("detector: ok ({})", detector.path.display()),
            Err(e) => println!("detector: FAILED ({e})"),
        },
        None => println!("detector: not configured"),
    }

    match &config.models.classifier {
        Some(classifier) => match validate_model_config("classifier", classifier) {
            Ok(()) => println!("classifier: ok ({})", classifier.path.display()),
            Err(e) => println!("classifier: FAILED ({e})"),
        },
        None => println!("classifier: not configured (detector labels will be used)"),
    }

    Ok(())
}
