//! Help message display for CLI.

#![allow(clippy::print_stdout)]

use crate::config::Config;

/// Print help message based on configuration state.
pub fn print_smart_help(config: &Config) {
    if config.models.detector.is_none() {
        print_first_time_help();
    } else {
        print_configured_help();
    }
}

/// Print detailed setup guide for first-time users.
pub fn print_first_time_help() {
    println!("No detector configured. Get started with camtrap:");
    println!();
    println!("1. Initialize configuration:");
    println!("   camtrap config init");
    println!();
    println!("2. Point it at your detection model (ONNX) and labels file,");
    println!("   either in the config file:");
    println!();
    println!("   [models.detector]");
    println!("   path = \"/path/to/detector.onnx\"");
    println!("   labels = \"/path/to/detector_labels.txt\"");
    println!();
    println!("   or on the command line:");
    println!("   camtrap photos/ --detector-path detector.onnx --detector-labels labels.txt");
    println!();
    println!("3. Optionally add a species classifier under [models.classifier]");
    println!("   to refine detections into species labels.");
    println!();
    println!("4. Analyze camera-trap images:");
    println!("   camtrap photos/");
    println!();
    println!("Run 'camtrap -h' for all options.");
}

/// Print brief usage reminder for configured users.
pub fn print_configured_help() {
    println!("Usage: camtrap [FILES or DIRS]... [OPTIONS]");
    println!();
    println!("Example: camtrap photos/ -f json,csv -o results/");
    println!();
    println!("Run 'camtrap -h' for all options or 'camtrap models check' to verify models.");
}
