// Copyright 2025 Loss Prevention Pipelines Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pipeline generator
//!
//! Reads the camera and workload configuration, compiles every camera and
//! prints the result on stdout. Diagnostics, including one error line per
//! withheld camera, go to stderr.
//!
//! Exit status: 0 when at least one pipeline compiled, 2 when none did,
//! 1 on unreadable input.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use lossprev::config::load_config;
use lossprev::observability::{init_logging, parse_debug_flags};
use lossprev::pipeline::{
    load_cameras, load_workloads, render, render_launch_command, render_multiline,
    PipelineCompiler,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One launcher invocation holding every pipeline
    Launch,
    /// One single-line pipeline per line
    Chains,
    /// Each pipeline one element per line, blank line between pipelines
    Multiline,
}

/// Compile multi-camera loss-prevention pipelines into gst-launch descriptions
#[derive(Parser, Debug)]
#[command(name = "pipeline-gen", version, about, long_about = None)]
struct Args {
    /// Run configuration file (default: discover lossprev_configuration.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera-to-workload JSON
    #[arg(long)]
    camera_config: Option<PathBuf>,

    /// Workload-to-pipeline JSON
    #[arg(long)]
    workload_config: Option<PathBuf>,

    /// Display branch instead of plain terminal sink
    #[arg(long)]
    render_mode: Option<bool>,

    /// Run timestamp used in result file names
    #[arg(long)]
    timestamp: Option<String>,

    /// Compile cameras in parallel
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Launch)]
    format: OutputFormat,

    /// Enable debug logging per crate (comma-separated, or "all")
    #[arg(long, value_delimiter = ',')]
    debug: Vec<String>,
}

impl Args {
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(path) = &self.camera_config {
            overrides.insert("camera_config".to_string(), path.display().to_string());
        }
        if let Some(path) = &self.workload_config {
            overrides.insert("workload_config".to_string(), path.display().to_string());
        }
        if let Some(enabled) = self.render_mode {
            overrides.insert("render_mode".to_string(), enabled.to_string());
        }
        if let Some(timestamp) = &self.timestamp {
            overrides.insert("timestamp".to_string(), timestamp.clone());
        }
        if self.parallel {
            overrides.insert("parallel".to_string(), "true".to_string());
        }
        overrides
    }
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("pipeline-gen: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let config = load_config(args.config.as_deref(), Some(&args.overrides()))
        .context("Failed to load run configuration")?;

    let debug_flags = parse_debug_flags(&args.debug);
    let _logging = init_logging(&debug_flags, &config.logging.level, config.logging.log_dir.clone())?;

    let cameras = load_cameras(&config.paths.camera_config)?;
    let workloads = load_workloads(&config.paths.workload_config)?;
    info!(
        "Compiling {} camera(s) against {} workload template(s)",
        cameras.len(),
        workloads.len()
    );

    let compiler = PipelineCompiler::from_config(&config)?;
    let report = compiler.compile_all(&cameras, &workloads);

    if report.is_empty() {
        warn!("No pipeline compiled for any camera");
        return Ok(ExitCode::from(2));
    }

    match args.format {
        OutputFormat::Launch => {
            println!("{}", render_launch_command(&config.render.launcher, &report.pipelines));
        }
        OutputFormat::Chains => {
            for pipeline in &report.pipelines {
                println!("{}", render(pipeline));
            }
        }
        OutputFormat::Multiline => {
            let blocks: Vec<String> = report.pipelines.iter().map(render_multiline).collect();
            println!("{}", blocks.join("\n\n"));
        }
    }

    Ok(ExitCode::SUCCESS)
}
