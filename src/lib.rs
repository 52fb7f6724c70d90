// Copyright 2025 Loss Prevention Pipelines Contributors
// SPDX-License-Identifier: Apache-2.0

//! # lossprev - Multi-Camera Loss-Prevention Pipeline Compiler
//!
//! Compiles cameras, their assigned workloads and per-workload stage templates
//! into a minimal set of gst-launch pipeline descriptions: structurally
//! identical chains are compiled once per camera, stateful stages get
//! collision-free instance ids, and every chain fans out to persistence and
//! display/terminal sinks.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lossprev::prelude::*;
//!
//! let config = load_config(None, None)?;
//! let cameras = load_cameras(&config.paths.camera_config)?;
//! let workloads = load_workloads(&config.paths.workload_config)?;
//!
//! let compiler = PipelineCompiler::from_config(&config)?;
//! let report = compiler.compile_all(&cameras, &workloads);
//! println!("{}", render_launch_command(&config.render.launcher, &report.pipelines));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: lossprev-config                            │
//! │  (TOML run config, env + CLI overrides)                 │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Compiler: lossprev-pipeline                            │
//! │  (expand, dedup, compile, render)                       │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Tool: pipeline-gen (tools/pipeline_gen.rs)             │
//! │  (logging via lossprev-observability)                   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Feature Flags
//!
//! - **`file-logging`**: JSON log file per run via `tracing-appender`
//!
//! ## License
//!
//! Apache-2.0

pub use lossprev_config as config;
pub use lossprev_observability as observability;
pub use lossprev_pipeline as pipeline;

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::config::{load_config, RunConfig};
    pub use crate::observability::{init_logging, parse_debug_flags, CrateDebugFlags};
    pub use crate::pipeline::{
        load_cameras, load_workloads, render, render_launch_command, render_multiline,
        CompileError, CompileReport, CompiledPipeline, PipelineCompiler,
    };
}
