// Copyright 2025 Loss Prevention Pipelines Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Pipeline Topology Compiler
//!
//! Compiles a declarative description of cameras, their workloads and
//! per-workload stage templates into a minimal set of executable
//! stream-processing graph descriptions.
//!
//! ## Flow
//!
//! ```text
//! CameraSpec + WorkloadMap
//!   └── expander      per-camera stage lists, ROI overlaid, tagged
//!       └── signature dedup by (kind, model, precision, device), first writer wins
//!           └── compiler   source/decode/ROI/queues/instance ids/tee fan-out
//!               │          (consults device_profile + model_paths)
//!               └── render gst-launch text
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lossprev_pipeline::{load_cameras, load_workloads, CompilerOptions, PipelineCompiler};
//!
//! let config = lossprev_config::load_config(None, None).unwrap();
//! let cameras = load_cameras(&config.paths.camera_config).unwrap();
//! let workloads = load_workloads(&config.paths.workload_config).unwrap();
//!
//! let compiler = PipelineCompiler::from_config(&config).unwrap();
//! let report = compiler.compile_all(&cameras, &workloads);
//! for pipeline in &report.pipelines {
//!     println!("{}", lossprev_pipeline::render(pipeline));
//! }
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod compiler;
pub mod device_profile;
pub mod error;
pub mod expander;
pub mod graph;
pub mod inputs;
pub mod model_paths;
pub mod render;
pub mod signature;
pub mod types;

pub use compiler::{CameraFailure, CompileReport, CompilerOptions, PipelineCompiler};
pub use device_profile::{
    BatchOverrides, DeviceProfile, DeviceProfileResolver, EnvFileSource, InMemoryProfileSource,
    ProfileSource,
};
pub use error::{CompileError, Result};
pub use expander::{expand_camera, expand_workload, ExpandedWorkload};
pub use graph::{BranchKind, CompiledPipeline, FanOut, OutputBranch, ResolvedStage, StageParam};
pub use inputs::{load_cameras, load_workloads, parse_cameras, parse_workloads, WorkloadMap};
pub use model_paths::{ModelArtifacts, ModelPathResolver};
pub use render::{render, render_launch_command, render_multiline, render_stage};
pub use signature::{deduplicate_chains, signature, PipelineSignature, UniqueChain};
pub use types::{
    CameraSpec, Roi, SourceLocator, StageKind, StageSpec, StageTemplate, WorkloadTemplate,
};
