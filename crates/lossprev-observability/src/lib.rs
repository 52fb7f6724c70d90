// Copyright 2025 Loss Prevention Pipelines Contributors
// SPDX-License-Identifier: Apache-2.0

//! # lossprev-observability
//!
//! Logging infrastructure shared by the pipeline compiler crates, with
//! per-crate debug flag support.
//!
//! ## Features
//! - `file-logging`: JSON log files in a timestamped run folder (desktop only)

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use init::*;

/// Known crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "lossprev",
    "lossprev-config",
    "lossprev-pipeline",
    "pipeline-gen",
];
