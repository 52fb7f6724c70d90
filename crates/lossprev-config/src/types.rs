// Copyright 2025 Loss Prevention Pipelines Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `lossprev_configuration.toml`.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    pub paths: PathsConfig,
    pub render: RenderConfig,
    pub batch: BatchConfig,
    pub run: RunSection,
    pub logging: LoggingConfig,
}

/// Input files and on-disk roots referenced by compiled pipelines
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    pub camera_config: PathBuf,
    pub workload_config: PathBuf,
    pub models_dir: PathBuf,
    pub videos_dir: PathBuf,
    pub device_profiles_dir: PathBuf,
    pub results_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            camera_config: PathBuf::from("configs/camera_to_workload.json"),
            workload_config: PathBuf::from("configs/workload_to_pipeline.json"),
            models_dir: PathBuf::from("/home/pipeline-server/models"),
            videos_dir: PathBuf::from("/home/pipeline-server/sample-media"),
            device_profiles_dir: PathBuf::from("/home/pipeline-server/envs"),
            results_dir: PathBuf::from("/tmp/results"),
        }
    }
}

/// Output branch rendering
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Render-mode toggle: attach a display branch instead of a plain terminal sink
    pub enabled: bool,
    /// Launcher prefix of the aggregated invocation
    pub launcher: String,
    pub display_sink: String,
    pub terminal_sink: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            launcher: "gst-launch-1.0 -e".to_string(),
            display_sink: "autovideosink".to_string(),
            terminal_sink: "fakesink".to_string(),
        }
    }
}

/// Explicit batch-size overrides.
///
/// Kept as raw text: a malformed value is diagnosed by the device profile
/// resolver, which falls back to a batch size of 1.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    pub detect: Option<String>,
    pub classify: Option<String>,
}

/// Per-invocation run parameters
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RunSection {
    /// Run timestamp used in persistence paths (empty = now, UTC)
    pub timestamp: String,
    /// Compile cameras on a worker pool
    pub parallel: bool,
}

impl RunSection {
    /// Resolve the run timestamp, generating one from the current UTC time when unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the configured timestamp cannot be
    /// embedded in a file name.
    pub fn resolved_timestamp(&self) -> ConfigResult<String> {
        let value = self.timestamp.trim();
        if value.is_empty() {
            return Ok(chrono::Utc::now().format("%Y%m%d%H%M%S").to_string());
        }
        if value.contains('/') || value.contains('\\') || value.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidValue(format!(
                "run.timestamp '{}' must not contain path separators or whitespace",
                value
            )));
        }
        Ok(value.to_string())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RunConfig = toml::from_str(
            r#"
            [render]
            enabled = true

            [batch]
            detect = "4"
            "#,
        )
        .unwrap();

        assert!(config.render.enabled);
        assert_eq!(config.render.launcher, "gst-launch-1.0 -e");
        assert_eq!(config.batch.detect.as_deref(), Some("4"));
        assert_eq!(config.batch.classify, None);
        assert_eq!(config.paths.results_dir, PathBuf::from("/tmp/results"));
    }

    #[test]
    fn test_explicit_timestamp_is_kept() {
        let run = RunSection {
            timestamp: " 20250101120000 ".to_string(),
            parallel: false,
        };
        assert_eq!(run.resolved_timestamp().unwrap(), "20250101120000");
    }

    #[test]
    fn test_generated_timestamp_shape() {
        let ts = RunSection::default().resolved_timestamp().unwrap();
        assert_eq!(ts.len(), 14);
        assert!(ts.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_timestamp_with_separator_rejected() {
        let run = RunSection {
            timestamp: "2025/01/01".to_string(),
            parallel: false,
        };
        assert!(matches!(
            run.resolved_timestamp(),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
