// Copyright 2025 Loss Prevention Pipelines Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, RunConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "lossprev_configuration.toml";

/// Find the run configuration file
///
/// Search order:
/// 1. `LOSSPREV_CONFIG_PATH` environment variable
/// 2. Current working directory: `./lossprev_configuration.toml`
/// 3. Parent directories (up to 5 levels)
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("LOSSPREV_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        } else {
            return Err(ConfigError::FileNotFound(format!(
                "Config file specified by LOSSPREV_CONFIG_PATH not found: {}",
                path.display()
            )));
        }
    }

    let mut search_paths = Vec::new();

    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet LOSSPREV_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load the run configuration
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for
///   and the defaults are used when none exists.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if an explicitly requested config file is missing, or if the file
/// contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<RunConfig> {
    let mut config = match config_path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.display().to_string()));
            }
            parse_file(path)?
        }
        None => match find_config_file() {
            Ok(path) => parse_file(&path)?,
            // An explicit LOSSPREV_CONFIG_PATH that does not exist is still an error
            Err(err) if env::var("LOSSPREV_CONFIG_PATH").is_ok() => return Err(err),
            Err(_) => RunConfig::default(),
        },
    };

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

fn parse_file(path: &Path) -> ConfigResult<RunConfig> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `RENDER_MODE` -> `render.enabled`
/// - `BATCH_SIZE_DETECT` -> `batch.detect`
/// - `BATCH_SIZE_CLASSIFY` -> `batch.classify`
/// - `TIMESTAMP` -> `run.timestamp`
/// - `LOSSPREV_CAMERA_CONFIG` -> `paths.camera_config`
/// - `LOSSPREV_WORKLOAD_CONFIG` -> `paths.workload_config`
/// - `LOSSPREV_MODELS_DIR` -> `paths.models_dir`
/// - `LOSSPREV_VIDEOS_DIR` -> `paths.videos_dir`
/// - `LOSSPREV_DEVICE_PROFILES_DIR` -> `paths.device_profiles_dir`
/// - `LOSSPREV_RESULTS_DIR` -> `paths.results_dir`
/// - `LOSSPREV_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(config: &mut RunConfig) {
    if let Ok(value) = env::var("RENDER_MODE") {
        config.render.enabled = is_truthy(&value);
    }

    // Batch sizes stay unparsed here; see BatchConfig
    if let Ok(value) = env::var("BATCH_SIZE_DETECT") {
        config.batch.detect = Some(value);
    }
    if let Ok(value) = env::var("BATCH_SIZE_CLASSIFY") {
        config.batch.classify = Some(value);
    }

    if let Ok(value) = env::var("TIMESTAMP") {
        config.run.timestamp = value;
    }

    if let Ok(value) = env::var("LOSSPREV_CAMERA_CONFIG") {
        config.paths.camera_config = PathBuf::from(value);
    }
    if let Ok(value) = env::var("LOSSPREV_WORKLOAD_CONFIG") {
        config.paths.workload_config = PathBuf::from(value);
    }
    if let Ok(value) = env::var("LOSSPREV_MODELS_DIR") {
        config.paths.models_dir = PathBuf::from(value);
    }
    if let Ok(value) = env::var("LOSSPREV_VIDEOS_DIR") {
        config.paths.videos_dir = PathBuf::from(value);
    }
    if let Ok(value) = env::var("LOSSPREV_DEVICE_PROFILES_DIR") {
        config.paths.device_profiles_dir = PathBuf::from(value);
    }
    if let Ok(value) = env::var("LOSSPREV_RESULTS_DIR") {
        config.paths.results_dir = PathBuf::from(value);
    }

    if let Ok(value) = env::var("LOSSPREV_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"render_mode": "true", "timestamp": "20250101"}`)
pub fn apply_cli_overrides(config: &mut RunConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("render_mode") {
        config.render.enabled = is_truthy(value);
    }
    if let Some(value) = cli_args.get("batch_size_detect") {
        config.batch.detect = Some(value.clone());
    }
    if let Some(value) = cli_args.get("batch_size_classify") {
        config.batch.classify = Some(value.clone());
    }
    if let Some(value) = cli_args.get("timestamp") {
        config.run.timestamp = value.clone();
    }
    if let Some(value) = cli_args.get("parallel") {
        config.run.parallel = is_truthy(value);
    }

    if let Some(value) = cli_args.get("camera_config") {
        config.paths.camera_config = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("workload_config") {
        config.paths.workload_config = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("models_dir") {
        config.paths.models_dir = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("videos_dir") {
        config.paths.videos_dir = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("device_profiles_dir") {
        config.paths.device_profiles_dir = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("results_dir") {
        config.paths.results_dir = PathBuf::from(value);
    }

    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
}
