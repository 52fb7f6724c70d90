// Copyright 2025 Loss Prevention Pipelines Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-device override profiles
//!
//! A profile is a key/value overlay (decode element, pre/post-process
//! expressions, batch sizes) keyed by device class. Profiles are an
//! optimization: a missing or unreadable source resolves to the default
//! profile with a diagnostic, never to an error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::CompileError;

const KEY_DECODE: &str = "DECODE";
const KEY_PRE_PROCESS: &str = "PRE_PROCESS";
const KEY_DETECTION_OPTIONS: &str = "DETECTION_OPTIONS";
const KEY_PRE_PROCESS_CONFIG: &str = "PRE_PROCESS_CONFIG";
const KEY_CLASSIFICATION_PRE_PROCESS: &str = "CLASSIFICATION_PRE_PROCESS";
const KEY_BATCH_SIZE_DETECT: &str = "BATCH_SIZE_DETECT";
const KEY_BATCH_SIZE_CLASSIFY: &str = "BATCH_SIZE_CLASSIFY";

/// Resolved overlay values for one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    pub decode_override: Option<String>,
    pub pre_process_expr: String,
    pub detection_options_expr: String,
    pub pre_process_config_path: String,
    pub classification_pre_process_expr: String,
    pub batch_size_detect: u32,
    pub batch_size_classify: u32,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            decode_override: None,
            pre_process_expr: String::new(),
            detection_options_expr: String::new(),
            pre_process_config_path: String::new(),
            classification_pre_process_expr: String::new(),
            batch_size_detect: 1,
            batch_size_classify: 1,
        }
    }
}

/// Source of raw key/value profile entries
pub trait ProfileSource: Send + Sync {
    /// Raw entries for a device. `Ok(None)` when no profile exists for it.
    fn load(&self, device: &str) -> std::io::Result<Option<HashMap<String, String>>>;
}

/// Profiles stored as `{dir}/{device}.env` files (device lower-cased)
#[derive(Debug, Clone)]
pub struct EnvFileSource {
    dir: PathBuf,
}

impl EnvFileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, device: &str) -> PathBuf {
        self.dir.join(format!("{}.env", device.to_lowercase()))
    }
}

impl ProfileSource for EnvFileSource {
    fn load(&self, device: &str) -> std::io::Result<Option<HashMap<String, String>>> {
        let path = self.path_for(device);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(parse_env_file(&content))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Fixed profiles held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfileSource {
    profiles: HashMap<String, HashMap<String, String>>,
}

impl InMemoryProfileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, device: &str, key: &str, value: &str) -> Self {
        self.profiles
            .entry(device.to_uppercase())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self
    }
}

impl ProfileSource for InMemoryProfileSource {
    fn load(&self, device: &str) -> std::io::Result<Option<HashMap<String, String>>> {
        Ok(self.profiles.get(&device.to_uppercase()).cloned())
    }
}

/// Parse `KEY=VALUE` lines; blank lines, `#` comments and an `export ` prefix are tolerated
pub fn parse_env_file(content: &str) -> HashMap<String, String> {
    let mut entries = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        entries.insert(key.trim().to_string(), unquote(value.trim()).to_string());
    }
    entries
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Explicit batch-size overrides (environment or CLI level), kept raw until resolution
#[derive(Debug, Clone, Default)]
pub struct BatchOverrides {
    pub detect: Option<String>,
    pub classify: Option<String>,
}

/// Device profile lookup with a per-run cache
///
/// Each device's source is read at most once per resolver.
pub struct DeviceProfileResolver {
    source: Box<dyn ProfileSource>,
    overrides: BatchOverrides,
    cache: RwLock<AHashMap<String, DeviceProfile>>,
}

impl DeviceProfileResolver {
    pub fn new(source: Box<dyn ProfileSource>, overrides: BatchOverrides) -> Self {
        Self {
            source,
            overrides,
            cache: RwLock::new(AHashMap::new()),
        }
    }

    /// Resolver over `.env` files in `dir`
    pub fn from_dir(dir: &Path, overrides: BatchOverrides) -> Self {
        Self::new(Box::new(EnvFileSource::new(dir)), overrides)
    }

    /// Resolve the profile for `device`
    pub fn resolve(&self, device: &str) -> DeviceProfile {
        let device = device.trim().to_uppercase();
        if let Some(profile) = self.cache.read().get(&device) {
            return profile.clone();
        }

        // Built under the write lock: concurrent misses for one device read it once
        let mut cache = self.cache.write();
        cache
            .entry(device)
            .or_insert_with_key(|device| self.build(device))
            .clone()
    }

    fn build(&self, device: &str) -> DeviceProfile {
        let entries = if device.is_empty() {
            HashMap::new()
        } else {
            match self.source.load(device) {
                Ok(Some(entries)) => entries,
                Ok(None) => {
                    debug!("No device profile for {}, using defaults", device);
                    HashMap::new()
                }
                Err(e) => {
                    warn!("Unreadable device profile for {}: {}; using defaults", device, e);
                    HashMap::new()
                }
            }
        };

        let text = |key: &str| entries.get(key).cloned().unwrap_or_default();
        DeviceProfile {
            decode_override: entries
                .get(KEY_DECODE)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            pre_process_expr: text(KEY_PRE_PROCESS),
            detection_options_expr: text(KEY_DETECTION_OPTIONS),
            pre_process_config_path: text(KEY_PRE_PROCESS_CONFIG),
            classification_pre_process_expr: text(KEY_CLASSIFICATION_PRE_PROCESS),
            batch_size_detect: batch_size(
                KEY_BATCH_SIZE_DETECT,
                self.overrides.detect.as_deref(),
                entries.get(KEY_BATCH_SIZE_DETECT).map(String::as_str),
            ),
            batch_size_classify: batch_size(
                KEY_BATCH_SIZE_CLASSIFY,
                self.overrides.classify.as_deref(),
                entries.get(KEY_BATCH_SIZE_CLASSIFY).map(String::as_str),
            ),
        }
    }
}

/// Override beats profile beats 1; a malformed value warns and yields 1
fn batch_size(field: &str, override_value: Option<&str>, profile_value: Option<&str>) -> u32 {
    let raw = match override_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => value,
        None => match profile_value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => value,
            None => return 1,
        },
    };

    match raw.parse::<u32>() {
        Ok(size) if size > 0 => size,
        _ => {
            let err = CompileError::InvalidOverrideValue {
                field: field.to_string(),
                value: raw.to_string(),
            };
            warn!("{}; falling back to batch size 1", err);
            1
        }
    }
}
