// Copyright 2025 Loss Prevention Pipelines Contributors
// SPDX-License-Identifier: Apache-2.0

//! Camera and workload configuration loading
//!
//! Both documents come either wrapped (`lane_config.cameras`,
//! `workload_pipeline_map`) or bare.

use std::path::Path;

use ahash::AHashMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{CompileError, Result};
use crate::types::{CameraSpec, StageTemplate, WorkloadTemplate};

/// Workload name -> stage template, keys lower-cased
#[derive(Debug, Clone, Default)]
pub struct WorkloadMap {
    templates: AHashMap<String, Vec<StageTemplate>>,
}

impl WorkloadMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a template (name matched case-insensitively), returning the replaced one
    pub fn insert(&mut self, name: &str, stages: Vec<StageTemplate>) -> Option<Vec<StageTemplate>> {
        self.templates.insert(normalize_name(name), stages)
    }

    /// Look up a template by workload name
    pub fn get(&self, name: &str) -> Option<&[StageTemplate]> {
        self.templates.get(&normalize_name(name)).map(Vec::as_slice)
    }

    pub fn template(&self, name: &str) -> Option<WorkloadTemplate> {
        self.get(name).map(|stages| WorkloadTemplate {
            name: normalize_name(name),
            stages: stages.to_vec(),
        })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CameraDocument {
    Wrapped { lane_config: LaneConfig },
    Bare(Vec<CameraSpec>),
}

#[derive(Deserialize)]
struct LaneConfig {
    cameras: Vec<CameraSpec>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WorkloadDocument {
    Wrapped {
        workload_pipeline_map: AHashMap<String, Vec<StageTemplate>>,
    },
    Bare(AHashMap<String, Vec<StageTemplate>>),
}

fn parse_document<T: DeserializeOwned>(origin: &str, content: &str) -> Result<T> {
    serde_json::from_str(content).map_err(|e| CompileError::ConfigParseError {
        path: origin.to_string(),
        reason: e.to_string(),
    })
}

fn read_document(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(CompileError::ConfigNotFound(path.display().to_string()));
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Parse camera records from JSON text; `origin` names the source in errors
pub fn parse_cameras(origin: &str, content: &str) -> Result<Vec<CameraSpec>> {
    let cameras = match parse_document::<CameraDocument>(origin, content)? {
        CameraDocument::Wrapped { lane_config } => lane_config.cameras,
        CameraDocument::Bare(cameras) => cameras,
    };
    debug!("Parsed {} camera(s) from {}", cameras.len(), origin);
    Ok(cameras)
}

/// Parse the workload -> stage template map from JSON text
pub fn parse_workloads(origin: &str, content: &str) -> Result<WorkloadMap> {
    let raw = match parse_document::<WorkloadDocument>(origin, content)? {
        WorkloadDocument::Wrapped {
            workload_pipeline_map,
        } => workload_pipeline_map,
        WorkloadDocument::Bare(map) => map,
    };

    // Sorted so that case-colliding names resolve the same way on every run
    let mut entries: Vec<(String, Vec<StageTemplate>)> = raw.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut map = WorkloadMap::new();
    for (name, stages) in entries {
        if map.insert(&name, stages).is_some() {
            warn!(
                "Workload '{}' in {} collides with another name differing only in case; '{}' wins",
                normalize_name(&name),
                origin,
                name
            );
        }
    }
    debug!("Parsed {} workload template(s) from {}", map.len(), origin);
    Ok(map)
}

/// Load the camera configuration file
pub fn load_cameras(path: &Path) -> Result<Vec<CameraSpec>> {
    let content = read_document(path)?;
    let cameras = parse_cameras(&path.display().to_string(), &content)?;
    info!("Loaded {} camera(s) from {}", cameras.len(), path.display());
    Ok(cameras)
}

/// Load the workload-to-pipeline map file
pub fn load_workloads(path: &Path) -> Result<WorkloadMap> {
    let content = read_document(path)?;
    let map = parse_workloads(&path.display().to_string(), &content)?;
    info!("Loaded {} workload template(s) from {}", map.len(), path.display());
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_and_bare_cameras() {
        let wrapped = r#"{"lane_config": {"cameras": [
            {"camera_id": "c1", "fileSrc": "a.mp4|http://x", "workloads": ["w"]}
        ]}}"#;
        let bare = r#"[{"camera_id": "c1", "fileSrc": "a.mp4", "workloads": ["w"]}]"#;

        let a = parse_cameras("wrapped", wrapped).unwrap();
        let b = parse_cameras("bare", bare).unwrap();
        assert_eq!(a[0].camera_id, b[0].camera_id);
        assert_eq!(a[0].source.name, "a.mp4");
        assert_eq!(b[0].source.origin, "");
    }

    #[test]
    fn test_workload_names_case_insensitive() {
        let content = r#"{"workload_pipeline_map": {
            "Theft_Detect": [{"type": "gvadetect", "model": "m1", "device": "CPU", "precision": "FP16"}]
        }}"#;
        let map = parse_workloads("inline", content).unwrap();
        assert!(map.get("theft_detect").is_some());
        assert!(map.get("THEFT_DETECT").is_some());
        assert_eq!(map.template("Theft_Detect").unwrap().name, "theft_detect");
    }

    #[test]
    fn test_case_colliding_names_resolve_deterministically() {
        let content = r#"{
            "theft": [{"type": "gvadetect", "model": "lower", "device": "CPU", "precision": "FP16"}],
            "Theft": [{"type": "gvadetect", "model": "upper", "device": "CPU", "precision": "FP16"}]
        }"#;
        for _ in 0..8 {
            let map = parse_workloads("inline", content).unwrap();
            assert_eq!(map.len(), 1);
            assert_eq!(map.get("theft").unwrap()[0].model, "lower");
        }
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = parse_cameras("broken.json", "{not json").unwrap_err();
        assert!(matches!(err, CompileError::ConfigParseError { ref path, .. } if path == "broken.json"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_cameras(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CompileError::ConfigNotFound(_)));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workloads.json");
        std::fs::write(
            &path,
            r#"{"w": [{"type": "gvaclassify", "model": "m2", "device": "GPU", "precision": "FP16"}]}"#,
        )
        .unwrap();
        let map = load_workloads(&path).unwrap();
        assert_eq!(map.get("w").unwrap()[0].model, "m2");
    }
}
