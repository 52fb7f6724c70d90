// Copyright 2025 Loss Prevention Pipelines Contributors
// SPDX-License-Identifier: Apache-2.0

//! Stage spec expansion: camera workloads -> tagged stage lists

use tracing::warn;

use crate::error::{CompileError, Result};
use crate::inputs::{normalize_name, WorkloadMap};
use crate::types::{CameraSpec, StageKind, StageSpec};

/// One workload of one camera, expanded into stage specs
#[derive(Debug, Clone)]
pub struct ExpandedWorkload {
    pub name: String,
    pub stages: Vec<StageSpec>,
}

/// Expand a single workload for `camera`
///
/// Template stages are copied in order; the camera ROI (if any) replaces the
/// stage ROI on every region-accepting stage; each stage is tagged with the
/// camera id and workload name.
pub fn expand_workload(
    camera: &CameraSpec,
    workload: &str,
    workloads: &WorkloadMap,
) -> Result<ExpandedWorkload> {
    let name = normalize_name(workload);
    let templates = workloads
        .get(&name)
        .ok_or_else(|| CompileError::UnknownWorkload {
            camera_id: camera.camera_id.clone(),
            workload: name.clone(),
        })?;

    let mut stages = Vec::with_capacity(templates.len());
    for template in templates {
        let kind = StageKind::parse(&template.stage_type).ok_or_else(|| {
            CompileError::UnsupportedStageKind {
                camera_id: camera.camera_id.clone(),
                workload: name.clone(),
                kind: template.stage_type.clone(),
            }
        })?;

        let mut spec = StageSpec::from_template(kind, template);
        if kind.accepts_region() {
            if let Some(roi) = camera.roi {
                spec.roi = Some(roi);
            }
        }
        spec.camera_id = Some(camera.camera_id.clone());
        spec.workload = Some(name.clone());
        stages.push(spec);
    }

    Ok(ExpandedWorkload { name, stages })
}

/// Expand every workload assigned to `camera`, in assignment order
///
/// Unknown workloads and empty templates are skipped with a warning.
/// Unrecognized stage types abort the camera.
pub fn expand_camera(camera: &CameraSpec, workloads: &WorkloadMap) -> Result<Vec<ExpandedWorkload>> {
    let mut expanded = Vec::with_capacity(camera.workloads.len());
    for workload in &camera.workloads {
        match expand_workload(camera, workload, workloads) {
            Ok(chain) if chain.stages.is_empty() => {
                warn!(
                    "Workload '{}' of camera '{}' has an empty stage template; skipping",
                    chain.name, camera.camera_id
                );
            }
            Ok(chain) => expanded.push(chain),
            Err(e) if e.is_recoverable() => warn!("{}; skipping", e),
            Err(e) => return Err(e),
        }
    }
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::parse_workloads;
    use crate::types::Roi;

    fn camera(workloads: &[&str], roi: Option<Roi>) -> CameraSpec {
        CameraSpec {
            camera_id: "c1".to_string(),
            source: "lane1.mp4".parse().unwrap(),
            width: None,
            height: None,
            fps: None,
            roi,
            workloads: workloads.iter().map(|w| w.to_string()).collect(),
        }
    }

    fn workloads() -> WorkloadMap {
        parse_workloads(
            "inline",
            r#"{
                "detect_classify": [
                    {"type": "gvadetect", "model": "m1", "device": "CPU", "precision": "FP16",
                     "region_of_interest": {"x": 1, "y": 1, "x2": 2, "y2": 2}},
                    {"type": "gvapython", "module": "hooks/theft.py", "function": "process"},
                    {"type": "gvaclassify", "model": "m2", "device": "cpu", "precision": "fp16"}
                ],
                "empty": [],
                "bad": [{"type": "gvaspaceship"}]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_expansion_tags_and_overlays() {
        let roi = Roi::new(0, 0, 100, 100);
        let chains = expand_camera(&camera(&["Detect_Classify"], Some(roi)), &workloads()).unwrap();
        assert_eq!(chains.len(), 1);

        let stages = &chains[0].stages;
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[0].roi, Some(roi));
        assert_eq!(stages[1].roi, None, "script hooks do not accept a region");
        assert_eq!(stages[2].roi, Some(roi));
        assert_eq!(stages[2].device, "CPU");
        assert!(stages
            .iter()
            .all(|s| s.camera_id.as_deref() == Some("c1")
                && s.workload.as_deref() == Some("detect_classify")));
    }

    #[test]
    fn test_template_roi_kept_without_camera_roi() {
        let chains = expand_camera(&camera(&["detect_classify"], None), &workloads()).unwrap();
        assert_eq!(chains[0].stages[0].roi, Some(Roi::new(1, 1, 2, 2)));
    }

    #[test]
    fn test_unknown_and_empty_workloads_are_skipped() {
        let chains = expand_camera(
            &camera(&["missing", "empty", "detect_classify"], None),
            &workloads(),
        )
        .unwrap();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].name, "detect_classify");
    }

    #[test]
    fn test_unknown_workload_error() {
        let err = expand_workload(&camera(&[], None), "missing", &workloads()).unwrap_err();
        assert!(matches!(err, CompileError::UnknownWorkload { .. }));
    }

    #[test]
    fn test_unrecognized_stage_is_fatal() {
        let err = expand_camera(&camera(&["detect_classify", "bad"], None), &workloads()).unwrap_err();
        assert!(err.is_camera_fatal());
    }
}
