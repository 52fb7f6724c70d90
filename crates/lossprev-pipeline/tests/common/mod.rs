//! Common test utilities and helpers

#![allow(dead_code)]

use std::path::PathBuf;

use lossprev_pipeline::{
    parse_cameras, parse_workloads, BatchOverrides, CameraSpec, CompilerOptions,
    DeviceProfileResolver, InMemoryProfileSource, ModelPathResolver, PipelineCompiler, WorkloadMap,
};

/// Workload map used across the integration tests
pub const WORKLOADS: &str = r#"{
    "workload_pipeline_map": {
        "theft_detect": [
            {"type": "gvadetect", "model": "m1", "device": "CPU", "precision": "FP16"},
            {"type": "gvaclassify", "model": "m2", "device": "CPU", "precision": "FP16"}
        ],
        "theft_detect_v2": [
            {"type": "gvadetect", "model": "m1", "device": "CPU", "precision": "FP16"},
            {"type": "gvaclassify", "model": "m2", "device": "CPU", "precision": "FP16"}
        ],
        "shelf_roi": [
            {"type": "gvadetect", "model": "m1", "device": "CPU", "precision": "FP16",
             "region_of_interest": {"x": 0, "y": 0, "x2": 100, "y2": 100}},
            {"type": "gvaclassify", "model": "m2", "device": "CPU", "precision": "FP16",
             "region_of_interest": {"x": 0, "y": 0, "x2": 100, "y2": 100}}
        ],
        "age_gender": [
            {"type": "gvadetect", "model": "face", "device": "GPU", "precision": "INT8"},
            {"type": "gvaclassify", "model": "age", "device": "GPU", "precision": "INT8"}
        ],
        "scripted": [
            {"type": "gvadetect", "model": "m1", "device": "CPU", "precision": "FP16"},
            {"type": "gvapython", "module": "/hooks/checkout.py", "function": "process_frame"}
        ],
        "broken": [
            {"type": "gvateleport", "model": "x", "device": "CPU", "precision": "FP16"}
        ]
    }
}"#;

pub fn workloads() -> WorkloadMap {
    parse_workloads("common", WORKLOADS).expect("Failed to parse workload fixture")
}

pub fn camera(id: &str, workloads: &[&str]) -> CameraSpec {
    let content = serde_json::json!([{
        "camera_id": id,
        "fileSrc": format!("{}.mp4|https://example.com/{}.mp4", id, id),
        "fps": 15,
        "workloads": workloads,
    }])
    .to_string();
    parse_cameras("common", &content)
        .expect("Failed to parse camera fixture")
        .remove(0)
}

pub fn options(render_enabled: bool) -> CompilerOptions {
    CompilerOptions {
        render_enabled,
        display_sink: "autovideosink".to_string(),
        terminal_sink: "fakesink".to_string(),
        results_dir: PathBuf::from("/tmp/results"),
        videos_dir: PathBuf::from("/home/pipeline-server/sample-media"),
        timestamp: "20250101120000".to_string(),
        parallel: false,
    }
}

pub fn compiler_with(options: CompilerOptions) -> PipelineCompiler {
    let profiles = InMemoryProfileSource::new()
        .with_entry("GPU", "DECODE", "vah264dec")
        .with_entry("GPU", "PRE_PROCESS", "pre-process-backend=va-surface-sharing");
    PipelineCompiler::new(
        options,
        DeviceProfileResolver::new(Box::new(profiles), BatchOverrides::default()),
        ModelPathResolver::new("/home/pipeline-server/models"),
    )
}

pub fn compiler(render_enabled: bool) -> PipelineCompiler {
    compiler_with(options(render_enabled))
}
