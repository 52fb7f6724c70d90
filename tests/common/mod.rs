//! Common test utilities and helpers

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// On-disk deployment layout for one end-to-end run
pub struct Deployment {
    pub dir: TempDir,
}

impl Deployment {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        fs::create_dir_all(dir.path().join("envs")).expect("Failed to create profile dir");
        Self { dir }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).expect("Failed to write fixture");
        path
    }

    /// Run configuration pointing every path into this deployment
    pub fn write_run_config(&self, render_enabled: bool) -> PathBuf {
        let root = self.dir.path();
        let content = format!(
            r#"
[paths]
camera_config = "{cameras}"
workload_config = "{workloads}"
models_dir = "/models"
videos_dir = "/media"
device_profiles_dir = "{envs}"
results_dir = "/results"

[render]
enabled = {render_enabled}

[run]
timestamp = "20250102030405"
"#,
            cameras = toml_path(&root.join("cameras.json")),
            workloads = toml_path(&root.join("workloads.json")),
            envs = toml_path(&root.join("envs")),
        );
        self.write("lossprev_configuration.toml", &content)
    }
}

fn toml_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

pub const CAMERAS: &str = r#"{
    "lane_config": {
        "cameras": [
            {
                "camera_id": "c1",
                "fileSrc": "lane1.mp4|https://example.com/lane1.mp4",
                "width": 1920,
                "fps": 15,
                "workloads": ["theft_detect", "Theft_Detect_V2"]
            },
            {
                "camera_id": "c2",
                "fileSrc": "rtsp://10.0.0.2/stream",
                "region_of_interest": {"x": 10, "y": 20, "width": 100, "height": 50},
                "workloads": ["shelf_scan"]
            },
            {
                "camera_id": "c3",
                "fileSrc": "lane3.mp4|",
                "workloads": ["unknown_only"]
            }
        ]
    }
}"#;

pub const WORKLOADS: &str = r#"{
    "workload_pipeline_map": {
        "theft_detect": [
            {"type": "gvadetect", "model": "yolo11n", "device": "CPU", "precision": "INT8"},
            {"type": "gvaclassify", "model": "efficientnet-b0", "device": "CPU", "precision": "INT8"}
        ],
        "theft_detect_v2": [
            {"type": "gvadetect", "model": "yolo11n", "device": "CPU", "precision": "INT8"},
            {"type": "gvaclassify", "model": "efficientnet-b0", "device": "CPU", "precision": "INT8"}
        ],
        "shelf_scan": [
            {"type": "gvadetect", "model": "yolo11n", "device": "GPU", "precision": "INT8"},
            {"type": "gvapython", "module": "/hooks/shelf.py", "function": "process_frame"}
        ]
    }
}"#;
