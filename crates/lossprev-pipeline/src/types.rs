// Copyright 2025 Loss Prevention Pipelines Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration-facing data model
//!
//! Cameras and workload templates as they arrive from the external JSON
//! configuration, plus the expanded [`StageSpec`] the compiler works on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One discrete processing step kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
    Source,
    Decode,
    RateLimit,
    Convert,
    RegionAttach,
    Detect,
    Classify,
    RawInference,
    ScriptHook,
    Track,
    MetaConvert,
    Publish,
    FpsCount,
    Overlay,
    Queue,
    DisplaySink,
    TerminalSink,
}

impl StageKind {
    const ALL: [StageKind; 17] = [
        StageKind::Source,
        StageKind::Decode,
        StageKind::RateLimit,
        StageKind::Convert,
        StageKind::RegionAttach,
        StageKind::Detect,
        StageKind::Classify,
        StageKind::RawInference,
        StageKind::ScriptHook,
        StageKind::Track,
        StageKind::MetaConvert,
        StageKind::Publish,
        StageKind::FpsCount,
        StageKind::Overlay,
        StageKind::Queue,
        StageKind::DisplaySink,
        StageKind::TerminalSink,
    ];

    /// Canonical kind name
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Source => "source",
            StageKind::Decode => "decode",
            StageKind::RateLimit => "rate-limit",
            StageKind::Convert => "convert",
            StageKind::RegionAttach => "region-attach",
            StageKind::Detect => "detect",
            StageKind::Classify => "classify",
            StageKind::RawInference => "raw-inference",
            StageKind::ScriptHook => "script-hook",
            StageKind::Track => "track",
            StageKind::MetaConvert => "meta-convert",
            StageKind::Publish => "publish",
            StageKind::FpsCount => "fps-count",
            StageKind::Overlay => "overlay",
            StageKind::Queue => "queue",
            StageKind::DisplaySink => "display-sink",
            StageKind::TerminalSink => "terminal-sink",
        }
    }

    /// Default engine element for this kind
    pub fn element(&self) -> &'static str {
        match self {
            StageKind::Source => "filesrc",
            StageKind::Decode => "decodebin",
            StageKind::RateLimit => "videorate",
            StageKind::Convert => "videoconvert",
            StageKind::RegionAttach => "gvaattachroi",
            StageKind::Detect => "gvadetect",
            StageKind::Classify => "gvaclassify",
            StageKind::RawInference => "gvainference",
            StageKind::ScriptHook => "gvapython",
            StageKind::Track => "gvatrack",
            StageKind::MetaConvert => "gvametaconvert",
            StageKind::Publish => "gvametapublish",
            StageKind::FpsCount => "gvafpscounter",
            StageKind::Overlay => "gvawatermark",
            StageKind::Queue => "queue",
            StageKind::DisplaySink => "autovideosink",
            StageKind::TerminalSink => "fakesink",
        }
    }

    /// Parse a template `type` string: either the kind name or the engine element name
    pub fn parse(value: &str) -> Option<StageKind> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value || kind.element() == value)
    }

    /// Kinds a workload template may contain; the rest are placed by the compiler
    pub fn is_template_stage(&self) -> bool {
        matches!(
            self,
            StageKind::RateLimit
                | StageKind::Convert
                | StageKind::Detect
                | StageKind::Classify
                | StageKind::RawInference
                | StageKind::ScriptHook
                | StageKind::Track
                | StageKind::MetaConvert
                | StageKind::Publish
                | StageKind::FpsCount
        )
    }

    /// Kinds carrying per-instance state that need a unique instance identifier
    pub fn is_stateful(&self) -> bool {
        matches!(self, StageKind::Detect | StageKind::Classify | StageKind::Track)
    }

    /// Kinds that can run on an attached region instead of the full frame
    pub fn accepts_region(&self) -> bool {
        matches!(
            self,
            StageKind::Detect | StageKind::Classify | StageKind::RawInference
        )
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Region of interest as a corner pair: identity is the `(x, y, x2, y2)` tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RoiRecord")]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Roi {
    pub fn new(x: u32, y: u32, x2: u32, y2: u32) -> Self {
        Self { x, y, x2, y2 }
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.x2, self.y2)
    }
}

/// Accepted on-disk ROI shapes
#[derive(Deserialize)]
#[serde(untagged)]
enum RoiRecord {
    Corners { x: u32, y: u32, x2: u32, y2: u32 },
    Extent { x: u32, y: u32, width: u32, height: u32 },
}

impl From<RoiRecord> for Roi {
    fn from(record: RoiRecord) -> Self {
        match record {
            RoiRecord::Corners { x, y, x2, y2 } => Roi { x, y, x2, y2 },
            RoiRecord::Extent {
                x,
                y,
                width,
                height,
            } => Roi {
                x,
                y,
                x2: x.saturating_add(width),
                y2: y.saturating_add(height),
            },
        }
    }
}

/// Camera source locator: `name|origin`
///
/// `name` is what the pipeline reads (a media file name, an `rtsp://` URL or a
/// `/dev/video*` node); `origin` is where provisioning fetches the media from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceLocator {
    pub name: String,
    pub origin: String,
}

impl FromStr for SourceLocator {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let (name, origin) = value.split_once('|').unwrap_or((value, ""));
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("source locator '{}' has an empty name", value));
        }
        Ok(SourceLocator {
            name: name.to_string(),
            origin: origin.trim().to_string(),
        })
    }
}

impl TryFrom<String> for SourceLocator {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SourceLocator> for String {
    fn from(locator: SourceLocator) -> Self {
        if locator.origin.is_empty() {
            locator.name
        } else {
            format!("{}|{}", locator.name, locator.origin)
        }
    }
}

/// A camera record from the lane configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSpec {
    pub camera_id: String,
    #[serde(rename = "fileSrc")]
    pub source: SourceLocator,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub fps: Option<u32>,
    #[serde(default, rename = "region_of_interest")]
    pub roi: Option<Roi>,
    #[serde(default)]
    pub workloads: Vec<String>,
}

/// One entry of a workload's stage template, as written in the workload map
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageTemplate {
    #[serde(rename = "type")]
    pub stage_type: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub device: String,
    #[serde(default)]
    pub precision: String,
    #[serde(default, rename = "region_of_interest")]
    pub roi: Option<Roi>,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub function: Option<String>,
}

/// A named workload and its ordered stage template
#[derive(Debug, Clone)]
pub struct WorkloadTemplate {
    pub name: String,
    pub stages: Vec<StageTemplate>,
}

/// Expanded stage specification
///
/// `camera_id` and `workload` are naming metadata only; they never take part
/// in the chain signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    pub kind: StageKind,
    pub model: String,
    pub precision: String,
    pub device: String,
    pub roi: Option<Roi>,
    pub module: Option<String>,
    pub function: Option<String>,
    pub camera_id: Option<String>,
    pub workload: Option<String>,
}

impl StageSpec {
    /// Normalized spec from a template entry (model trimmed, device/precision upper-cased)
    pub fn from_template(kind: StageKind, template: &StageTemplate) -> Self {
        Self {
            kind,
            model: template.model.trim().to_string(),
            precision: template.precision.trim().to_ascii_uppercase(),
            device: template.device.trim().to_ascii_uppercase(),
            roi: template.roi,
            module: template.module.clone(),
            function: template.function.clone(),
            camera_id: None,
            workload: None,
        }
    }

    /// Shorthand used by tests and programmatic callers
    pub fn new(kind: StageKind, model: &str, precision: &str, device: &str) -> Self {
        Self {
            kind,
            model: model.to_string(),
            precision: precision.to_string(),
            device: device.to_string(),
            roi: None,
            module: None,
            function: None,
            camera_id: None,
            workload: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_kind_parse_accepts_both_vocabularies() {
        assert_eq!(StageKind::parse("gvadetect"), Some(StageKind::Detect));
        assert_eq!(StageKind::parse("detect"), Some(StageKind::Detect));
        assert_eq!(StageKind::parse(" GVAPython "), Some(StageKind::ScriptHook));
        assert_eq!(StageKind::parse("rate-limit"), Some(StageKind::RateLimit));
        assert_eq!(StageKind::parse("gvaunknown"), None);
    }

    #[test]
    fn test_structural_kinds_are_not_template_stages() {
        for kind in [
            StageKind::Source,
            StageKind::Decode,
            StageKind::RegionAttach,
            StageKind::Queue,
            StageKind::DisplaySink,
            StageKind::TerminalSink,
            StageKind::Overlay,
        ] {
            assert!(!kind.is_template_stage(), "{} is compiler-owned", kind);
        }
        assert!(StageKind::Detect.is_template_stage());
    }

    #[test]
    fn test_roi_shapes() {
        let corners: Roi = serde_json::from_str(r#"{"x":1,"y":2,"x2":30,"y2":40}"#).unwrap();
        assert_eq!(corners, Roi::new(1, 2, 30, 40));

        let extent: Roi =
            serde_json::from_str(r#"{"x":10,"y":20,"width":100,"height":50}"#).unwrap();
        assert_eq!(extent, Roi::new(10, 20, 110, 70));
        assert_eq!(extent.to_string(), "10,20,110,70");
    }

    #[test]
    fn test_source_locator_split() {
        let locator: SourceLocator = "lane1.mp4 | https://example.com/lane1.mp4".parse().unwrap();
        assert_eq!(locator.name, "lane1.mp4");
        assert_eq!(locator.origin, "https://example.com/lane1.mp4");

        let bare: SourceLocator = "rtsp://cam/stream".parse().unwrap();
        assert_eq!(bare.origin, "");

        assert!("|http://x".parse::<SourceLocator>().is_err());
    }

    #[test]
    fn test_camera_record() {
        let camera: CameraSpec = serde_json::from_str(
            r#"{
                "camera_id": "c1",
                "fileSrc": "lane1.mp4|http://x",
                "fps": 15,
                "region_of_interest": {"x": 0, "y": 0, "x2": 100, "y2": 100},
                "workloads": ["theft_detect"]
            }"#,
        )
        .unwrap();
        assert_eq!(camera.source.name, "lane1.mp4");
        assert_eq!(camera.fps, Some(15));
        assert_eq!(camera.width, None);
        assert_eq!(camera.roi, Some(Roi::new(0, 0, 100, 100)));
    }

    #[test]
    fn test_spec_from_template_normalizes() {
        let template = StageTemplate {
            stage_type: "gvadetect".to_string(),
            model: " yolo11n ".to_string(),
            device: "gpu".to_string(),
            precision: "int8".to_string(),
            ..Default::default()
        };
        let spec = StageSpec::from_template(StageKind::Detect, &template);
        assert_eq!(spec.model, "yolo11n");
        assert_eq!(spec.device, "GPU");
        assert_eq!(spec.precision, "INT8");
    }
}
