// Copyright 2025 Loss Prevention Pipelines Contributors
// SPDX-License-Identifier: Apache-2.0

//! Model artifact path construction
//!
//! Layout under the models root:
//! ```text
//! object_detection/<model>/<precision>/<model>.xml
//! object_classification/<model>/<precision>/<model>.xml  (+ .txt labels, .json pre-process)
//! <model>                                                 (any other kind)
//! ```
//! Paths are built, never checked: provisioning owns existence.

use std::path::{Path, PathBuf};

use crate::types::StageKind;

const DETECTION_TREE: &str = "object_detection";
const CLASSIFICATION_TREE: &str = "object_classification";

/// Paths an inference stage must reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelArtifacts {
    pub graph: PathBuf,
    pub labels: Option<PathBuf>,
    pub pre_process: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ModelPathResolver {
    root: PathBuf,
}

impl ModelPathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, model: &str, kind: StageKind, precision: &str) -> ModelArtifacts {
        match kind {
            StageKind::Detect => ModelArtifacts {
                graph: self.tree_path(DETECTION_TREE, model, precision, "xml"),
                labels: None,
                pre_process: None,
            },
            StageKind::Classify => ModelArtifacts {
                graph: self.tree_path(CLASSIFICATION_TREE, model, precision, "xml"),
                labels: Some(self.tree_path(CLASSIFICATION_TREE, model, precision, "txt")),
                pre_process: Some(self.tree_path(CLASSIFICATION_TREE, model, precision, "json")),
            },
            _ => ModelArtifacts {
                graph: self.root.join(model),
                labels: None,
                pre_process: None,
            },
        }
    }

    fn tree_path(&self, tree: &str, model: &str, precision: &str, extension: &str) -> PathBuf {
        let mut path = self.root.join(tree).join(model);
        if !precision.is_empty() {
            path.push(precision);
        }
        path.push(format!("{}.{}", model, extension));
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_layout() {
        let resolver = ModelPathResolver::new("/models");
        let artifacts = resolver.resolve("yolo11n", StageKind::Detect, "INT8");
        assert_eq!(
            artifacts.graph,
            PathBuf::from("/models/object_detection/yolo11n/INT8/yolo11n.xml")
        );
        assert!(artifacts.labels.is_none());
        assert!(artifacts.pre_process.is_none());
    }

    #[test]
    fn test_classification_siblings() {
        let resolver = ModelPathResolver::new("/models");
        let artifacts = resolver.resolve("efficientnet-b0", StageKind::Classify, "FP16");
        let base = "/models/object_classification/efficientnet-b0/FP16/efficientnet-b0";
        assert_eq!(artifacts.graph, PathBuf::from(format!("{}.xml", base)));
        assert_eq!(artifacts.labels, Some(PathBuf::from(format!("{}.txt", base))));
        assert_eq!(artifacts.pre_process, Some(PathBuf::from(format!("{}.json", base))));
    }

    #[test]
    fn test_other_kinds_use_bare_name() {
        let resolver = ModelPathResolver::new("/models");
        let artifacts = resolver.resolve("custom.xml", StageKind::RawInference, "FP32");
        assert_eq!(artifacts.graph, PathBuf::from("/models/custom.xml"));
    }

    #[test]
    fn test_empty_precision_omits_segment() {
        let resolver = ModelPathResolver::new("/models");
        let artifacts = resolver.resolve("m1", StageKind::Detect, "");
        assert_eq!(artifacts.graph, PathBuf::from("/models/object_detection/m1/m1.xml"));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let resolver = ModelPathResolver::new("/models");
        assert_eq!(
            resolver.resolve("m", StageKind::Classify, "FP16"),
            resolver.resolve("m", StageKind::Classify, "FP16")
        );
    }
}
