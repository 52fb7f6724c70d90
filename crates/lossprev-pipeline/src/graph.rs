// Copyright 2025 Loss Prevention Pipelines Contributors
// SPDX-License-Identifier: Apache-2.0

//! Compiled pipeline graph
//!
//! A compiled pipeline is a small DAG: a linear trunk of resolved stages that
//! ends in a fan-out point, and one linear branch per output behind it.
//! Rendering to text lives in [`crate::render`].

use crate::model_paths::ModelArtifacts;
use crate::signature::PipelineSignature;
use crate::types::{StageKind, StageSpec};

/// One parameter token of a stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageParam {
    /// `key=value`, omitted when the value is empty
    KeyValue { key: String, value: String },
    /// Verbatim text from a device profile expression
    Raw(String),
}

impl StageParam {
    pub fn is_empty(&self) -> bool {
        match self {
            StageParam::KeyValue { value, .. } => value.is_empty(),
            StageParam::Raw(text) => text.trim().is_empty(),
        }
    }
}

/// A stage with everything resolved for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStage {
    pub kind: StageKind,
    pub element: String,
    pub params: Vec<StageParam>,
    /// Set on detect, classify and track stages
    pub instance_id: Option<String>,
    pub artifacts: Option<ModelArtifacts>,
    /// Template stage this was resolved from; `None` for compiler-placed stages
    pub origin: Option<StageSpec>,
}

impl ResolvedStage {
    /// Stage rendered with the kind's default element
    pub fn new(kind: StageKind) -> Self {
        Self::with_element(kind, kind.element())
    }

    pub fn with_element(kind: StageKind, element: impl Into<String>) -> Self {
        Self {
            kind,
            element: element.into(),
            params: Vec::new(),
            instance_id: None,
            artifacts: None,
            origin: None,
        }
    }

    pub fn queue() -> Self {
        Self::new(StageKind::Queue)
    }

    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push(StageParam::KeyValue {
            key: key.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn raw(mut self, text: impl Into<String>) -> Self {
        self.params.push(StageParam::Raw(text.into()));
        self
    }

    /// Value of a `key=value` parameter
    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.params.iter().find_map(|p| match p {
            StageParam::KeyValue { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn is_sink(&self) -> bool {
        matches!(self.kind, StageKind::DisplaySink | StageKind::TerminalSink)
    }
}

/// Output branch role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchKind {
    /// Structured records + metrics counter + terminal sink
    Persistence,
    /// Overlay + display sink (render mode on)
    Display,
    /// Plain terminal sink (render mode off)
    Terminal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputBranch {
    pub kind: BranchKind,
    pub stages: Vec<ResolvedStage>,
}

/// Fan-out point closing the trunk
#[derive(Debug, Clone, PartialEq)]
pub struct FanOut {
    pub name: String,
    pub branches: Vec<OutputBranch>,
}

/// One executable pipeline: one camera, one unique chain
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPipeline {
    pub camera_id: String,
    pub branch_index: usize,
    pub chain_index: usize,
    pub signature: PipelineSignature,
    /// Workload whose template was compiled
    pub workload: String,
    /// All workloads deduplicated into this pipeline, `workload` first
    pub merged_workloads: Vec<String>,
    pub stages: Vec<ResolvedStage>,
    pub fan_out: FanOut,
}

impl CompiledPipeline {
    pub fn has_branch(&self, kind: BranchKind) -> bool {
        self.fan_out.branches.iter().any(|b| b.kind == kind)
    }

    /// Trunk and branch stages in render order
    pub fn all_stages(&self) -> impl Iterator<Item = &ResolvedStage> {
        self.stages
            .iter()
            .chain(self.fan_out.branches.iter().flat_map(|b| b.stages.iter()))
    }

    pub fn instance_ids(&self) -> Vec<&str> {
        self.all_stages()
            .filter_map(|s| s.instance_id.as_deref())
            .collect()
    }

    pub fn source_count(&self) -> usize {
        self.all_stages()
            .filter(|s| s.kind == StageKind::Source)
            .count()
    }

    pub fn sink_count(&self) -> usize {
        self.all_stages().filter(|s| s.is_sink()).count()
    }
}
