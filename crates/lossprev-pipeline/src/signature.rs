// Copyright 2025 Loss Prevention Pipelines Contributors
// SPDX-License-Identifier: Apache-2.0

//! Structural chain signatures and per-camera deduplication
//!
//! A signature covers the ordered `(kind, model, precision, device)` tuples of
//! a chain and nothing else. Two workloads of one camera with the same
//! signature compile to a single chain: the first one seen wins, later ones
//! are merged into it and contribute nothing to the output but their name.

use std::fmt;

use ahash::AHashMap;
use serde_json::{json, Value};
use tracing::debug;

use crate::expander::ExpandedWorkload;
use crate::types::StageSpec;

/// Canonical structural key of a stage list
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineSignature(String);

impl PipelineSignature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PipelineSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the signature of a stage list
///
/// Each stage becomes a JSON object with sorted keys; the JSON array text is the key.
pub fn signature(stages: &[StageSpec]) -> PipelineSignature {
    let entries: Vec<Value> = stages
        .iter()
        .map(|stage| {
            json!({
                "kind": stage.kind.as_str(),
                "model": stage.model,
                "precision": stage.precision,
                "device": stage.device,
            })
        })
        .collect();
    PipelineSignature(Value::Array(entries).to_string())
}

/// A chain that survived deduplication
#[derive(Debug, Clone)]
pub struct UniqueChain {
    pub signature: PipelineSignature,
    /// Workload whose stage list is compiled
    pub workload: String,
    pub stages: Vec<StageSpec>,
    /// Every workload folded into this chain, `workload` first
    pub merged: Vec<String>,
}

/// Deduplicate one camera's workloads by signature, first writer wins
///
/// Output is in first-seen order; its position is the chain index.
pub fn deduplicate_chains(workloads: Vec<ExpandedWorkload>) -> Vec<UniqueChain> {
    let mut chains: Vec<UniqueChain> = Vec::with_capacity(workloads.len());
    let mut index: AHashMap<PipelineSignature, usize> = AHashMap::new();

    for workload in workloads {
        let sig = signature(&workload.stages);
        match index.get(&sig) {
            Some(&position) => {
                let chain = &mut chains[position];
                debug!(
                    "Workload '{}' merged into '{}' (identical chain)",
                    workload.name, chain.workload
                );
                chain.merged.push(workload.name);
            }
            None => {
                index.insert(sig.clone(), chains.len());
                chains.push(UniqueChain {
                    signature: sig,
                    workload: workload.name.clone(),
                    stages: workload.stages,
                    merged: vec![workload.name],
                });
            }
        }
    }

    chains
}
