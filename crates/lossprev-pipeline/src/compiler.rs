// Copyright 2025 Loss Prevention Pipelines Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pipeline compiler
//!
//! Per camera (branch index = position in the camera list):
//! expand -> deduplicate -> for each unique chain (chain index = first-seen
//! position) lay out source, decode, ROI attachment, template stages with
//! instance ids and queues, then the output fan-out.
//!
//! Instance identifiers are derived from `(branch, chain, occurrence)` only,
//! so cameras compile independently and may run on a rayon pool.

use std::path::PathBuf;

use ahash::AHashMap;
use lossprev_config::RunConfig;
use rayon::prelude::*;
use tracing::{debug, error, info};

use crate::device_profile::{BatchOverrides, DeviceProfileResolver};
use crate::error::{CompileError, Result};
use crate::expander::expand_camera;
use crate::graph::{BranchKind, CompiledPipeline, FanOut, OutputBranch, ResolvedStage};
use crate::inputs::WorkloadMap;
use crate::model_paths::ModelPathResolver;
use crate::signature::{deduplicate_chains, UniqueChain};
use crate::types::{CameraSpec, Roi, StageKind, StageSpec};

const TRACKING_TYPE: &str = "short-term-imageless";
const DEFAULT_DECODE: &str = "decodebin";

/// Run-level compile settings
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Render-mode toggle: display branch instead of plain terminal branch
    pub render_enabled: bool,
    pub display_sink: String,
    pub terminal_sink: String,
    pub results_dir: PathBuf,
    pub videos_dir: PathBuf,
    /// Run timestamp keyed into persistence paths
    pub timestamp: String,
    pub parallel: bool,
}

impl CompilerOptions {
    pub fn from_config(config: &RunConfig) -> Result<Self> {
        Ok(Self {
            render_enabled: config.render.enabled,
            display_sink: config.render.display_sink.clone(),
            terminal_sink: config.render.terminal_sink.clone(),
            results_dir: config.paths.results_dir.clone(),
            videos_dir: config.paths.videos_dir.clone(),
            timestamp: config.run.resolved_timestamp()?,
            parallel: config.run.parallel,
        })
    }
}

/// A camera whose output was withheld
#[derive(Debug)]
pub struct CameraFailure {
    pub camera_id: String,
    pub branch_index: usize,
    pub error: CompileError,
}

/// Result of compiling every camera of a run
#[derive(Debug, Default)]
pub struct CompileReport {
    /// In camera order, then chain order
    pub pipelines: Vec<CompiledPipeline>,
    pub failures: Vec<CameraFailure>,
}

impl CompileReport {
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

pub struct PipelineCompiler {
    options: CompilerOptions,
    profiles: DeviceProfileResolver,
    models: ModelPathResolver,
}

impl PipelineCompiler {
    pub fn new(
        options: CompilerOptions,
        profiles: DeviceProfileResolver,
        models: ModelPathResolver,
    ) -> Self {
        Self {
            options,
            profiles,
            models,
        }
    }

    /// Compiler wired from a run configuration (device profiles from `.env` files)
    pub fn from_config(config: &RunConfig) -> Result<Self> {
        let options = CompilerOptions::from_config(config)?;
        let overrides = BatchOverrides {
            detect: config.batch.detect.clone(),
            classify: config.batch.classify.clone(),
        };
        Ok(Self::new(
            options,
            DeviceProfileResolver::from_dir(&config.paths.device_profiles_dir, overrides),
            ModelPathResolver::new(&config.paths.models_dir),
        ))
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compile every camera; a failing camera is reported and the rest still compile
    pub fn compile_all(&self, cameras: &[CameraSpec], workloads: &WorkloadMap) -> CompileReport {
        let results: Vec<Result<Vec<CompiledPipeline>>> = if self.options.parallel {
            cameras
                .par_iter()
                .enumerate()
                .map(|(branch, camera)| self.compile_camera(branch, camera, workloads))
                .collect()
        } else {
            cameras
                .iter()
                .enumerate()
                .map(|(branch, camera)| self.compile_camera(branch, camera, workloads))
                .collect()
        };

        let mut report = CompileReport::default();
        for ((branch_index, camera), result) in cameras.iter().enumerate().zip(results) {
            match result {
                Ok(pipelines) => report.pipelines.extend(pipelines),
                Err(error) => {
                    error!(
                        "Camera '{}' (branch {}) withheld: {}",
                        camera.camera_id,
                        branch_index + 1,
                        error
                    );
                    report.failures.push(CameraFailure {
                        camera_id: camera.camera_id.clone(),
                        branch_index,
                        error,
                    });
                }
            }
        }

        info!(
            "Compiled {} pipeline(s) for {} camera(s), {} failed",
            report.pipelines.len(),
            cameras.len(),
            report.failures.len()
        );
        report
    }

    /// Compile one camera at branch index `branch`
    pub fn compile_camera(
        &self,
        branch: usize,
        camera: &CameraSpec,
        workloads: &WorkloadMap,
    ) -> Result<Vec<CompiledPipeline>> {
        let expanded = expand_camera(camera, workloads)?;
        if expanded.is_empty() {
            return Err(CompileError::NoCompilableWorkloads(camera.camera_id.clone()));
        }

        let chains = deduplicate_chains(expanded);
        let mut pipelines = Vec::with_capacity(chains.len());
        for (chain_index, chain) in chains.into_iter().enumerate() {
            let pipeline = self.compile_chain(branch, chain_index, camera, chain)?;
            debug!(
                "Camera '{}' chain {} <- {:?}",
                camera.camera_id,
                chain_index + 1,
                pipeline.merged_workloads
            );
            pipelines.push(pipeline);
        }
        Ok(pipelines)
    }

    fn compile_chain(
        &self,
        branch: usize,
        chain_index: usize,
        camera: &CameraSpec,
        chain: UniqueChain,
    ) -> Result<CompiledPipeline> {
        if let Some(stage) = chain.stages.iter().find(|s| !s.kind.is_template_stage()) {
            return Err(CompileError::UnsupportedStageKind {
                camera_id: camera.camera_id.clone(),
                workload: chain.workload.clone(),
                kind: stage.kind.to_string(),
            });
        }

        let coords = format!("{}_{}", branch + 1, chain_index + 1);
        let mut ids = InstanceIds::new(&coords);
        let mut trunk = Trunk::default();

        trunk.push(self.source_stage(camera));
        trunk.push(self.decode_stage(&chain.stages));

        let rois = distinct_rois(&chain.stages);
        if !rois.is_empty() {
            let attach = rois
                .iter()
                .fold(ResolvedStage::new(StageKind::RegionAttach), |stage, roi| {
                    stage.param("roi", roi.to_string())
                });
            trunk.push(attach);
            trunk.push_queue(chain.stages.first().map(|s| s.kind));
        }

        for (i, spec) in chain.stages.iter().enumerate() {
            trunk.push(self.resolve_stage(spec, camera, &mut ids));
            if spec.kind == StageKind::Detect {
                let id = ids.next(StageKind::Track);
                let mut track = ResolvedStage::new(StageKind::Track)
                    .param("name", id.clone())
                    .param("tracking-type", TRACKING_TYPE);
                track.instance_id = Some(id);
                trunk.push(track);
            }

            trunk.push_queue(chain.stages.get(i + 1).map(|next| next.kind));
        }

        let scripted = chain.stages.iter().any(|s| s.kind == StageKind::ScriptHook);
        let mut branches = Vec::with_capacity(2);
        if !scripted {
            trunk.push(ResolvedStage::new(StageKind::MetaConvert));
            branches.push(self.persistence_branch(&coords));
        }
        branches.push(self.render_branch());

        Ok(CompiledPipeline {
            camera_id: camera.camera_id.clone(),
            branch_index: branch,
            chain_index,
            signature: chain.signature,
            workload: chain.workload,
            merged_workloads: chain.merged,
            stages: trunk.stages,
            fan_out: FanOut {
                name: format!("tee{}", coords),
                branches,
            },
        })
    }

    fn source_stage(&self, camera: &CameraSpec) -> ResolvedStage {
        let name = camera.source.name.as_str();
        if name.starts_with("rtsp://") {
            ResolvedStage::with_element(StageKind::Source, "rtspsrc").param("location", name)
        } else if name.starts_with("/dev/video") {
            ResolvedStage::with_element(StageKind::Source, "v4l2src").param("device", name)
        } else {
            let location = self.options.videos_dir.join(name);
            ResolvedStage::new(StageKind::Source).param("location", location.display().to_string())
        }
    }

    /// Decode element comes from the device profile of the chain's first stage
    fn decode_stage(&self, stages: &[StageSpec]) -> ResolvedStage {
        let device = stages.first().map(|s| s.device.as_str()).unwrap_or_default();
        let element = self
            .profiles
            .resolve(device)
            .decode_override
            .unwrap_or_else(|| DEFAULT_DECODE.to_string());
        ResolvedStage::with_element(StageKind::Decode, element)
    }

    fn resolve_stage(
        &self,
        spec: &StageSpec,
        camera: &CameraSpec,
        ids: &mut InstanceIds,
    ) -> ResolvedStage {
        let region = if spec.roi.is_some() { "roi-list" } else { "" };
        let mut stage = match spec.kind {
            StageKind::Detect => {
                let profile = self.profiles.resolve(&spec.device);
                let artifacts = self.models.resolve(&spec.model, spec.kind, &spec.precision);
                let id = ids.next(spec.kind);
                let mut stage = ResolvedStage::new(spec.kind)
                    .param("model", artifacts.graph.display().to_string())
                    .param("model-instance-id", id.clone())
                    .param("device", spec.device.clone())
                    .param("batch-size", profile.batch_size_detect.to_string())
                    .param("model-proc", profile.pre_process_config_path)
                    .param("inference-region", region)
                    .raw(profile.pre_process_expr)
                    .raw(profile.detection_options_expr);
                stage.instance_id = Some(id);
                stage.artifacts = Some(artifacts);
                stage
            }
            StageKind::Classify => {
                let profile = self.profiles.resolve(&spec.device);
                let artifacts = self.models.resolve(&spec.model, spec.kind, &spec.precision);
                let id = ids.next(spec.kind);
                let path = |p: &Option<PathBuf>| {
                    p.as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default()
                };
                let mut stage = ResolvedStage::new(spec.kind)
                    .param("model", artifacts.graph.display().to_string())
                    .param("model-proc", path(&artifacts.pre_process))
                    .param("labels-file", path(&artifacts.labels))
                    .param("model-instance-id", id.clone())
                    .param("device", spec.device.clone())
                    .param("batch-size", profile.batch_size_classify.to_string())
                    .param("inference-region", region)
                    .raw(profile.classification_pre_process_expr);
                stage.instance_id = Some(id);
                stage.artifacts = Some(artifacts);
                stage
            }
            StageKind::RawInference => {
                let artifacts = self.models.resolve(&spec.model, spec.kind, &spec.precision);
                let mut stage = ResolvedStage::new(spec.kind)
                    .param("model", artifacts.graph.display().to_string())
                    .param("device", spec.device.clone())
                    .param("inference-region", region);
                stage.artifacts = Some(artifacts);
                stage
            }
            StageKind::ScriptHook => ResolvedStage::new(spec.kind)
                .param("module", spec.module.clone().unwrap_or_default())
                .param("function", spec.function.clone().unwrap_or_default()),
            StageKind::Track => {
                let id = ids.next(spec.kind);
                let mut stage = ResolvedStage::new(spec.kind)
                    .param("name", id.clone())
                    .param("tracking-type", TRACKING_TYPE);
                stage.instance_id = Some(id);
                stage
            }
            StageKind::RateLimit => ResolvedStage::new(spec.kind).param(
                "max-rate",
                camera.fps.map(|fps| fps.to_string()).unwrap_or_default(),
            ),
            StageKind::Publish => ResolvedStage::new(spec.kind)
                .param("method", "file")
                .param("file-format", "json-lines")
                .param("file-path", self.results_path(&ids.next(StageKind::Publish))),
            kind => ResolvedStage::new(kind),
        };
        stage.origin = Some(spec.clone());
        stage
    }

    fn results_path(&self, stem: &str) -> String {
        self.options
            .results_dir
            .join(format!("{}_{}.jsonl", stem, self.options.timestamp))
            .display()
            .to_string()
    }

    fn persistence_branch(&self, coords: &str) -> OutputBranch {
        OutputBranch {
            kind: BranchKind::Persistence,
            stages: vec![
                ResolvedStage::queue(),
                ResolvedStage::new(StageKind::Publish)
                    .param("method", "file")
                    .param("file-format", "json-lines")
                    .param("file-path", self.results_path(&format!("pipeline{}", coords))),
                ResolvedStage::new(StageKind::FpsCount),
                self.terminal_sink(),
            ],
        }
    }

    fn render_branch(&self) -> OutputBranch {
        if self.options.render_enabled {
            OutputBranch {
                kind: BranchKind::Display,
                stages: vec![
                    ResolvedStage::queue(),
                    ResolvedStage::new(StageKind::Overlay),
                    ResolvedStage::new(StageKind::Convert),
                    ResolvedStage::with_element(StageKind::DisplaySink, &self.options.display_sink)
                        .param("sync", "false"),
                ],
            }
        } else {
            OutputBranch {
                kind: BranchKind::Terminal,
                stages: vec![ResolvedStage::queue(), self.terminal_sink()],
            }
        }
    }

    fn terminal_sink(&self) -> ResolvedStage {
        ResolvedStage::with_element(StageKind::TerminalSink, &self.options.terminal_sink)
            .param("sync", "false")
    }
}

/// Linear stage list: no two adjacent queues, no queue in front of a script hook
#[derive(Default)]
struct Trunk {
    stages: Vec<ResolvedStage>,
}

impl Trunk {
    fn push(&mut self, stage: ResolvedStage) {
        self.stages.push(stage);
    }

    /// Queue ahead of a stage of kind `next` (`None` at the end of the chain)
    fn push_queue(&mut self, next: Option<StageKind>) {
        if next == Some(StageKind::ScriptHook) {
            return;
        }
        if self.stages.last().map(|s| s.kind) != Some(StageKind::Queue) {
            self.stages.push(ResolvedStage::queue());
        }
    }
}

/// Per-chain names: `{kind}{branch}_{chain}`, then `{kind}{branch}_{chain}_{n}` for the n-th occurrence
///
/// Used for instance ids and for template publish file names.
struct InstanceIds<'a> {
    coords: &'a str,
    seen: AHashMap<StageKind, usize>,
}

impl<'a> InstanceIds<'a> {
    fn new(coords: &'a str) -> Self {
        Self {
            coords,
            seen: AHashMap::new(),
        }
    }

    fn next(&mut self, kind: StageKind) -> String {
        let count = self.seen.entry(kind).or_insert(0);
        *count += 1;
        if *count == 1 {
            format!("{}{}", kind, self.coords)
        } else {
            format!("{}{}_{}", kind, self.coords, count)
        }
    }
}

/// Distinct ROIs in first-seen order
fn distinct_rois(stages: &[StageSpec]) -> Vec<Roi> {
    let mut rois: Vec<Roi> = Vec::new();
    for roi in stages.iter().filter_map(|s| s.roi) {
        if !rois.contains(&roi) {
            rois.push(roi);
        }
    }
    rois
}
