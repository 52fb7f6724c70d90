// Copyright 2025 Loss Prevention Pipelines Contributors
// SPDX-License-Identifier: Apache-2.0

//! gst-launch text rendering
//!
//! ```text
//! filesrc location=... ! decodebin ! ... ! tee name=tee1_1 tee1_1. ! queue ! ... tee1_1. ! queue ! fakesink sync=false
//! ```

use crate::graph::{CompiledPipeline, ResolvedStage, StageParam};

const LINK: &str = " ! ";
const CONTINUATION: &str = " \\\n  ";

/// One stage as a token: element followed by its non-empty parameters
pub fn render_stage(stage: &ResolvedStage) -> String {
    let mut token = stage.element.clone();
    for param in stage.params.iter().filter(|p| !p.is_empty()) {
        token.push(' ');
        match param {
            StageParam::KeyValue { key, value } => {
                token.push_str(key);
                token.push('=');
                token.push_str(value);
            }
            StageParam::Raw(text) => token.push_str(text.trim()),
        }
    }
    token
}

/// Element tokens per segment: the trunk closed by the tee, then one segment per branch
fn segments(pipeline: &CompiledPipeline) -> Vec<Vec<String>> {
    let tee = &pipeline.fan_out.name;

    let mut trunk: Vec<String> = pipeline.stages.iter().map(render_stage).collect();
    trunk.push(format!("tee name={}", tee));

    let mut segments = vec![trunk];
    for branch in &pipeline.fan_out.branches {
        let mut tokens = vec![format!("{}.", tee)];
        tokens.extend(branch.stages.iter().map(render_stage));
        segments.push(tokens);
    }
    segments
}

/// Single-line pipeline description
pub fn render(pipeline: &CompiledPipeline) -> String {
    segments(pipeline)
        .iter()
        .map(|tokens| tokens.join(LINK))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One element per line with shell line continuations
pub fn render_multiline(pipeline: &CompiledPipeline) -> String {
    let link = format!(" !{}", CONTINUATION);
    segments(pipeline)
        .iter()
        .map(|tokens| tokens.join(&link))
        .collect::<Vec<_>>()
        .join(CONTINUATION)
}

/// Every pipeline in one launcher invocation, one pipeline per continued line
pub fn render_launch_command(launcher: &str, pipelines: &[CompiledPipeline]) -> String {
    let mut command = launcher.to_string();
    for pipeline in pipelines {
        command.push_str(CONTINUATION);
        command.push_str(&render(pipeline));
    }
    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BranchKind, FanOut, OutputBranch};
    use crate::signature::signature;
    use crate::types::StageKind;

    fn pipeline() -> CompiledPipeline {
        CompiledPipeline {
            camera_id: "c1".to_string(),
            branch_index: 0,
            chain_index: 0,
            signature: signature(&[]),
            workload: "w".to_string(),
            merged_workloads: vec!["w".to_string()],
            stages: vec![
                ResolvedStage::new(StageKind::Source).param("location", "/media/a.mp4"),
                ResolvedStage::new(StageKind::Decode),
            ],
            fan_out: FanOut {
                name: "tee1_1".to_string(),
                branches: vec![OutputBranch {
                    kind: BranchKind::Terminal,
                    stages: vec![
                        ResolvedStage::queue(),
                        ResolvedStage::new(StageKind::TerminalSink).param("sync", "false"),
                    ],
                }],
            },
        }
    }

    #[test]
    fn test_empty_params_omitted() {
        let stage = ResolvedStage::new(StageKind::Detect)
            .param("model", "/m.xml")
            .param("model-proc", "")
            .raw("  ")
            .raw("pre-process-backend=opencv ");
        assert_eq!(
            render_stage(&stage),
            "gvadetect model=/m.xml pre-process-backend=opencv"
        );
    }

    #[test]
    fn test_render_single_line() {
        assert_eq!(
            render(&pipeline()),
            "filesrc location=/media/a.mp4 ! decodebin ! tee name=tee1_1 tee1_1. ! queue ! fakesink sync=false"
        );
    }

    #[test]
    fn test_render_multiline() {
        let expected = "filesrc location=/media/a.mp4 ! \\\n  \
                        decodebin ! \\\n  \
                        tee name=tee1_1 \\\n  \
                        tee1_1. ! \\\n  \
                        queue ! \\\n  \
                        fakesink sync=false";
        assert_eq!(render_multiline(&pipeline()), expected);
    }

    #[test]
    fn test_launch_command() {
        let command = render_launch_command("gst-launch-1.0 -e", &[pipeline(), pipeline()]);
        let lines: Vec<&str> = command.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "gst-launch-1.0 -e \\");
        assert!(lines[1].starts_with("  filesrc"));
        assert!(lines[1].ends_with(" \\"));
        assert!(!lines[2].ends_with('\\'));
    }
}
