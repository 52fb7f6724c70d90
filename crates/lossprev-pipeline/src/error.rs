// Copyright 2025 Loss Prevention Pipelines Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the pipeline compiler

/// Result type alias using CompileError
pub type Result<T> = std::result::Result<T, CompileError>;

/// Error types for the pipeline compiler
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Input file does not exist
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(String),

    /// Malformed structured input
    #[error("Malformed configuration in {path}: {reason}")]
    ConfigParseError { path: String, reason: String },

    /// Workload name with no stage template (recoverable: the workload is skipped)
    #[error("Workload '{workload}' of camera '{camera_id}' has no stage template")]
    UnknownWorkload { camera_id: String, workload: String },

    /// Stage kind the compiler cannot place in a chain (fatal for the camera)
    #[error("Unsupported stage kind '{kind}' in workload '{workload}' of camera '{camera_id}'")]
    UnsupportedStageKind {
        camera_id: String,
        workload: String,
        kind: String,
    },

    /// Malformed override value (recoverable: the default is used)
    #[error("Invalid value '{value}' for {field}")]
    InvalidOverrideValue { field: String, value: String },

    /// Every workload of a camera was skipped (fatal for the camera)
    #[error("Camera '{0}' has no compilable workloads")]
    NoCompilableWorkloads(String),

    /// Run configuration error
    #[error(transparent)]
    Config(#[from] lossprev_config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    /// Errors that withhold a camera's whole output (other cameras still compile)
    pub fn is_camera_fatal(&self) -> bool {
        matches!(
            self,
            CompileError::UnsupportedStageKind { .. } | CompileError::NoCompilableWorkloads(_)
        )
    }

    /// Errors that degrade to a skip or a default value with a diagnostic
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CompileError::UnknownWorkload { .. } | CompileError::InvalidOverrideValue { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let unsupported = CompileError::UnsupportedStageKind {
            camera_id: "c1".to_string(),
            workload: "w".to_string(),
            kind: "fakesink".to_string(),
        };
        assert!(unsupported.is_camera_fatal());
        assert!(!unsupported.is_recoverable());

        let unknown = CompileError::UnknownWorkload {
            camera_id: "c1".to_string(),
            workload: "w".to_string(),
        };
        assert!(unknown.is_recoverable());
        assert!(!unknown.is_camera_fatal());
        assert_eq!(
            unknown.to_string(),
            "Workload 'w' of camera 'c1' has no stage template"
        );
    }
}
