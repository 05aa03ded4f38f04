//! Error types for an analysis run.
//!
//! Errors carry context that chains through layers:
//! Analysis → Role (reference/comparison) → Tool failure

use std::io;

use thiserror::Error;

use crate::extraction::{ExtractError, ProbeError};
use crate::models::Checkpoint;

/// Which side of the comparison an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRole {
    Reference,
    Comparison,
}

impl std::fmt::Display for SourceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceRole::Reference => write!(f, "reference"),
            SourceRole::Comparison => write!(f, "comparison"),
        }
    }
}

/// Fatal failure of one analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Metadata of a source could not be read.
    #[error("Probing {role} failed: {source}")]
    Probe {
        role: SourceRole,
        #[source]
        source: ProbeError,
    },

    /// A mandatory window could not be extracted.
    #[error("Extracting {role} at {checkpoint} failed: {source}")]
    Extract {
        role: SourceRole,
        checkpoint: Checkpoint,
        #[source]
        source: ExtractError,
    },

    /// A mandatory checkpoint produced no usable offset.
    #[error("No reliable offset at {checkpoint}: {message}")]
    Correlate {
        checkpoint: Checkpoint,
        message: String,
    },

    /// Offsets show a structural edit; automatic remediation is not possible.
    #[error("Cut detected (start {start_ms:.0}ms, mid {mid_ms:.0}ms, end {end_ms:.0}ms); manual edit required")]
    Cut {
        start_ms: f64,
        mid_ms: f64,
        end_ms: f64,
    },

    /// The task workspace could not be created.
    #[error("Workspace error in {operation}: {source}")]
    Workspace {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl AnalysisError {
    pub fn probe(role: SourceRole, source: ProbeError) -> Self {
        Self::Probe { role, source }
    }

    pub fn extract(role: SourceRole, checkpoint: Checkpoint, source: ExtractError) -> Self {
        Self::Extract {
            role,
            checkpoint,
            source,
        }
    }

    pub fn correlate(checkpoint: Checkpoint, message: impl Into<String>) -> Self {
        Self::Correlate {
            checkpoint,
            message: message.into(),
        }
    }

    pub fn workspace(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Workspace {
            operation: operation.into(),
            source,
        }
    }

    /// Whether a bounded wait expired somewhere underneath.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            AnalysisError::Probe {
                source: ProbeError::Timeout { .. },
                ..
            } | AnalysisError::Extract {
                source: ExtractError::Timeout { .. },
                ..
            }
        )
    }
}

/// Result type for analysis runs.
pub type AnalysisResult<T> = Result<T, AnalysisError>;
