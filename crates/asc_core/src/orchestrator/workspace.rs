//! Per-analysis scratch directory.
//!
//! Every extracted window of one run lives in its own temporary directory,
//! removed when the workspace is dropped so early returns and panics clean
//! up too.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::errors::{AnalysisError, AnalysisResult, SourceRole};
use crate::models::Checkpoint;

const WORKSPACE_PREFIX: &str = "asc-";

/// Scratch directory owned by one analysis run.
#[derive(Debug)]
pub struct TaskWorkspace {
    dir: TempDir,
}

impl TaskWorkspace {
    /// Create a fresh workspace under `root`, or the system temp dir.
    pub fn create(root: Option<&Path>) -> AnalysisResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);

        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root).map_err(|e| {
                    AnalysisError::workspace(format!("creating {}", root.display()), e)
                })?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .map_err(|e| AnalysisError::workspace("creating task directory", e))?;

        tracing::debug!("Workspace: {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// File for one extracted window.
    pub fn window_path(&self, role: SourceRole, checkpoint: Checkpoint) -> PathBuf {
        self.dir.path().join(format!("{}_{}.pcm", role, checkpoint))
    }

    /// Remove the workspace now, reporting failures instead of ignoring them.
    pub fn close(self) -> AnalysisResult<()> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .map_err(|e| AnalysisError::workspace(format!("removing {}", path.display()), e))
    }
}
