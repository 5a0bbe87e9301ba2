//! Working-copy synchronization.
//!
//! Sync is best-effort. A missing directory or a directory that is not a
//! working copy is skipped, and a failed pull is logged; none of these stop the
//! deploy pipeline.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Serialize;

use crate::error::DeployError;

/// Outcome of one sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    /// A pull was started.
    pub attempted: bool,
    /// The pull finished cleanly.
    pub succeeded: bool,
}

impl SyncResult {
    pub const SKIPPED: SyncResult = SyncResult {
        attempted: false,
        succeeded: false,
    };
    pub const FAILED: SyncResult = SyncResult {
        attempted: true,
        succeeded: false,
    };
    pub const PULLED: SyncResult = SyncResult {
        attempted: true,
        succeeded: true,
    };
}

/// Version-control capability used by the synchronizer.
pub trait VersionControl: Send + Sync {
    /// `true` if `path` is the root of a working copy.
    fn is_working_copy(&self, path: &Path) -> bool;

    /// Fetch and integrate the upstream branch. `Err` carries a reason.
    fn pull(&self, path: &Path) -> Result<(), String>;
}

/// Remote every pull integrates from.
const UPSTREAM_REMOTE: &str = "origin";

/// [`VersionControl`] backed by the `git` executable on `PATH`.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self::default()
    }

    fn git(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(path)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null());
        cmd
    }
}

impl VersionControl for GitCli {
    fn is_working_copy(&self, path: &Path) -> bool {
        let output = match self
            .git(path)
            .args(["rev-parse", "--show-toplevel"])
            .output()
        {
            Ok(output) if output.status.success() => output,
            _ => return false,
        };
        let toplevel = String::from_utf8_lossy(&output.stdout);
        let toplevel = Path::new(toplevel.trim());
        match (std::fs::canonicalize(toplevel), std::fs::canonicalize(path)) {
            (Ok(top), Ok(here)) => top == here,
            _ => false,
        }
    }

    fn pull(&self, path: &Path) -> Result<(), String> {
        let output = self
            .git(path)
            .args(["pull", UPSTREAM_REMOTE])
            .output()
            .map_err(|e| format!("could not run git: {e}"))?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(format!("git pull exited with {}: {}", output.status, stderr.trim()))
        }
    }
}

/// Brings a workspace up to date through a [`VersionControl`] backend.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceSynchronizer<V> {
    vcs: V,
}

impl<V: VersionControl> WorkspaceSynchronizer<V> {
    pub fn new(vcs: V) -> Self {
        Self { vcs }
    }

    pub fn sync(&self, path: &Path) -> SyncResult {
        if !path.is_dir() {
            tracing::debug!("workspace {} absent, nothing to sync", path.display());
            return SyncResult::SKIPPED;
        }
        if !self.vcs.is_working_copy(path) {
            tracing::warn!("workspace {} is not a working copy, skipping sync", path.display());
            return SyncResult::SKIPPED;
        }

        match self.vcs.pull(path) {
            Ok(()) => {
                tracing::info!("pulled latest changes into {}", path.display());
                SyncResult::PULLED
            }
            Err(reason) => {
                let err = DeployError::SyncFailed {
                    path: path.to_path_buf(),
                    reason,
                };
                tracing::warn!("{err}; continuing deploy");
                SyncResult::FAILED
            }
        }
    }
}
