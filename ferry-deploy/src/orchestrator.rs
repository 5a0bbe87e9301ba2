//! Deploy pipeline: LOAD → SYNC → SETUP → STARTUP.
//!
//! | Step    | On failure                         |
//! |---------|------------------------------------|
//! | LOAD    | abort, error propagates            |
//! | SYNC    | logged, pipeline continues         |
//! | SETUP   | abort, error propagates            |
//! | STARTUP | launch errors propagate; exit status never observed |
//!
//! Nothing is rolled back: commands that already ran keep their effects.
//!
//! Deploys of the same repository are serialized by a per-name lock, so two
//! overlapping deliveries never interleave filesystem changes in one
//! workspace. Different repositories deploy in parallel.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use ferry_core::{ConfigStore, RepositoryName};

use crate::error::DeployError;
use crate::runner::CommandRunner;
use crate::workspace::{SyncResult, VersionControl, WorkspaceSynchronizer};

/// Summary of a completed deploy.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub repository: RepositoryName,
    pub workspace: PathBuf,
    pub sync: SyncResult,
    /// Number of setup commands that ran (all of them, on success).
    pub setup_commands: usize,
    /// PID of the detached startup process, if one was configured.
    pub startup_pid: Option<u32>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u128,
}

/// Anything that can deploy a repository by name.
pub trait Deploy: Send + Sync {
    fn deploy(&self, repository: &RepositoryName) -> Result<DeployReport, DeployError>;
}

/// One mutex per repository name, created on first use.
#[derive(Debug, Default)]
struct RepositoryLocks {
    slots: Mutex<HashMap<RepositoryName, Arc<Mutex<()>>>>,
}

impl RepositoryLocks {
    fn slot(&self, name: &RepositoryName) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(name.clone()).or_default().clone()
    }
}

/// Composes config store, synchronizer and command runner.
pub struct DeploymentOrchestrator<S, V, R> {
    store: S,
    synchronizer: WorkspaceSynchronizer<V>,
    runner: R,
    locks: RepositoryLocks,
}

impl<S, V, R> DeploymentOrchestrator<S, V, R>
where
    S: ConfigStore,
    V: VersionControl,
    R: CommandRunner,
{
    pub fn new(store: S, vcs: V, runner: R) -> Self {
        Self {
            store,
            synchronizer: WorkspaceSynchronizer::new(vcs),
            runner,
            locks: RepositoryLocks::default(),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run the full pipeline for `repository`, holding its lock throughout.
    pub fn deploy(&self, repository: &RepositoryName) -> Result<DeployReport, DeployError> {
        let slot = self.locks.slot(repository);
        let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);

        let started_at = Utc::now();
        let started = Instant::now();

        // LOAD
        let config = self.store.get(repository)?;
        tracing::info!(
            "deploying '{}' in {}",
            repository,
            config.workspace.display()
        );

        // SYNC
        let sync = self.synchronizer.sync(&config.workspace);

        // SETUP
        if !config.setup.is_empty() {
            if let Err(err) = self.runner.run_sequential(&config.setup, &config.workspace) {
                tracing::error!("setup for '{}' aborted: {}", repository, err);
                return Err(err);
            }
        }

        // STARTUP
        let startup_pid = match &config.startup {
            Some(command) => {
                let handle = self.runner.run_detached(command, &config.workspace)?;
                Some(handle.pid())
            }
            None => None,
        };

        let report = DeployReport {
            repository: repository.clone(),
            workspace: config.workspace,
            sync,
            setup_commands: config.setup.len(),
            startup_pid,
            started_at,
            duration_ms: started.elapsed().as_millis(),
        };
        tracing::info!(
            "deploy of '{}' completed in {} ms",
            repository,
            report.duration_ms
        );
        Ok(report)
    }
}

impl<S, V, R> Deploy for DeploymentOrchestrator<S, V, R>
where
    S: ConfigStore,
    V: VersionControl,
    R: CommandRunner,
{
    fn deploy(&self, repository: &RepositoryName) -> Result<DeployReport, DeployError> {
        DeploymentOrchestrator::deploy(self, repository)
    }
}
