//! External command execution.
//!
//! Setup commands run one after another and block the caller; the first
//! unsuccessful exit aborts the rest. The startup command is launched detached:
//! the caller gets a [`ProcessHandle`] back immediately and never waits on it.

use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;

use ferry_core::types::CommandLine;

use crate::error::DeployError;

/// Runs configured commands in a working directory.
pub trait CommandRunner: Send + Sync {
    /// Run `commands` in order in `cwd`, stopping at the first failure.
    fn run_sequential(&self, commands: &[CommandLine], cwd: &Path) -> Result<(), DeployError>;

    /// Launch `command` in `cwd` without waiting for it to exit.
    fn run_detached(&self, command: &CommandLine, cwd: &Path)
        -> Result<ProcessHandle, DeployError>;
}

/// A launched background process.
///
/// Ownership of the child ends at launch. The exit status is collected by a
/// reaper thread and discarded; dropping the handle neither waits for nor
/// kills the process.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    pid: u32,
    command: String,
}

impl ProcessHandle {
    pub fn new(pid: u32, command: impl Into<String>) -> Self {
        Self {
            pid,
            command: command.into(),
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

/// [`CommandRunner`] that spawns real OS processes with inherited stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run_sequential(&self, commands: &[CommandLine], cwd: &Path) -> Result<(), DeployError> {
        for command in commands {
            tracing::info!("running `{}` in {}", command, cwd.display());
            let status = build(command, cwd)?
                .status()
                .map_err(|e| spawn_err(command, cwd, e))?;
            if !status.success() {
                return Err(DeployError::CommandFailed {
                    command: command.to_string(),
                    exit_code: status.code(),
                });
            }
        }
        Ok(())
    }

    fn run_detached(
        &self,
        command: &CommandLine,
        cwd: &Path,
    ) -> Result<ProcessHandle, DeployError> {
        let child = build(command, cwd)?
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| spawn_err(command, cwd, e))?;
        tracing::info!(
            "launched `{}` in {} (pid {})",
            command,
            cwd.display(),
            child.id()
        );
        let handle = ProcessHandle::new(child.id(), command.to_string());
        reap(child, handle.command.clone());
        Ok(handle)
    }
}

/// Wait on `child` from a background thread so it never lingers as a zombie.
fn reap(mut child: Child, command: String) {
    let spawned = thread::Builder::new()
        .name("ferry-reaper".to_string())
        .spawn(move || match child.wait() {
            Ok(status) => tracing::debug!("`{}` exited with {}", command, status),
            Err(err) => tracing::warn!("could not wait on `{}`: {}", command, err),
        });
    if let Err(err) = spawned {
        tracing::warn!("could not start reaper thread: {}", err);
    }
}

fn build(command: &CommandLine, cwd: &Path) -> Result<Command, DeployError> {
    let Some(program) = command.program() else {
        return Err(spawn_err(
            command,
            cwd,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        ));
    };
    let mut cmd = Command::new(program);
    cmd.args(command.args()).current_dir(cwd);
    Ok(cmd)
}

fn spawn_err(command: &CommandLine, cwd: &Path, source: std::io::Error) -> DeployError {
    DeployError::Spawn {
        command: command.to_string(),
        cwd: cwd.to_path_buf(),
        source,
    }
}
