use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the webhook handler and HTTP runtime.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("deploy error: {0}")]
    Deploy(#[from] ferry_deploy::DeployError),

    #[error("runtime error: {0}")]
    Runtime(String),
}

impl DaemonError {
    /// `true` when the deploy failed because the hooks document is missing,
    /// unreadable or lacks the repository.
    pub fn is_misconfiguration(&self) -> bool {
        matches!(
            self,
            DaemonError::Deploy(ferry_deploy::DeployError::Config(err)) if err.is_misconfiguration()
        )
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
