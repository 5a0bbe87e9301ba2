//! Error types for ferry-deploy.

use std::path::PathBuf;

use thiserror::Error;

use ferry_core::error::ConfigError;

/// All errors that can arise from a deploy run.
#[derive(Debug, Error)]
pub enum DeployError {
    /// LOAD failed: unknown repository, malformed document, I/O.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A command could not be started at all (missing program, bad cwd).
    #[error("failed to launch `{command}` in {cwd}: {source}")]
    Spawn {
        command: String,
        cwd: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A setup command exited unsuccessfully. `exit_code` is `None` when the
    /// process was killed by a signal.
    #[error("command `{command}` failed with {}", describe_exit(.exit_code))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
    },

    /// The working copy could not be brought up to date. Logged only; the
    /// pipeline continues.
    #[error("sync of {path} failed: {reason}")]
    SyncFailed { path: PathBuf, reason: String },
}

/// Why a webhook signature header was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature header missing")]
    Missing,

    #[error("unsupported signature scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("signature does not match payload")]
    Mismatch,

    #[error("secret rejected by HMAC key setup")]
    InvalidKey,
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "termination by signal".to_string(),
    }
}
