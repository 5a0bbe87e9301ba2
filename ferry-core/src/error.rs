//! Error types for ferry-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading configuration or resolving secrets.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, is a directory, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The hooks document did not exist at the expected path.
    #[error("hooks config not found at {path}")]
    NotFound { path: PathBuf },

    /// Parse or validation failure; includes the file path.
    #[error("malformed hooks config at {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    /// The repository is not a key of the hooks document.
    #[error("repository '{name}' is not configured in {path}")]
    UnknownRepository { name: String, path: PathBuf },

    /// The per-repository secret variable is unset.
    #[error("secret variable {var} is not set")]
    MissingSecret { var: String },
}

/// Why a hooks document was rejected.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Parsed, but an entry breaks a field requirement.
    #[error("repository '{repository}': {reason}")]
    Invalid { repository: String, reason: String },
}

impl ConfigError {
    /// `true` for the operator-side misconfiguration variants.
    pub fn is_misconfiguration(&self) -> bool {
        matches!(
            self,
            ConfigError::NotFound { .. }
                | ConfigError::Malformed { .. }
                | ConfigError::UnknownRepository { .. }
        )
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
