//! Hooks configuration document.
//!
//! # Document shape
//!
//! ```json
//! {
//!   "demo": {
//!     "workspace": "/srv/demo",
//!     "setup": [["npm", "ci"], ["npm", "run", "build"]],
//!     "startup": ["npm", "start"]
//!   }
//! }
//! ```
//!
//! `.yaml` / `.yml` files carry the same mapping in YAML; anything else is
//! parsed as JSON.
//!
//! # Read-per-request
//!
//! [`FileConfigStore`] holds no cached state. Every [`ConfigStore::get`] re-reads
//! and re-validates the file, so operators can edit it without restarting the
//! receiver.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{io_err, ConfigError, FormatError};
use crate::types::{RepositoryConfig, RepositoryEntry, RepositoryName};

/// Parsed document: repository name → entry, sorted by name.
pub type HooksDocument = BTreeMap<String, RepositoryEntry>;

/// Source of per-repository configuration.
pub trait ConfigStore: Send + Sync {
    /// Read the whole document from its source and return every repository.
    fn reload(&self) -> Result<Vec<RepositoryConfig>, ConfigError>;

    /// Read the document and return the entry for `name`.
    fn get(&self, name: &RepositoryName) -> Result<RepositoryConfig, ConfigError>;
}

/// [`ConfigStore`] backed by a JSON or YAML file on disk.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileConfigStore {
    fn reload(&self) -> Result<Vec<RepositoryConfig>, ConfigError> {
        let document = load_document_at(&self.path)?;
        Ok(document
            .into_iter()
            .map(|(name, entry)| RepositoryConfig::from_entry(RepositoryName::from(name), entry))
            .collect())
    }

    fn get(&self, name: &RepositoryName) -> Result<RepositoryConfig, ConfigError> {
        let mut document = load_document_at(&self.path)?;
        match document.remove(name.as_str()) {
            Some(entry) => Ok(RepositoryConfig::from_entry(name.clone(), entry)),
            None => Err(ConfigError::UnknownRepository {
                name: name.0.clone(),
                path: self.path.clone(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Load and validate the hooks document at `path`.
///
/// Returns `ConfigError::NotFound` if absent, `ConfigError::Malformed` (with
/// path and parser context) if it cannot be parsed or an entry is invalid.
pub fn load_document_at(path: &Path) -> Result<HooksDocument, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(err) => return Err(io_err(path, err)),
    };

    let document = parse_document(path, &contents).map_err(|source| ConfigError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(document)
}

fn parse_document(path: &Path, contents: &str) -> Result<HooksDocument, FormatError> {
    let document: HooksDocument = if is_yaml(path) {
        serde_yaml::from_str(contents)?
    } else {
        serde_json::from_str(contents)?
    };
    for (name, entry) in &document {
        validate_entry(name, entry)?;
    }
    Ok(document)
}

fn validate_entry(name: &str, entry: &RepositoryEntry) -> Result<(), FormatError> {
    let invalid = |reason: String| FormatError::Invalid {
        repository: name.to_string(),
        reason,
    };

    if entry.workspace.as_os_str().is_empty() {
        return Err(invalid("`workspace` must not be empty".to_string()));
    }
    if let Some(index) = entry.setup.iter().position(|cmd| cmd.is_empty()) {
        return Err(invalid(format!("setup command #{} is empty", index + 1)));
    }
    if entry.startup.as_ref().is_some_and(|cmd| cmd.is_empty()) {
        return Err(invalid("startup command is empty".to_string()));
    }
    Ok(())
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
