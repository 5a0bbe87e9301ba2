//! Domain types for the hooks configuration document.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! The on-disk shape ([`RepositoryEntry`]) is kept separate from the resolved
//! shape handed to the deploy pipeline ([`RepositoryConfig`]).

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed repository name, the key of the hooks document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryName(pub String);

impl RepositoryName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RepositoryName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RepositoryName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// One external command as an argv list: program first, then its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandLine(pub Vec<String>);

impl CommandLine {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(args.into_iter().map(Into::into).collect())
    }

    /// The program to execute, `None` for an empty argv.
    pub fn program(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.0.get(1..).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

// ---------------------------------------------------------------------------
// Document and resolved config
// ---------------------------------------------------------------------------

/// A repository entry exactly as written in the hooks document.
///
/// ```json
/// { "workspace": "/srv/demo", "setup": [["make", "build"]], "startup": ["./run"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryEntry {
    pub workspace: PathBuf,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub setup: Vec<CommandLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup: Option<CommandLine>,
}

/// Operational configuration for one repository, resolved from the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryConfig {
    pub name: RepositoryName,
    /// Working copy the pipeline syncs and runs commands in. May not exist.
    pub workspace: PathBuf,
    pub setup: Vec<CommandLine>,
    pub startup: Option<CommandLine>,
}

impl RepositoryConfig {
    pub fn from_entry(name: RepositoryName, entry: RepositoryEntry) -> Self {
        Self {
            name,
            workspace: entry.workspace,
            setup: entry.setup,
            startup: entry.startup,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
