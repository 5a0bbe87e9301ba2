//! Per-repository shared secrets.
//!
//! Secrets never live in the hooks document. Each repository's secret is read
//! from a variable named `<NAME_UPPERCASE>_SECRET`.

use std::collections::HashMap;

use crate::error::ConfigError;
use crate::types::RepositoryName;

/// Suffix appended to the upper-cased repository name.
pub const SECRET_VAR_SUFFIX: &str = "_SECRET";

/// Variable holding the shared secret for `name`, e.g. `demo` → `DEMO_SECRET`.
pub fn secret_var_name(name: &RepositoryName) -> String {
    format!("{}{SECRET_VAR_SUFFIX}", name.0.to_uppercase())
}

/// Capability that maps a repository to its webhook secret.
pub trait SecretResolver: Send + Sync {
    /// Returns `ConfigError::MissingSecret` when no secret is available.
    fn resolve(&self, name: &RepositoryName) -> Result<String, ConfigError>;
}

/// Reads secrets from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretResolver;

impl SecretResolver for EnvSecretResolver {
    fn resolve(&self, name: &RepositoryName) -> Result<String, ConfigError> {
        let var = secret_var_name(name);
        match std::env::var(&var) {
            Ok(secret) if !secret.is_empty() => Ok(secret),
            _ => Err(ConfigError::MissingSecret { var }),
        }
    }
}

/// Resolves secrets from an in-memory table keyed by variable name.
#[derive(Debug, Clone, Default)]
pub struct MapSecretResolver {
    vars: HashMap<String, String>,
}

impl MapSecretResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `secret` for `name` under its derived variable name.
    pub fn with_secret(mut self, name: &RepositoryName, secret: impl Into<String>) -> Self {
        self.vars.insert(secret_var_name(name), secret.into());
        self
    }
}

impl SecretResolver for MapSecretResolver {
    fn resolve(&self, name: &RepositoryName) -> Result<String, ConfigError> {
        let var = secret_var_name(name);
        self.vars
            .get(&var)
            .cloned()
            .ok_or(ConfigError::MissingSecret { var })
    }
}
