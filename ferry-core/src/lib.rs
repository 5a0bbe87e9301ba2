//! Ferry core library — repository configuration, secrets, errors.
//!
//! - [`types`] — newtypes and the per-repository configuration model
//! - [`error`] — [`ConfigError`]
//! - [`config_store`] — read-per-request configuration document
//! - [`secrets`] — per-repository shared-secret resolution

pub mod config_store;
pub mod error;
pub mod secrets;
pub mod types;

pub use config_store::{ConfigStore, FileConfigStore};
pub use error::{ConfigError, FormatError};
pub use secrets::{secret_var_name, EnvSecretResolver, MapSecretResolver, SecretResolver};
pub use types::{CommandLine, RepositoryConfig, RepositoryEntry, RepositoryName};
