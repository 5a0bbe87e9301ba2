pub mod check;
pub mod deliver;
pub mod deploy;
pub mod serve;
pub mod sign;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use ferry_core::{EnvSecretResolver, RepositoryName, SecretResolver};
use ferry_daemon::defaults::DEFAULT_CONFIG_FILE;
use ferry_deploy::SignatureScheme;

/// `--config` shared by every command that reads the hooks document.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArg {
    /// Hooks document (JSON, or YAML by extension).
    #[arg(long, env = "FERRY_CONFIG")]
    pub config: Option<PathBuf>,
}

impl ConfigArg {
    /// `--config` / `$FERRY_CONFIG`, else `./hooks.json` if it exists, else
    /// `<config dir>/ferry/hooks.json`.
    pub fn resolve(&self) -> Result<PathBuf> {
        let cwd = std::env::current_dir().context("could not determine current directory")?;
        resolve_config_path(self.config.as_deref(), &cwd, dirs::config_dir().as_deref())
            .context("no hooks document found; pass --config or set FERRY_CONFIG")
    }
}

pub(crate) fn resolve_config_path(
    explicit: Option<&Path>,
    cwd: &Path,
    config_dir: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = cwd.join(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }
    config_dir.map(|dir| dir.join("ferry").join(DEFAULT_CONFIG_FILE))
}

/// Load `explicit`, or the nearest `.env` when there is one. Already-set
/// variables are kept.
pub fn load_env_file(explicit: Option<&Path>) -> Result<()> {
    match explicit {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load env file {}", path.display()))?;
        }
        None => match dotenvy::dotenv() {
            Ok(_) => {}
            Err(err) if err.not_found() => {}
            Err(err) => return Err(err).context("failed to load .env"),
        },
    }
    Ok(())
}

pub(crate) fn scheme(sha1: bool) -> SignatureScheme {
    if sha1 {
        SignatureScheme::Sha1
    } else {
        SignatureScheme::Sha256
    }
}

/// The repository's secret from the environment, with the variable named on failure.
pub(crate) fn secret_for(repository: &RepositoryName) -> Result<String> {
    EnvSecretResolver
        .resolve(repository)
        .with_context(|| format!("cannot sign for '{repository}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join("hooks.json"), "{}").expect("write");
        let explicit = Path::new("/etc/ferry/other.yaml");
        assert_eq!(
            resolve_config_path(Some(explicit), dir.path(), None),
            Some(explicit.to_path_buf())
        );
    }

    #[test]
    fn local_hooks_json_before_config_dir() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let config_dir = Path::new("/home/user/.config");
        assert_eq!(
            resolve_config_path(None, dir.path(), Some(config_dir)),
            Some(config_dir.join("ferry").join("hooks.json"))
        );

        std::fs::write(dir.path().join("hooks.json"), "{}").expect("write");
        assert_eq!(
            resolve_config_path(None, dir.path(), Some(config_dir)),
            Some(dir.path().join("hooks.json"))
        );
    }

    #[test]
    fn nothing_to_resolve() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        assert_eq!(resolve_config_path(None, dir.path(), None), None);
    }
}
