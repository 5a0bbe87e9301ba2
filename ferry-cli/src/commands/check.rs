//! `ferry check` — validate the hooks document and preview each repository.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use ferry_core::{
    config_store::load_document_at, secret_var_name, RepositoryConfig, RepositoryName,
};
use ferry_deploy::{GitCli, VersionControl};

use super::ConfigArg;

/// Arguments for `ferry check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct RepositoryCheck {
    repository: String,
    workspace: String,
    workspace_exists: bool,
    working_copy: bool,
    setup_commands: usize,
    startup: Option<String>,
    secret_var: String,
    secret_set: bool,
}

#[derive(Tabled)]
struct CheckTableRow {
    #[tabled(rename = "repository")]
    repository: String,
    #[tabled(rename = "workspace")]
    workspace: String,
    #[tabled(rename = "sync")]
    sync: String,
    #[tabled(rename = "setup")]
    setup: usize,
    #[tabled(rename = "startup")]
    startup: String,
    #[tabled(rename = "secret")]
    secret: String,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let path = self.config.resolve()?;
        let document = load_document_at(&path)
            .with_context(|| format!("hooks document {} is not usable", path.display()))?;

        let git = GitCli::new();
        let checks: Vec<RepositoryCheck> = document
            .into_iter()
            .map(|(name, entry)| {
                inspect(
                    &git,
                    RepositoryConfig::from_entry(RepositoryName::from(name), entry),
                )
            })
            .collect();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&checks).context("failed to serialize check JSON")?
            );
            return Ok(());
        }

        print_table(&path.display().to_string(), checks);
        Ok(())
    }
}

fn inspect(vcs: &impl VersionControl, config: RepositoryConfig) -> RepositoryCheck {
    let secret_var = secret_var_name(&config.name);
    let secret_set = std::env::var(&secret_var).is_ok_and(|value| !value.is_empty());
    RepositoryCheck {
        repository: config.name.0,
        workspace: config.workspace.display().to_string(),
        workspace_exists: config.workspace.is_dir(),
        working_copy: vcs.is_working_copy(&config.workspace),
        setup_commands: config.setup.len(),
        startup: config.startup.map(|cmd| cmd.to_string()),
        secret_var,
        secret_set,
    }
}

fn print_table(path: &str, checks: Vec<RepositoryCheck>) {
    println!("Ferry v{} | {} | {} repositories", env!("CARGO_PKG_VERSION"), path, checks.len());
    if checks.is_empty() {
        println!("No repositories configured.");
        return;
    }

    let missing_secrets = checks.iter().filter(|c| !c.secret_set).count();
    let rows: Vec<CheckTableRow> = checks
        .into_iter()
        .map(|check| CheckTableRow {
            sync: sync_label(&check).to_string(),
            secret: format!(
                "{} ({})",
                check.secret_var,
                if check.secret_set { "set" } else { "unset" }
            ),
            repository: check.repository,
            workspace: check.workspace,
            setup: check.setup_commands,
            startup: check.startup.unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if missing_secrets > 0 {
        println!(
            "{} {missing_secrets} repositories have no secret; their deliveries will be rejected.",
            "warning:".yellow().bold()
        );
    }
}

fn sync_label(check: &RepositoryCheck) -> &'static str {
    if !check.workspace_exists {
        "missing"
    } else if check.working_copy {
        "git pull"
    } else {
        "skip"
    }
}
