//! `ferry deploy` — run the pipeline without a webhook.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use ferry_core::{FileConfigStore, RepositoryName};
use ferry_daemon::{init_tracing, LogFormat};
use ferry_deploy::{DeployReport, DeploymentOrchestrator, GitCli, SyncResult, SystemRunner};

use super::ConfigArg;

/// Arguments for `ferry deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Repository name as configured in the hooks document.
    pub repository: String,

    #[command(flatten)]
    pub config: ConfigArg,

    /// Print the deploy report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl DeployArgs {
    pub fn run(self) -> Result<()> {
        let path = self.config.resolve()?;
        init_tracing(None, LogFormat::Text).context("failed to initialise logging")?;

        let repository = RepositoryName::from(self.repository);
        let orchestrator =
            DeploymentOrchestrator::new(FileConfigStore::new(&path), GitCli::new(), SystemRunner);
        let report = orchestrator
            .deploy(&repository)
            .with_context(|| format!("deploy failed for '{repository}'"))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize report")?
            );
        } else {
            print_report(&report);
        }
        Ok(())
    }
}

fn print_report(report: &DeployReport) {
    println!(
        "{} '{}' deployed in {} ms",
        "✓".green(),
        report.repository,
        report.duration_ms
    );
    println!("  workspace  {}", report.workspace.display());
    println!("  started    {}", report.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  sync       {}", sync_label(report.sync));
    println!("  setup      {} command(s)", report.setup_commands);
    match report.startup_pid {
        Some(pid) => println!("  startup    pid {pid}"),
        None => println!("  startup    -"),
    }
}

fn sync_label(sync: SyncResult) -> String {
    if !sync.attempted {
        "skipped (not a working copy)".bright_black().to_string()
    } else if sync.succeeded {
        "pulled".to_string()
    } else {
        "pull failed, deployed current checkout".yellow().to_string()
    }
}
