//! `ferry serve` — run the webhook receiver.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use ferry_core::{ConfigStore, EnvSecretResolver, FileConfigStore};
use ferry_daemon::defaults::{DEFAULT_BIND, DEFAULT_ROUTE};
use ferry_daemon::{start_blocking, LogFormat, ServerConfig, WebhookHandler};
use ferry_deploy::{DeploymentOrchestrator, GitCli, SystemRunner};

use super::ConfigArg;

/// Arguments for `ferry serve`.
#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Address to listen on.
    #[arg(long, env = "FERRY_BIND", default_value_t = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// Path the webhook is POSTed to.
    #[arg(long, env = "FERRY_ROUTE", default_value = DEFAULT_ROUTE)]
    pub route: String,

    /// Append logs to this file instead of stderr.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub json_logs: bool,
}

impl ServeArgs {
    pub fn run(self) -> Result<()> {
        let path = self.config.resolve()?;
        let store = FileConfigStore::new(&path);

        // The document is re-read per delivery; a broken one is worth flagging now.
        match store.reload() {
            Ok(repositories) => eprintln!(
                "{} {} ({} repositories)",
                "hooks:".bold(),
                path.display(),
                repositories.len()
            ),
            Err(err) => eprintln!("{} {err}", "warning:".yellow().bold()),
        }

        let orchestrator = DeploymentOrchestrator::new(store, GitCli::new(), SystemRunner);
        let handler = WebhookHandler::new(Arc::new(EnvSecretResolver), Arc::new(orchestrator));
        let config = ServerConfig {
            bind: self.bind,
            route: self.route,
            log_file: self.log_file,
            log_format: if self.json_logs {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
        };

        start_blocking(config, handler).context("webhook receiver stopped with an error")
    }
}
