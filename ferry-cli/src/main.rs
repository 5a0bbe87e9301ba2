//! Ferry — push-to-deploy webhook receiver.
//!
//! # Usage
//!
//! ```text
//! ferry serve [--config <file>] [--bind <addr>] [--route <path>] [--log-file <file>] [--json-logs]
//! ferry deploy <repo> [--config <file>] [--json]
//! ferry check [--config <file>] [--json]
//! ferry sign <repo> [--body <file>] [--sha1]
//! ferry deliver <repo> --url <endpoint> [--sha1]
//! ```
//!
//! Every command first loads the nearest `.env` (current directory, then its
//! parents) or `--env-file <file>`, so the
//! `<NAME>_SECRET` variables can live next to the hooks document. Variables
//! already set in the environment win.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    check::CheckArgs, deliver::DeliverArgs, deploy::DeployArgs, serve::ServeArgs, sign::SignArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "ferry",
    version,
    about = "Receive signed push webhooks and redeploy the matching workspace",
    long_about = None,
)]
struct Cli {
    /// Dotenv file with repository secrets. Defaults to the nearest `.env`.
    #[arg(long, global = true, env = "FERRY_ENV_FILE")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the webhook receiver in the foreground.
    Serve(ServeArgs),

    /// Run the sync → setup → startup pipeline for one repository now.
    Deploy(DeployArgs),

    /// Validate the hooks document and show what each repository would do.
    Check(CheckArgs),

    /// Print the signature header for a request body.
    Sign(SignArgs),

    /// Send a signed minimal push delivery to a running receiver.
    Deliver(DeliverArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    commands::load_env_file(cli.env_file.as_deref())?;
    match cli.command {
        Commands::Serve(args) => args.run(),
        Commands::Deploy(args) => args.run(),
        Commands::Check(args) => args.run(),
        Commands::Sign(args) => args.run(),
        Commands::Deliver(args) => args.run(),
    }
}
