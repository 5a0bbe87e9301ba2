//! `ferry sign` — compute the signature header for a body.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use ferry_core::RepositoryName;
use ferry_deploy::signature;

use super::{scheme, secret_for};

/// Arguments for `ferry sign`.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Repository whose secret signs the body.
    pub repository: String,

    /// File holding the exact request body. Reads stdin when omitted.
    #[arg(long)]
    pub body: Option<PathBuf>,

    /// Sign with HMAC-SHA1 (`X-Hub-Signature`) instead of HMAC-SHA256.
    #[arg(long)]
    pub sha1: bool,
}

impl SignArgs {
    pub fn run(self) -> Result<()> {
        let repository = RepositoryName::from(self.repository);
        let secret = secret_for(&repository)?;

        let body = match &self.body {
            Some(path) => std::fs::read(path)
                .with_context(|| format!("failed to read body from {}", path.display()))?,
            None => {
                let mut buf = Vec::new();
                std::io::stdin()
                    .read_to_end(&mut buf)
                    .context("failed to read body from stdin")?;
                buf
            }
        };

        let scheme = scheme(self.sha1);
        let header = signature::sign(&secret, &body, scheme)
            .with_context(|| format!("failed to sign body for '{repository}'"))?;
        println!("{}: {header}", scheme.header_name());
        Ok(())
    }
}
