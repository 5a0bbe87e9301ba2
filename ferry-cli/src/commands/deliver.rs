//! `ferry deliver` — POST a signed minimal push event to a receiver.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use ferry_core::RepositoryName;
use ferry_daemon::defaults::EVENT_HEADER;
use ferry_deploy::signature;

use super::{scheme, secret_for};

/// Arguments for `ferry deliver`.
#[derive(Args, Debug)]
pub struct DeliverArgs {
    /// Repository to redeploy.
    pub repository: String,

    /// Receiver endpoint, e.g. `http://host:9000/hooks/github-push`.
    #[arg(long)]
    pub url: String,

    /// Sign with HMAC-SHA1 (`X-Hub-Signature`) instead of HMAC-SHA256.
    #[arg(long)]
    pub sha1: bool,
}

impl DeliverArgs {
    pub fn run(self) -> Result<()> {
        let repository = RepositoryName::from(self.repository);
        let secret = secret_for(&repository)?;

        let body = push_payload(&repository)?;
        let scheme = scheme(self.sha1);
        let header = signature::sign(&secret, &body, scheme)
            .with_context(|| format!("failed to sign delivery for '{repository}'"))?;

        let response = ureq::post(&self.url)
            .set("Content-Type", "application/json")
            .set(EVENT_HEADER, "push")
            .set(scheme.header_name(), &header)
            .send_bytes(&body);
        let (status, text) = match response {
            Ok(resp) => (resp.status(), resp.into_string().unwrap_or_default()),
            Err(ureq::Error::Status(code, resp)) => (code, resp.into_string().unwrap_or_default()),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to reach {}", self.url));
            }
        };

        if (200..300).contains(&status) {
            println!("{} {status} {text}", "✓".green());
            Ok(())
        } else {
            bail!("receiver answered {status}: {text}");
        }
    }
}

fn push_payload(repository: &RepositoryName) -> Result<Vec<u8>> {
    let payload = serde_json::json!({ "repository": { "name": repository.as_str() } });
    serde_json::to_vec(&payload).context("failed to encode push payload")
}
