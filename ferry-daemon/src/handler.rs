//! The webhook entry point.
//!
//! Order of checks for every delivery:
//!
//! 1. parse `repository.name` from the JSON body
//! 2. resolve that repository's secret
//! 3. require a signature header with a known scheme
//! 4. verify the HMAC of the raw body
//! 5. deploy, synchronously
//!
//! Steps 1–4 are read-only. Nothing touches a workspace until the signature
//! has verified.

use std::sync::Arc;

use serde::Deserialize;

use ferry_core::{RepositoryName, SecretResolver};
use ferry_deploy::{signature, Deploy, DeployReport, SignatureError};

use crate::error::DaemonError;

/// One inbound delivery.
#[derive(Debug, Clone, Default)]
pub struct WebhookEvent {
    /// Exact request body bytes; the signature covers these.
    pub body: Vec<u8>,
    /// Value of the signature header, if any.
    pub signature: Option<String>,
    /// `X-GitHub-Event`, logged only.
    pub event: Option<String>,
    /// `X-GitHub-Delivery`, logged only.
    pub delivery: Option<String>,
}

impl WebhookEvent {
    pub fn new(body: impl Into<Vec<u8>>, signature: Option<String>) -> Self {
        Self {
            body: body.into(),
            signature,
            ..Self::default()
        }
    }
}

/// Why a delivery was refused. Every variant maps to HTTP 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    BadPayload,
    MissingSecret,
    SignatureRequired,
    InvalidSignature,
}

impl Rejection {
    /// Short client-facing reason. Never names secrets or paths.
    pub fn reason(self) -> &'static str {
        match self {
            Rejection::BadPayload => "Invalid payload",
            Rejection::MissingSecret => "Repository not configured",
            Rejection::SignatureRequired => "X-Hub-Signature required",
            Rejection::InvalidSignature => "Invalid signature",
        }
    }
}

#[derive(Debug)]
pub enum HandlerResult {
    Accepted(DeployReport),
    Rejected(Rejection),
}

#[derive(Debug, Deserialize)]
struct PushPayload {
    repository: RepositoryRef,
    #[serde(rename = "ref")]
    git_ref: Option<String>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepositoryRef {
    name: String,
}

/// Verifies deliveries and hands verified ones to a [`Deploy`] implementation.
#[derive(Clone)]
pub struct WebhookHandler {
    secrets: Arc<dyn SecretResolver>,
    deployer: Arc<dyn Deploy>,
}

impl WebhookHandler {
    pub fn new(secrets: Arc<dyn SecretResolver>, deployer: Arc<dyn Deploy>) -> Self {
        Self { secrets, deployer }
    }

    /// Handle one delivery. Blocks until setup commands finish.
    ///
    /// `Err` means the delivery was authentic but the deploy failed.
    pub fn handle(&self, event: &WebhookEvent) -> Result<HandlerResult, DaemonError> {
        let payload: PushPayload = match serde_json::from_slice(&event.body) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "rejecting delivery with unparseable payload");
                return Ok(HandlerResult::Rejected(Rejection::BadPayload));
            }
        };
        if payload.repository.name.trim().is_empty() {
            tracing::warn!("rejecting delivery with empty repository name");
            return Ok(HandlerResult::Rejected(Rejection::BadPayload));
        }
        let repository = RepositoryName::from(payload.repository.name);

        let secret = match self.secrets.resolve(&repository) {
            Ok(secret) => secret,
            Err(err) => {
                tracing::error!(repository = %repository, error = %err, "no secret for repository");
                return Ok(HandlerResult::Rejected(Rejection::MissingSecret));
            }
        };

        match signature::check(&secret, &event.body, event.signature.as_deref()) {
            Ok(scheme) => {
                tracing::info!(
                    repository = %repository,
                    scheme = %scheme,
                    event = event.event.as_deref().unwrap_or("-"),
                    delivery = event.delivery.as_deref().unwrap_or("-"),
                    git_ref = payload.git_ref.as_deref().unwrap_or("-"),
                    after = payload.after.as_deref().unwrap_or("-"),
                    "signature verified",
                );
            }
            Err(err) => {
                let rejection = match &err {
                    SignatureError::Missing | SignatureError::UnsupportedScheme(_) => {
                        Rejection::SignatureRequired
                    }
                    SignatureError::Mismatch | SignatureError::InvalidKey => {
                        Rejection::InvalidSignature
                    }
                };
                tracing::warn!(repository = %repository, error = %err, "rejecting delivery");
                return Ok(HandlerResult::Rejected(rejection));
            }
        }

        match self.deployer.deploy(&repository) {
            Ok(report) => Ok(HandlerResult::Accepted(report)),
            Err(err) => {
                tracing::error!(repository = %repository, error = %err, "deploy aborted");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use ferry_core::MapSecretResolver;
    use ferry_deploy::{DeployError, SignatureScheme, SyncResult};

    use super::*;

    const SECRET: &str = "hunter2";

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    impl Deploy for Counting {
        fn deploy(&self, repository: &RepositoryName) -> Result<DeployReport, DeployError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DeployError::CommandFailed {
                    command: "false".to_string(),
                    exit_code: Some(1),
                });
            }
            Ok(DeployReport {
                repository: repository.clone(),
                workspace: "/tmp/demo".into(),
                sync: SyncResult::SKIPPED,
                setup_commands: 0,
                startup_pid: None,
                started_at: Utc::now(),
                duration_ms: 0,
            })
        }
    }

    fn handler(deployer: Arc<Counting>) -> WebhookHandler {
        let secrets = MapSecretResolver::new().with_secret(&RepositoryName::from("demo"), SECRET);
        WebhookHandler::new(Arc::new(secrets), deployer)
    }

    fn body(name: &str) -> Vec<u8> {
        format!(r#"{{"ref": "refs/heads/main", "repository": {{"name": "{name}"}}}}"#).into_bytes()
    }

    fn signed(body: &[u8], scheme: SignatureScheme) -> Option<String> {
        Some(signature::sign(SECRET, body, scheme).expect("sign"))
    }

    fn flip_last_digit(header: &str) -> String {
        let (head, last) = header.split_at(header.len() - 1);
        let replacement = if last == "0" { "1" } else { "0" };
        format!("{head}{replacement}")
    }

    #[test]
    fn valid_delivery_deploys_under_each_scheme() {
        let deployer = Arc::new(Counting::default());
        let payload = body("demo");
        for scheme in SignatureScheme::ALL {
            let event = WebhookEvent::new(payload.clone(), signed(&payload, scheme));
            let result = handler(deployer.clone()).handle(&event).expect("handle");
            assert!(matches!(result, HandlerResult::Accepted(ref r) if r.repository.as_str() == "demo"));
        }
        assert_eq!(deployer.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn bad_signatures_never_deploy() {
        let deployer = Arc::new(Counting::default());
        let handler = handler(deployer.clone());
        let payload = body("demo");
        let valid = signed(&payload, SignatureScheme::Sha1).expect("signature");

        let cases: Vec<(Option<String>, Rejection)> = vec![
            (None, Rejection::SignatureRequired),
            (Some(String::new()), Rejection::SignatureRequired),
            (Some("md5=00".to_string()), Rejection::SignatureRequired),
            (Some(valid.trim_start_matches("sha1=").to_string()), Rejection::SignatureRequired),
            (Some("sha1=zz".to_string()), Rejection::InvalidSignature),
            (Some(valid.replace("sha1=", "sha256=")), Rejection::InvalidSignature),
            (Some(flip_last_digit(&valid)), Rejection::InvalidSignature),
        ];
        for (header, expected) in cases {
            let event = WebhookEvent::new(payload.clone(), header.clone());
            match handler.handle(&event).expect("handle") {
                HandlerResult::Rejected(rejection) => {
                    assert_eq!(rejection, expected, "header {header:?}")
                }
                HandlerResult::Accepted(_) => panic!("accepted header {header:?}"),
            }
        }
        assert_eq!(deployer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn tampered_body_is_rejected() {
        let deployer = Arc::new(Counting::default());
        let payload = body("demo");
        let header = signed(&payload, SignatureScheme::Sha256);
        let mut tampered = payload.clone();
        tampered.push(b' ');
        let result = handler(deployer.clone())
            .handle(&WebhookEvent::new(tampered, header))
            .expect("handle");
        assert!(matches!(result, HandlerResult::Rejected(Rejection::InvalidSignature)));
        assert_eq!(deployer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn malformed_payloads_are_bad_payload() {
        let deployer = Arc::new(Counting::default());
        let handler = handler(deployer.clone());
        let payloads: [&[u8]; 5] = [
            b"not json",
            br#"{"repository": {}}"#,
            br#"{"repository": {"name": 7}}"#,
            br#"{"repository": {"name": "  "}}"#,
            br#"{}"#,
        ];
        for raw in payloads {
            let result = handler
                .handle(&WebhookEvent::new(raw.to_vec(), signed(raw, SignatureScheme::Sha1)))
                .expect("handle");
            assert!(
                matches!(result, HandlerResult::Rejected(Rejection::BadPayload)),
                "payload {:?}",
                String::from_utf8_lossy(raw)
            );
        }
        assert_eq!(deployer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_secret_is_rejected_without_detail() {
        let deployer = Arc::new(Counting::default());
        let payload = body("stranger");
        let result = handler(deployer.clone())
            .handle(&WebhookEvent::new(payload.clone(), signed(&payload, SignatureScheme::Sha1)))
            .expect("handle");
        match result {
            HandlerResult::Rejected(rejection) => {
                assert_eq!(rejection, Rejection::MissingSecret);
                assert!(!rejection.reason().contains("SECRET"));
            }
            HandlerResult::Accepted(_) => panic!("accepted unknown repository"),
        }
        assert_eq!(deployer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn deploy_failure_is_an_error() {
        let deployer = Arc::new(Counting {
            fail: true,
            ..Counting::default()
        });
        let payload = body("demo");
        let err = handler(deployer.clone())
            .handle(&WebhookEvent::new(payload.clone(), signed(&payload, SignatureScheme::Sha1)))
            .unwrap_err();
        assert!(matches!(err, DaemonError::Deploy(DeployError::CommandFailed { .. })));
        assert_eq!(deployer.calls.load(Ordering::SeqCst), 1);
    }
}
