use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use ferry_deploy::SignatureScheme;

use crate::defaults::{
    ACK_BODY, DEFAULT_BIND, DEFAULT_ROUTE, DELIVERY_HEADER, DEPLOY_FAILED_BODY, EVENT_HEADER,
    HEALTH_ROUTE,
};
use crate::error::{io_err, DaemonError};
use crate::handler::{HandlerResult, WebhookEvent, WebhookHandler};

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Path the webhook is POSTed to.
    pub route: String,
    /// Append log output here instead of stderr.
    pub log_file: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND,
            route: DEFAULT_ROUTE.to_string(),
            log_file: None,
            log_format: LogFormat::default(),
        }
    }
}

/// Install tracing, build a runtime and serve until ctrl-c.
pub fn start_blocking(config: ServerConfig, handler: WebhookHandler) -> Result<(), DaemonError> {
    init_tracing(config.log_file.as_deref(), config.log_format)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config, handler))
}

/// Serve the webhook route until ctrl-c.
pub async fn run(config: ServerConfig, handler: WebhookHandler) -> Result<(), DaemonError> {
    if !config.route.starts_with('/') || config.route == HEALTH_ROUTE {
        return Err(DaemonError::Runtime(format!(
            "invalid webhook route '{}'",
            config.route
        )));
    }

    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|source| DaemonError::Bind {
            addr: config.bind,
            source,
        })?;
    let local = listener
        .local_addr()
        .map_err(|source| DaemonError::Bind {
            addr: config.bind,
            source,
        })?;

    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
    let signal_handle = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("received ctrl-c, shutting down");
                let _ = shutdown_tx.send(());
                Ok(())
            }
            Err(err) => Err(DaemonError::Runtime(format!("ctrl-c handler failed: {err}"))),
        }
    });

    tracing::info!(addr = %local, route = %config.route, "webhook receiver listening");
    let served = axum::serve(listener, router(handler, &config.route))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
        .map_err(|e| DaemonError::Runtime(format!("server error: {e}")));

    signal_handle.abort();
    served
}

/// Routes: `POST <route>` for deliveries, `GET /health` for probes.
pub fn router(handler: WebhookHandler, route: &str) -> Router {
    Router::new()
        .route(route, post(receive))
        .route(HEALTH_ROUTE, get(|| async { "ok" }))
        .with_state(handler)
}

async fn receive(
    State(handler): State<WebhookHandler>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    log_delivery(&headers, &body);

    let event = WebhookEvent {
        body: body.to_vec(),
        signature: signature_header(&headers),
        event: header_string(&headers, EVENT_HEADER),
        delivery: header_string(&headers, DELIVERY_HEADER),
    };

    // Setup commands block; keep them off the async workers.
    let outcome = tokio::task::spawn_blocking(move || handler.handle(&event)).await;
    match outcome {
        Ok(Ok(HandlerResult::Accepted(report))) => {
            tracing::info!(
                repository = %report.repository,
                sync_attempted = report.sync.attempted,
                sync_succeeded = report.sync.succeeded,
                setup_commands = report.setup_commands,
                startup_pid = ?report.startup_pid,
                duration_ms = report.duration_ms as u64,
                "deploy completed",
            );
            (StatusCode::OK, ACK_BODY)
        }
        Ok(Ok(HandlerResult::Rejected(rejection))) => (StatusCode::BAD_REQUEST, rejection.reason()),
        Ok(Err(err)) => {
            if err.is_misconfiguration() {
                tracing::error!(
                    error = %err,
                    "hooks document does not cover this delivery; fix it and redeliver"
                );
            }
            (StatusCode::INTERNAL_SERVER_ERROR, DEPLOY_FAILED_BODY)
        }
        Err(err) => {
            tracing::error!(error = %err, "handler task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, DEPLOY_FAILED_BODY)
        }
    }
}

/// Request log: headers and the body as (lossy) text, at debug.
fn log_delivery(headers: &HeaderMap, body: &[u8]) {
    tracing::debug!(
        headers = ?headers,
        body_len = body.len(),
        body = %String::from_utf8_lossy(body),
        "incoming delivery"
    );
}

/// Prefer the SHA-256 header when a sender supplies both.
fn signature_header(headers: &HeaderMap) -> Option<String> {
    SignatureScheme::ALL
        .into_iter()
        .find_map(|scheme| header_string(headers, scheme.header_name()))
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Install the global subscriber. `RUST_LOG` overrides the `info` default.
///
/// Records from the `log` facade (used by the deploy pipeline) are bridged in.
pub fn init_tracing(log_file: Option<&Path>, format: LogFormat) -> Result<(), DaemonError> {
    use tracing_subscriber::fmt::writer::BoxMakeWriter;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (writer, ansi) = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| io_err(path, e))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(ansi)
        .with_writer(writer);
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    Ok(())
}
