//! Webhook receiver: signature-checked handler + HTTP listener runtime.

pub mod defaults;
mod error;
pub mod handler;
mod server;

pub use error::DaemonError;
pub use handler::{HandlerResult, Rejection, WebhookEvent, WebhookHandler};
pub use server::{init_tracing, router, run, start_blocking, LogFormat, ServerConfig};
