//! Webhook gate and the HTTP server that exposes it.

mod error;
pub mod gate;
mod server;

pub use error::DaemonError;
pub use gate::{authorize, GateError, WebhookGate, WebhookRequest, WebhookResponse};
pub use server::{init_tracing, router, run, start_blocking, LogFormat};
