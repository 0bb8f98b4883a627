use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::signal;

use gitward_core::{GitwardConfig, OptionStore, WEBHOOK_KEY_OPTION};
use gitward_sync::SyncCoordinator;

use crate::error::{io_err, DaemonError};
use crate::gate::{WebhookGate, WebhookRequest, WebhookResponse};

#[derive(Clone)]
struct AppState {
    gate: Arc<WebhookGate>,
    options: OptionStore,
}

#[derive(Debug, Deserialize)]
struct WebhookQuery {
    key: Option<String>,
}

/// Log output shape for [`init_tracing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Build the webhook router: `GET|POST /` and `GET|POST /webhook`.
pub fn router(gate: Arc<WebhookGate>, options: OptionStore) -> Router {
    Router::new()
        .route("/", get(handle_webhook).post(handle_webhook))
        .route("/webhook", get(handle_webhook).post(handle_webhook))
        .with_state(AppState { gate, options })
}

/// `GET|POST /?key=<secret>`
///
/// The stored key is read fresh on every call so rotating it never needs a
/// restart. Gate work (lock wait, git subprocesses) runs on the blocking pool.
async fn handle_webhook(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    headers: HeaderMap,
) -> Response {
    let request = WebhookRequest {
        key: query.key,
        host: headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    let result = tokio::task::spawn_blocking(move || {
        let stored_key = state.options.get_string(WEBHOOK_KEY_OPTION)?;
        Ok::<_, gitward_core::CoreError>(state.gate.handle(&request, &stored_key))
    })
    .await;

    let response = match result {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => {
            tracing::error!(error = %err, "could not read webhook key");
            WebhookResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: err.to_string(),
            }
        }
        Err(err) => {
            tracing::error!(error = %err, "webhook task failed");
            WebhookResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "webhook task failed".to_string(),
            }
        }
    };
    (response.status, response.body).into_response()
}

/// Start the webhook server and block the current thread until it exits.
pub fn start_blocking(home: &Path, config: GitwardConfig, listen: Option<String>) -> Result<(), DaemonError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(home.to_path_buf(), config, listen))
}

/// Serve webhook calls for the repository described by `config` until ctrl-c
/// or SIGTERM. `listen` overrides `config.listen`.
pub async fn run(home: PathBuf, config: GitwardConfig, listen: Option<String>) -> Result<(), DaemonError> {
    let addr = listen.unwrap_or_else(|| config.listen.clone());
    let listen_addr: SocketAddr = addr.parse().map_err(|source| DaemonError::InvalidListen {
        addr: addr.clone(),
        source,
    })?;

    let coordinator = Arc::new(SyncCoordinator::from_config(&home, &config));
    let gate = WebhookGate::new(coordinator, config.min_git_version.clone())
        .with_server_name(config.server_name.clone());
    let app = router(Arc::new(gate), OptionStore::at(&home));

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .map_err(|e| io_err(addr.as_str(), e))?;
    tracing::info!(%listen_addr, repo = %config.repo_path.display(), "webhook server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DaemonError::Server(e.to_string()))?;

    tracing::info!("webhook server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::warn!(error = %err, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

/// Install the global subscriber, writing to stderr. `RUST_LOG` overrides
/// `default_level`. Records from the `log` facade used by the library crates
/// are forwarded too.
pub fn init_tracing(default_level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
