//! Admission webhook server.
//!
//! Serves the mutation endpoint over TLS. The API server is configured via a
//! MutatingWebhookConfiguration to POST AdmissionReview envelopes for
//! Deployments and StatefulSets to `/mutate`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{routing::post, Router};
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tracing::info;

use crate::health::HealthState;
use crate::mutations::EnabledMutations;
use crate::webhook::mutate;

/// Default webhook server port
pub const WEBHOOK_PORT: u16 = 9443;

/// Shared state for webhook handlers
pub struct WebhookState {
    /// Mutations enabled for the lifetime of the process
    pub enabled: EnabledMutations,
    /// Health state, used for request metrics
    pub health: Arc<HealthState>,
}

impl WebhookState {
    pub fn new(enabled: EnabledMutations, health: Arc<HealthState>) -> Self {
        Self { enabled, health }
    }
}

/// Errors that can occur when running the webhook server
#[derive(Debug, Error)]
pub enum WebhookError {
    /// TLS configuration error
    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    /// Server error
    #[error("webhook server error: {0}")]
    Server(String),
}

/// Create the webhook router
pub fn create_webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/mutate", post(mutate::mutate_handler))
        .with_state(state)
}

/// Run the webhook server with TLS
///
/// Binds to 0.0.0.0 on the given port and serves the `/mutate` endpoint.
/// TLS certificate and key are loaded from the given PEM files.
pub async fn run_webhook_server(
    enabled: EnabledMutations,
    health: Arc<HealthState>,
    cert_path: PathBuf,
    key_path: PathBuf,
    port: u16,
) -> Result<(), WebhookError> {
    let state = Arc::new(WebhookState::new(enabled, health));
    let app = create_webhook_router(state);

    let config = RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(|e| WebhookError::TlsConfig(e.to_string()))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(port, "webhook server listening with TLS");

    axum_server::bind_rustls(addr, config)
        .serve(app.into_make_service())
        .await
        .map_err(|e| WebhookError::Server(e.to_string()))?;

    Ok(())
}
