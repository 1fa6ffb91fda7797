//! seed-mutator - a mutating admission webhook for Gardener seed workloads.
//!
//! This is the main entry point that:
//! - Initializes structured logging
//! - Parses flags and validates the enabled mutations (fatal if unknown)
//! - Starts the health server and the TLS webhook server

use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};

use seed_mutator::config::Config;
use seed_mutator::health::{run_health_server, HealthState};
use seed_mutator::mutations::EnabledMutations;
use seed_mutator::webhook::run_webhook_server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("seed_mutator=info".parse()?),
        )
        .json()
        .init();

    let config = Config::parse();

    // Unknown mutation names abort startup before anything is served.
    let enabled = EnabledMutations::from_names(&config.mutations)?;
    info!(mutations = %enabled, "starting seed-mutator");

    // Create shared health state
    let health_state = Arc::new(HealthState::new());

    // Start health server immediately (probes should work during TLS setup)
    let health_handle = {
        let health_state = health_state.clone();
        tokio::spawn(async move {
            if let Err(e) = run_health_server(health_state).await {
                error!("health server error: {}", e);
            }
        })
    };

    let webhook_handle = {
        let health_state = health_state.clone();
        let cert_path = config.tls_cert_file.clone();
        let key_path = config.tls_key_file.clone();
        let port = config.port;
        tokio::spawn(async move {
            if let Err(e) =
                run_webhook_server(enabled, health_state, cert_path, key_path, port).await
            {
                error!("webhook server error: {}", e);
            }
        })
    };

    health_state.set_ready(true).await;

    // Wait for any task to complete (or fail), or shutdown signal
    tokio::select! {
        result = webhook_handle => {
            if let Err(e) = result {
                error!("webhook server task panicked: {}", e);
            }
        }
        result = health_handle => {
            if let Err(e) = result {
                error!("health server task panicked: {}", e);
            }
        }
        // Handle graceful shutdown on SIGTERM or SIGINT
        _ = shutdown_signal() => {
            info!("received shutdown signal, shutting down");

            // Mark as not ready so the endpoints object drops us first
            health_state.set_ready(false).await;
        }
    }

    info!("seed-mutator stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
///
/// Note: Signal handler setup failures are fatal - the webhook cannot shut
/// down gracefully without them. Using expect() here is intentional.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
