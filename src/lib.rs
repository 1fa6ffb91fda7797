//! seed-mutator library crate
//!
//! This module exports the mutation catalog and engine, the typed workload
//! model, and the webhook and health servers.

pub mod config;
pub mod health;
pub mod mutations;
pub mod webhook;
pub mod workload;

pub use config::Config;
pub use health::{run_health_server, HealthState, HEALTH_PORT};
pub use mutations::{
    apply_all, EnabledMutations, Mutation, MutationOutcome, UnknownMutationError,
};
pub use webhook::{run_webhook_server, WebhookError, WebhookState, WEBHOOK_PORT};
pub use workload::Workload;
