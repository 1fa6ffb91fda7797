//! Webhook module for mutating admission requests.
//!
//! The server half owns TLS and routing; the mutate half turns a decoded
//! admission request into an allow-with-patch or allow-unchanged response.

pub mod mutate;
mod server;

pub use server::{
    create_webhook_router, run_webhook_server, WebhookError, WebhookState, WEBHOOK_PORT,
};

// Re-export kube-rs admission types for contract testing
pub use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
