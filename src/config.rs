//! Command-line configuration.
//!
//! All settings are flags; there is no config file and nothing is reloaded
//! at runtime. Unknown mutation names are rejected before the server starts.

use std::path::PathBuf;

use clap::Parser;

use crate::webhook::WEBHOOK_PORT;

/// Mutating admission webhook for Gardener seed cluster workloads
#[derive(Parser, Debug, Clone)]
#[command(name = "seed-mutator", version)]
pub struct Config {
    /// TLS certificate file (PEM)
    #[arg(long, default_value = "/etc/seed-mutator/cert.pem")]
    pub tls_cert_file: PathBuf,

    /// TLS private key file (PEM)
    #[arg(long, default_value = "/etc/seed-mutator/key.pem")]
    pub tls_key_file: PathBuf,

    /// The mutations to apply (comma-separated, can be
    /// nginx-ingress-controller|gardenlet|single-node-seed|gardener-resource-manager)
    #[arg(long, value_delimiter = ',', default_value = "nginx-ingress-controller")]
    pub mutations: Vec<String>,

    /// Webhook listen port
    #[arg(long, default_value_t = WEBHOOK_PORT)]
    pub port: u16,
}
