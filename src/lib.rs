//! Aptos Transaction Flow Analyzer
//!
//! Reconstructs fungible asset movements from a single committed Aptos
//! transaction.
//!
//! This library provides functionality for:
//! - Fetching transactions and historical resources from the Aptos REST API (or mock data)
//! - Extracting store ownership and balances from a transaction's change set
//! - Pairing withdraw and deposit events into sender → receiver transfers
//! - Computing per-store balance deltas against the previous ledger version

pub mod analysis;
pub mod cli;
pub mod config;
pub mod data_source;
pub mod error;

pub use config::Config;
pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging with the given log level
///
/// `RUST_LOG` takes precedence. Logs go to stderr so stdout stays parseable.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
