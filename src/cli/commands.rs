//! CLI command implementations
//!
//! This module contains the implementation for each CLI command.

use crate::Config;
use crate::data_source::{DataSource, create_data_source};

/// Build the data source for a command run
fn data_source(config: &Config) -> crate::Result<Box<dyn DataSource>> {
    tracing::debug!("Using Aptos REST API at {}", config.node.rpc_url);
    create_data_source(config)
}

/// Transfers command implementation
pub mod transfers {
    use super::*;
    use crate::Result;
    use crate::analysis::fetch_transfer_events;
    use crate::cli::ListFormat;
    use crate::cli::output;
    use crate::data_source::VersionOrHash;

    /// Execute the transfers command
    pub async fn execute(version_or_hash: &str, format: ListFormat, config: &Config) -> Result<()> {
        let id = VersionOrHash::parse(version_or_hash)?;
        let source = data_source(config)?;

        tracing::info!("Fetching transaction {}", id);
        let (tx, events) = fetch_transfer_events(&*source, &*source, &id).await?;
        tracing::info!("Found {} transfer events", events.len());

        let mut stdout = std::io::stdout();
        match format {
            ListFormat::Json => output::output_json(&mut stdout, &events),
            ListFormat::Table => output::output_transfer_events_table(&mut stdout, &tx, &events),
        }
    }
}

/// Graph command implementation
pub mod graph {
    use super::*;
    use crate::Result;
    use crate::analysis::build_transfer_graph;
    use crate::cli::GraphFormat;
    use crate::cli::output;
    use crate::data_source::VersionOrHash;
    use std::io::Write;

    /// Execute the graph command
    pub async fn execute(version_or_hash: &str, format: GraphFormat, config: &Config) -> Result<()> {
        let id = VersionOrHash::parse(version_or_hash)?;
        let source = data_source(config)?;

        tracing::info!("Building transfer graph for {}", id);
        let (tx, graph) = build_transfer_graph(&*source, &*source, &id).await?;

        let mut stdout = std::io::stdout();
        match format {
            GraphFormat::Json => output::output_json(&mut stdout, &graph),
            GraphFormat::Pretty => output::output_graph_pretty(&mut stdout, &tx, &graph),
            GraphFormat::Dot => {
                write!(stdout, "{}", graph.to_dot())?;
                Ok(())
            }
        }
    }
}

/// Balance change command implementation
pub mod balance_change {
    use super::*;
    use crate::Result;
    use crate::analysis::compute_balance_changes;
    use crate::cli::ListFormat;
    use crate::cli::output;
    use crate::data_source::models::parse_version;

    /// Execute the balance-change command
    pub async fn execute(version: &str, format: ListFormat, config: &Config) -> Result<()> {
        let version = parse_version(version)?;
        let source = data_source(config)?;

        tracing::info!("Computing balance changes for version {}", version);
        let changes = compute_balance_changes(&*source, &*source, version).await?;

        let mut stdout = std::io::stdout();
        match format {
            ListFormat::Json => output::output_json(&mut stdout, &changes),
            ListFormat::Table => output::output_balance_table(&mut stdout, version, &changes),
        }
    }
}
