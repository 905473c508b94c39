//! CLI module
//!
//! This module defines the command-line interface using clap and implements
//! the command execution logic.

use crate::{Config, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;
pub mod output;

/// Aptos transaction flow analyzer CLI
#[derive(Parser, Debug)]
#[command(name = "aptos-flow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Aptos REST API base URL (overrides config)
    #[arg(long, global = true, env = "APTOS_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Cache transaction and resource responses on disk
    #[arg(long, global = true)]
    pub cache: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List fungible asset withdraw/deposit events of a transaction
    Transfers {
        /// Transaction version or hash
        version_or_hash: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        output: ListFormat,
    },

    /// Pair withdraws with deposits to show who sent what to whom
    Graph {
        /// Transaction version or hash
        version_or_hash: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        output: GraphFormat,
    },

    /// Show fungible store balance changes between a version and the one before it
    BalanceChange {
        /// Transaction version
        version: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        output: ListFormat,
    },
}

/// Output formats for event and balance lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// JSON output
    Json,
    /// Plain text table
    Table,
}

/// Output formats for the transfer graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    /// JSON output
    Json,
    /// Transfers grouped by sender
    Pretty,
    /// DOT format (Graphviz)
    Dot,
}

/// Execute the CLI command
pub async fn execute(args: Cli, config: Config) -> Result<()> {
    match args.command {
        Commands::Transfers {
            version_or_hash,
            output,
        } => commands::transfers::execute(&version_or_hash, output, &config).await,
        Commands::Graph {
            version_or_hash,
            output,
        } => commands::graph::execute(&version_or_hash, output, &config).await,
        Commands::BalanceChange { version, output } => {
            commands::balance_change::execute(&version, output, &config).await
        }
    }
}
