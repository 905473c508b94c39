//! Aptos Transaction Flow Analyzer

use aptos_flow::{Config, Result, VERSION, cli, init_logging};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let config = if let Some(config_path) = &args.config {
        Config::from_file(config_path)?
    } else {
        Config::load()?
    }
    .with_overrides(args.rpc_url.clone(), args.cache);

    init_logging(&config.logging.level);

    tracing::info!("Aptos Transaction Flow Analyzer v{}", VERSION);
    tracing::debug!("Parsed arguments: {:?}", args);
    tracing::debug!("Loaded configuration: {:?}", config);

    cli::execute(args, config).await?;

    Ok(())
}
