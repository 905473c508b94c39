//! Data source module - Abstraction for fetching Aptos ledger data
//!
//! The analysis only needs two capabilities from the outside world:
//! fetching a committed transaction and fetching a resource as it was at a
//! given ledger version. Both are modelled as traits so the REST client can
//! be swapped for an in-memory source in tests.

use crate::{Config, Result};
use async_trait::async_trait;

pub mod aptos;
pub mod cache;
pub mod mock;
pub mod models;

// Re-export models
pub use models::{
    AccountAddress, DEPOSIT_EVENT, Event, FUNGIBLE_STORE, FungibleStoreData, MoveResource,
    OBJECT_CORE, StateChange, Transaction, VersionOrHash, WITHDRAW_EVENT, WriteResource,
};

/// Fetches committed transactions
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Fetch a transaction with its full change set and event log
    ///
    /// Fails with `Error::NotFound` if the transaction does not exist and
    /// `Error::Transport` on network or API failure.
    async fn get_transaction(&self, id: &VersionOrHash) -> Result<Transaction>;
}

/// Fetches account resources at a historical ledger version
#[async_trait]
pub trait ResourceResolver: Send + Sync {
    /// Returns `Ok(None)` when the resource does not exist at `version`
    async fn get_resource(
        &self,
        address: &str,
        resource_type: &str,
        version: u64,
    ) -> Result<Option<MoveResource>>;
}

/// A data source providing both capabilities
pub trait DataSource: TransactionSource + ResourceResolver {}

impl<T: TransactionSource + ResourceResolver> DataSource for T {}

/// Create the REST data source described by the configuration
pub fn create_data_source(config: &Config) -> Result<Box<dyn DataSource>> {
    let mut client = aptos::AptosClient::new(&config.node.rpc_url, config.request_timeout())?;
    if config.cache.enabled {
        client = client.with_cache(cache::DataSourceCache::new(
            config.cache_ttl(),
            Some(config.cache_directory()),
        ));
    }
    Ok(Box::new(client))
}
