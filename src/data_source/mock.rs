//! In-memory data source for testing and development
//!
//! Holds transactions by version and resources keyed by
//! `(address, resource type, version)`, and counts resolver calls so tests
//! can check how often the analysis goes back to the ledger.

use super::{MoveResource, ResourceResolver, Transaction, TransactionSource, VersionOrHash};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock data source providing canned transactions and resources
#[derive(Debug, Default)]
pub struct MockDataSource {
    transactions: HashMap<u64, Transaction>,
    resources: HashMap<(String, String, u64), MoveResource>,
    failing_addresses: HashSet<String>,
    resource_calls: AtomicUsize,
    requested: Mutex<Vec<(String, String, u64)>>,
}

impl MockDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transaction(mut self, tx: Transaction) -> Self {
        self.transactions.insert(tx.version, tx);
        self
    }

    pub fn with_resource(
        mut self,
        address: &str,
        version: u64,
        resource: MoveResource,
    ) -> Self {
        self.resources.insert(
            (address.to_string(), resource.resource_type.clone(), version),
            resource,
        );
        self
    }

    /// Make every resource lookup for `address` fail with a transport error
    pub fn with_failing_address(mut self, address: &str) -> Self {
        self.failing_addresses.insert(address.to_string());
        self
    }

    /// Number of `get_resource` calls served so far
    pub fn resource_calls(&self) -> usize {
        self.resource_calls.load(Ordering::SeqCst)
    }

    /// Every `(address, resource type, version)` requested, in call order
    pub fn requested(&self) -> Vec<(String, String, u64)> {
        self.requested
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TransactionSource for MockDataSource {
    async fn get_transaction(&self, id: &VersionOrHash) -> Result<Transaction> {
        let found = match id {
            VersionOrHash::Version(version) => self.transactions.get(version),
            VersionOrHash::Hash(hash) => self.transactions.values().find(|tx| &tx.hash == hash),
        };
        found
            .cloned()
            .ok_or_else(|| Error::not_found(format!("transaction {}", id)))
    }
}

#[async_trait]
impl ResourceResolver for MockDataSource {
    async fn get_resource(
        &self,
        address: &str,
        resource_type: &str,
        version: u64,
    ) -> Result<Option<MoveResource>> {
        self.resource_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push((address.to_string(), resource_type.to_string(), version));
        }

        if self.failing_addresses.contains(address) {
            return Err(Error::transport(format!("connection reset fetching {}", address)));
        }

        Ok(self
            .resources
            .get(&(address.to_string(), resource_type.to_string(), version))
            .cloned())
    }
}
