//! Fungible store metadata and the per-run lookup cache

use crate::data_source::{AccountAddress, FUNGIBLE_STORE, OBJECT_CORE, ResourceResolver};
use indexmap::IndexMap;
use indexmap::map::Entry;

/// Owner and asset of a fungible store, either possibly unknown
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreMeta {
    pub owner: Option<String>,
    pub asset: Option<String>,
}

impl StoreMeta {
    pub fn new(owner: Option<String>, asset: Option<String>) -> Self {
        Self { owner, asset }
    }

    /// Owner address, or an empty string when unresolved
    pub fn owner_or_empty(&self) -> &str {
        self.owner.as_deref().unwrap_or_default()
    }

    /// Asset id, or an empty string when unresolved
    pub fn asset_or_empty(&self) -> &str {
        self.asset.as_deref().unwrap_or_default()
    }
}

/// Store address -> metadata, in the order stores were first seen
///
/// An address, once recorded, is never overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreInfo {
    entries: IndexMap<String, StoreMeta>,
}

impl StoreInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, store: &str) -> Option<&StoreMeta> {
        self.entries.get(store)
    }

    /// Record `meta` for `store` unless it is already known; returns whether it was inserted
    pub fn insert(&mut self, store: impl Into<String>, meta: StoreMeta) -> bool {
        match self.entries.entry(store.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(meta);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StoreMeta)> {
        self.entries.iter()
    }
}

impl FromIterator<(String, StoreMeta)> for StoreInfo {
    fn from_iter<I: IntoIterator<Item = (String, StoreMeta)>>(iter: I) -> Self {
        let mut info = StoreInfo::new();
        for (store, meta) in iter {
            info.insert(store, meta);
        }
        info
    }
}

/// Read-through cache over `StoreInfo` bound to one ledger version
///
/// Stores missing from the seed are looked up once through the resolver
/// and remembered for the rest of the run, whatever the outcome.
pub struct StoreCache<'a, R: ?Sized> {
    info: StoreInfo,
    resolver: &'a R,
    version: u64,
}

impl<'a, R: ResourceResolver + ?Sized> StoreCache<'a, R> {
    pub fn new(info: StoreInfo, resolver: &'a R, version: u64) -> Self {
        Self {
            info,
            resolver,
            version,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Metadata for `store`, querying the resolver on first miss
    pub async fn resolve(&mut self, store: &str) -> StoreMeta {
        if let Some(meta) = self.info.get(store) {
            return meta.clone();
        }

        let meta = query_store_meta(self.resolver, store, self.version).await;
        self.info.insert(store, meta.clone());
        meta
    }

    pub fn into_inner(self) -> StoreInfo {
        self.info
    }
}

/// Look up owner and asset of a store that this transaction did not write
///
/// Failures degrade the affected field to `None`.
pub async fn query_store_meta<R: ResourceResolver + ?Sized>(
    resolver: &R,
    store: &str,
    version: u64,
) -> StoreMeta {
    if let Err(e) = AccountAddress::parse_relaxed(store) {
        tracing::debug!("Not resolving store {:?}: {}", store, e);
        return StoreMeta::default();
    }

    tracing::debug!("Resolving store {} at version {}", store, version);
    let (object_core, fungible_store) = tokio::join!(
        resolver.get_resource(store, OBJECT_CORE, version),
        resolver.get_resource(store, FUNGIBLE_STORE, version),
    );

    let owner = match object_core {
        Ok(Some(resource)) => resource.object_owner(),
        Ok(None) => {
            tracing::debug!("No ObjectCore for store {} at version {}", store, version);
            None
        }
        Err(e) => {
            tracing::warn!("Failed to resolve owner of store {}: {}", store, e);
            None
        }
    };

    let asset = match fungible_store {
        Ok(Some(resource)) => resource.fungible_store().and_then(|fs| fs.asset),
        Ok(None) => {
            tracing::debug!("No FungibleStore for store {} at version {}", store, version);
            None
        }
        Err(e) => {
            tracing::warn!("Failed to resolve asset of store {}: {}", store, e);
            None
        }
    };

    StoreMeta::new(owner, asset)
}
