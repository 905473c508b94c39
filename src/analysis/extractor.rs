//! State-change extraction
//!
//! Reduces a transaction's change set to object ownership and fungible store
//! records. Ownership is collected in a first full pass because a store's
//! `ObjectCore` can appear anywhere in the change list relative to the store
//! itself.

use super::store_info::{StoreInfo, StoreMeta};
use crate::data_source::StateChange;
use std::collections::HashMap;

/// Object address -> owning account
pub type OwnershipMap = HashMap<String, String>;

/// A fungible store written by the transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FungibleStoreRecord {
    pub address: String,
    pub owner: Option<String>,
    pub asset: Option<String>,
    /// Post-transaction balance as a decimal string
    pub balance: Option<String>,
}

/// Output of the extractor for one transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedChanges {
    pub ownership: OwnershipMap,
    /// Stores in change-set order
    pub stores: Vec<FungibleStoreRecord>,
}

impl ExtractedChanges {
    /// Seed for the event correlator
    pub fn store_info(&self) -> StoreInfo {
        self.stores
            .iter()
            .map(|store| {
                (
                    store.address.clone(),
                    StoreMeta::new(store.owner.clone(), store.asset.clone()),
                )
            })
            .collect()
    }
}

/// Collect every `ObjectCore` owner written by the change set
pub fn extract_ownership(changes: &[StateChange]) -> OwnershipMap {
    changes
        .iter()
        .filter_map(StateChange::as_write_resource)
        .filter_map(|write| {
            write
                .data
                .object_owner()
                .map(|owner| (write.address.clone(), owner))
        })
        .collect()
}

/// Run both passes over the change set
pub fn extract_changes(changes: &[StateChange]) -> ExtractedChanges {
    let ownership = extract_ownership(changes);

    let stores = changes
        .iter()
        .filter_map(StateChange::as_write_resource)
        .filter_map(|write| {
            let store = write.data.fungible_store()?;
            Some(FungibleStoreRecord {
                address: write.address.clone(),
                owner: ownership.get(&write.address).cloned(),
                asset: store.asset,
                balance: store.balance,
            })
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        "Extracted {} owners and {} fungible stores from {} changes",
        ownership.len(),
        stores.len(),
        changes.len()
    );

    ExtractedChanges { ownership, stores }
}
