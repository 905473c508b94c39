//! Analysis module - Reconstruct asset flows from a single transaction

use crate::Result;
use crate::data_source::{ResourceResolver, Transaction, TransactionSource, VersionOrHash};

pub mod balance;
pub mod correlator;
pub mod extractor;
pub mod graph;
pub mod store_info;

// Re-export key types
pub use balance::{BalanceChange, compute_balance_changes};
pub use correlator::{TransferEvent, TransferKind, correlate, extract_transfer_events};
pub use extractor::{ExtractedChanges, FungibleStoreRecord, OwnershipMap, extract_changes};
pub use graph::{OrphanEvent, Orphans, Transfer, TransferGraph};
pub use store_info::{StoreInfo, StoreMeta};

/// Fetch a transaction and resolve its withdraw/deposit events
pub async fn fetch_transfer_events<T, R>(
    source: &T,
    resolver: &R,
    id: &VersionOrHash,
) -> Result<(Transaction, Vec<TransferEvent>)>
where
    T: TransactionSource + ?Sized,
    R: ResourceResolver + ?Sized,
{
    let tx = source.get_transaction(id).await?;
    let store_info = extract_changes(&tx.changes).store_info();
    let events = extract_transfer_events(&tx.events, &store_info, resolver, tx.version).await;
    Ok((tx, events))
}

/// Fetch a transaction and build its transfer graph
pub async fn build_transfer_graph<T, R>(
    source: &T,
    resolver: &R,
    id: &VersionOrHash,
) -> Result<(Transaction, TransferGraph)>
where
    T: TransactionSource + ?Sized,
    R: ResourceResolver + ?Sized,
{
    let tx = source.get_transaction(id).await?;
    let store_info = extract_changes(&tx.changes).store_info();
    let graph = correlate(&tx.events, &store_info, resolver, tx.version).await;

    tracing::info!(
        "Version {}: {} transfers, {} orphans in, {} orphans out",
        tx.version,
        graph.transfers.len(),
        graph.orphans.incoming.len(),
        graph.orphans.outgoing.len()
    );

    Ok((tx, graph))
}
