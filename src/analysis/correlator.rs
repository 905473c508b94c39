//! Event correlation
//!
//! Turns the event log into resolved withdraw/deposit events and pairs them
//! into transfers. Pairing is first-in-first-out per asset: a deposit takes
//! the earliest unmatched withdraw of the same asset, and the deposit's
//! amount is what the transfer reports. Routed swaps that withdraw and
//! deposit the same asset several times can be paired differently from the
//! economic flow.

use super::graph::{OrphanEvent, Transfer, TransferGraph};
use super::store_info::{StoreCache, StoreInfo};
use crate::data_source::{DEPOSIT_EVENT, Event, ResourceResolver, WITHDRAW_EVENT};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Direction of a fungible asset event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    Withdraw,
    Deposit,
}

impl TransferKind {
    pub fn from_event_type(type_tag: &str) -> Option<Self> {
        match type_tag {
            WITHDRAW_EVENT => Some(TransferKind::Withdraw),
            DEPOSIT_EVENT => Some(TransferKind::Deposit),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransferKind::Withdraw => "withdraw",
            TransferKind::Deposit => "deposit",
        }
    }
}

/// A withdraw or deposit with its store resolved to owner and asset
///
/// `account` and `asset` are empty when the store could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    #[serde(rename = "type")]
    pub kind: TransferKind,
    pub account: String,
    pub fungible_store: String,
    pub asset: String,
    pub amount: String,
}

/// Resolves fungible asset events against a store cache
pub struct EventCorrelator<'a, R: ?Sized> {
    cache: StoreCache<'a, R>,
}

impl<'a, R: ResourceResolver + ?Sized> EventCorrelator<'a, R> {
    /// Start from a snapshot of `store_info`; the snapshot itself is never modified
    pub fn new(store_info: &StoreInfo, resolver: &'a R, version: u64) -> Self {
        Self {
            cache: StoreCache::new(store_info.clone(), resolver, version),
        }
    }

    /// Withdraw and deposit events in log order; everything else is dropped
    pub async fn transfer_events(&mut self, events: &[Event]) -> Vec<TransferEvent> {
        let mut transfer_events = Vec::new();

        for event in events {
            let Some(kind) = TransferKind::from_event_type(&event.type_tag) else {
                continue;
            };
            let Some((store, amount)) = event.store_and_amount() else {
                tracing::debug!(
                    "Skipping {} event without store/amount at version {}",
                    kind.name(),
                    self.cache.version()
                );
                continue;
            };

            let meta = self.cache.resolve(store).await;
            transfer_events.push(TransferEvent {
                kind,
                account: meta.owner_or_empty().to_string(),
                fungible_store: store.to_string(),
                asset: meta.asset_or_empty().to_string(),
                amount: amount.to_string(),
            });
        }

        transfer_events
    }
}

/// Resolve the transfer events of an event log
pub async fn extract_transfer_events<R: ResourceResolver + ?Sized>(
    events: &[Event],
    store_info: &StoreInfo,
    resolver: &R,
    version: u64,
) -> Vec<TransferEvent> {
    EventCorrelator::new(store_info, resolver, version)
        .transfer_events(events)
        .await
}

/// Resolve and pair an event log into a transfer graph
pub async fn correlate<R: ResourceResolver + ?Sized>(
    events: &[Event],
    store_info: &StoreInfo,
    resolver: &R,
    version: u64,
) -> TransferGraph {
    let transfer_events = extract_transfer_events(events, store_info, resolver, version).await;
    pair_transfers(&transfer_events)
}

struct PendingWithdraw<'e> {
    account: &'e str,
    amount: &'e str,
}

/// Pair withdraws with deposits, first-in-first-out per asset
///
/// Withdraws still pending at the end become outgoing orphans, grouped by
/// asset in the order each asset first had a withdraw queued.
pub fn pair_transfers(events: &[TransferEvent]) -> TransferGraph {
    let mut graph = TransferGraph::new();
    let mut pending: IndexMap<&str, VecDeque<PendingWithdraw>> = IndexMap::new();

    for event in events {
        let asset = event.asset.as_str();
        match event.kind {
            TransferKind::Withdraw => {
                pending.entry(asset).or_default().push_back(PendingWithdraw {
                    account: &event.account,
                    amount: &event.amount,
                });
            }
            TransferKind::Deposit => {
                match pending.get_mut(asset).and_then(VecDeque::pop_front) {
                    Some(withdraw) => graph.transfers.push(Transfer {
                        from: withdraw.account.to_string(),
                        to: event.account.clone(),
                        asset: event.asset.clone(),
                        amount: event.amount.clone(),
                    }),
                    None => graph.orphans.incoming.push(OrphanEvent {
                        account: event.account.clone(),
                        asset: event.asset.clone(),
                        amount: event.amount.clone(),
                    }),
                }
            }
        }
    }

    for (asset, queue) in pending {
        graph
            .orphans
            .outgoing
            .extend(queue.into_iter().map(|withdraw| OrphanEvent {
                account: withdraw.account.to_string(),
                asset: asset.to_string(),
                amount: withdraw.amount.to_string(),
            }));
    }

    graph
}
