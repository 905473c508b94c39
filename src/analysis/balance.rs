//! Balance delta calculation
//!
//! Compares every fungible store a transaction wrote against the same store
//! at the previous ledger version.

use super::extractor::extract_changes;
use crate::data_source::{
    AccountAddress, FUNGIBLE_STORE, ResourceResolver, TransactionSource, VersionOrHash,
};
use crate::{Result, ensure_input};
use num_bigint::BigInt;
use num_traits::Zero;
use serde::Serialize;

/// Balance of one fungible store before and after a transaction
///
/// `change` is always `balance_after - balance_before`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceChange {
    account: String,
    fungible_store: String,
    asset: String,
    balance_before: String,
    balance_after: String,
    change: String,
}

impl BalanceChange {
    /// Returns `None` if either balance is not a decimal integer
    pub fn new(
        account: impl Into<String>,
        fungible_store: impl Into<String>,
        asset: impl Into<String>,
        balance_before: impl Into<String>,
        balance_after: impl Into<String>,
    ) -> Option<Self> {
        let balance_before = balance_before.into();
        let balance_after = balance_after.into();
        let change = balance_delta(&balance_before, &balance_after)?;

        Some(Self {
            account: account.into(),
            fungible_store: fungible_store.into(),
            asset: asset.into(),
            balance_before,
            balance_after,
            change: change.to_string(),
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn fungible_store(&self) -> &str {
        &self.fungible_store
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn balance_before(&self) -> &str {
        &self.balance_before
    }

    pub fn balance_after(&self) -> &str {
        &self.balance_after
    }

    pub fn change(&self) -> &str {
        &self.change
    }

    pub fn is_zero(&self) -> bool {
        self.change == "0"
    }
}

/// `after - before` over unbounded integers
pub fn balance_delta(before: &str, after: &str) -> Option<BigInt> {
    let before: BigInt = before.trim().parse().ok()?;
    let after: BigInt = after.trim().parse().ok()?;
    Some(after - before)
}

/// Balance changes of every fungible store written at `version`
///
/// Stores are reported in change-set order; stores whose balance did not
/// change are left out. A store missing at `version - 1` is new and starts
/// from zero.
pub async fn compute_balance_changes<T, R>(
    source: &T,
    resolver: &R,
    version: u64,
) -> Result<Vec<BalanceChange>>
where
    T: TransactionSource + ?Sized,
    R: ResourceResolver + ?Sized,
{
    ensure_input!(
        version >= 2,
        "cannot compute balance changes for version {}: no earlier version to compare against",
        version
    );

    let tx = source
        .get_transaction(&VersionOrHash::Version(version))
        .await?;
    let previous = version - 1;
    let extracted = extract_changes(&tx.changes);

    let mut changes = Vec::new();
    for store in &extracted.stores {
        let Some(balance_after) = store.balance.as_deref() else {
            tracing::debug!("Store {} has no balance field, skipping", store.address);
            continue;
        };
        if let Err(e) = AccountAddress::parse_relaxed(&store.address) {
            tracing::debug!("Skipping store {:?}: {}", store.address, e);
            continue;
        }

        let balance_before = previous_balance(resolver, &store.address, previous).await;
        let Some(change) = BalanceChange::new(
            store.owner.clone().unwrap_or_default(),
            store.address.clone(),
            store.asset.clone().unwrap_or_default(),
            balance_before,
            balance_after,
        ) else {
            tracing::debug!(
                "Store {} has a non-numeric balance {:?}, skipping",
                store.address,
                balance_after
            );
            continue;
        };

        if change.is_zero() {
            continue;
        }
        changes.push(change);
    }

    tracing::info!(
        "Version {}: {} of {} stores changed balance",
        version,
        changes.len(),
        extracted.stores.len()
    );

    Ok(changes)
}

/// Balance of `store` at `version`, zero if absent or unreadable
async fn previous_balance<R: ResourceResolver + ?Sized>(
    resolver: &R,
    store: &str,
    version: u64,
) -> String {
    let found = match resolver.get_resource(store, FUNGIBLE_STORE, version).await {
        Ok(Some(resource)) => resource.fungible_store().and_then(|fs| fs.balance),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(
                "Failed to fetch balance of store {} at version {}: {}",
                store,
                version,
                e
            );
            None
        }
    };

    match found {
        Some(balance) if balance.trim().parse::<BigInt>().is_ok() => balance,
        _ => BigInt::zero().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::data_source::mock::MockDataSource;
    use crate::data_source::{MoveResource, OBJECT_CORE, StateChange, Transaction, WriteResource};
    use serde_json::json;

    fn store_change(address: &str, asset: &str, balance: &str) -> StateChange {
        StateChange::WriteResource(WriteResource {
            address: address.to_string(),
            data: MoveResource {
                resource_type: FUNGIBLE_STORE.to_string(),
                data: json!({ "balance": balance, "metadata": { "inner": asset } }),
            },
        })
    }

    fn owner_change(address: &str, owner: &str) -> StateChange {
        StateChange::WriteResource(WriteResource {
            address: address.to_string(),
            data: MoveResource {
                resource_type: OBJECT_CORE.to_string(),
                data: json!({ "owner": owner }),
            },
        })
    }

    fn store_resource(balance: &str) -> MoveResource {
        MoveResource {
            resource_type: FUNGIBLE_STORE.to_string(),
            data: json!({ "balance": balance, "metadata": { "inner": "0xapt" } }),
        }
    }

    fn transaction(version: u64, changes: Vec<StateChange>) -> Transaction {
        Transaction {
            version,
            hash: format!("0x{:x}", version),
            timestamp_us: None,
            changes,
            events: vec![],
        }
    }

    #[test]
    fn test_balance_delta() {
        assert_eq!(balance_delta("0", "500"), Some(BigInt::from(500)));
        assert_eq!(balance_delta("500", "120"), Some(BigInt::from(-380)));
        assert_eq!(balance_delta("10", "10"), Some(BigInt::zero()));
        assert_eq!(balance_delta("x", "10"), None);
    }

    #[test]
    fn test_delta_beyond_u128() {
        let huge = "340282366920938463463374607431768211456000";
        let change = BalanceChange::new("0xa", "0xs", "0xapt", "1", huge).unwrap();
        assert_eq!(change.change(), "340282366920938463463374607431768211455999");

        let change = BalanceChange::new("0xa", "0xs", "0xapt", huge, "0").unwrap();
        assert_eq!(change.change(), "-340282366920938463463374607431768211456000");
    }

    #[test]
    fn test_change_matches_after_minus_before() {
        for (before, after) in [("0", "7"), ("100", "40"), ("18446744073709551615", "18446744073709551616")] {
            let change = BalanceChange::new("", "0xs", "", before, after).unwrap();
            let expected = after.parse::<BigInt>().unwrap() - before.parse::<BigInt>().unwrap();
            assert_eq!(change.change(), expected.to_string());
        }
    }

    #[tokio::test]
    async fn test_versions_without_predecessor_rejected() {
        let source = MockDataSource::new();
        for version in [0, 1] {
            let err = compute_balance_changes(&source, &source, version)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
        }
    }

    #[tokio::test]
    async fn test_missing_transaction_is_fatal() {
        let source = MockDataSource::new();
        let err = compute_balance_changes(&source, &source, 10).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_balance_changes() {
        let source = MockDataSource::new()
            .with_transaction(transaction(
                10,
                vec![
                    store_change("0x51", "0xapt", "70"),
                    store_change("0x52", "0xapt", "30"),
                    store_change("0x53", "0xapt", "5"),
                    owner_change("0x51", "0xalice"),
                    owner_change("0x52", "0xbob"),
                ],
            ))
            .with_resource("0x51", 9, store_resource("100"))
            .with_resource("0x53", 9, store_resource("5"));

        let changes = compute_balance_changes(&source, &source, 10).await.unwrap();

        assert_eq!(
            changes,
            vec![
                BalanceChange::new("0xalice", "0x51", "0xapt", "100", "70").unwrap(),
                BalanceChange::new("0xbob", "0x52", "0xapt", "0", "30").unwrap(),
            ]
        );
        assert_eq!(changes[0].change(), "-30");
        assert_eq!(changes[1].balance_before(), "0");
        assert_eq!(changes[1].change(), "30");
        assert!(
            source
                .requested()
                .iter()
                .all(|(_, resource_type, version)| resource_type == FUNGIBLE_STORE && *version == 9)
        );
    }

    #[tokio::test]
    async fn test_failed_lookup_degrades_to_zero() {
        let source = MockDataSource::new()
            .with_transaction(transaction(
                4,
                vec![store_change("0xbad", "0xapt", "12"), store_change("0x52", "0xusd", "3")],
            ))
            .with_failing_address("0xbad")
            .with_resource("0x52", 3, store_resource("1"));

        let changes = compute_balance_changes(&source, &source, 4).await.unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].balance_before(), "0");
        assert_eq!(changes[0].change(), "12");
        assert_eq!(changes[0].account(), "");
        assert_eq!(changes[1].change(), "2");
        assert_eq!(changes[1].asset(), "0xusd");
    }

    #[tokio::test]
    async fn test_stores_without_usable_balance_skipped() {
        let source = MockDataSource::new().with_transaction(transaction(
            6,
            vec![
                StateChange::WriteResource(WriteResource {
                    address: "0x51".to_string(),
                    data: MoveResource {
                        resource_type: FUNGIBLE_STORE.to_string(),
                        data: json!({ "metadata": { "inner": "0xapt" } }),
                    },
                }),
                store_change("0x52", "0xapt", "ten"),
                store_change("not-an-address", "0xapt", "10"),
            ],
        ));

        let changes = compute_balance_changes(&source, &source, 6).await.unwrap();
        assert!(changes.is_empty());
        assert_eq!(source.resource_calls(), 1);
    }

    #[test]
    fn test_json_shape() {
        let change = BalanceChange::new("0xa", "0xs", "0xapt", "5", "3").unwrap();
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["balance_before"], "5");
        assert_eq!(json["balance_after"], "3");
        assert_eq!(json["change"], "-2");
        assert_eq!(json["fungible_store"], "0xs");
    }
}
