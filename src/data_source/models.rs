//! Core data models for Aptos transactions
//!
//! The REST API returns loosely shaped JSON. These types keep only the
//! fields the analysis needs; a record whose shape does not match decodes
//! to an "absent" value instead of failing the whole transaction.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Object ownership resource
pub const OBJECT_CORE: &str = "0x1::object::ObjectCore";

/// Fungible asset store resource
pub const FUNGIBLE_STORE: &str = "0x1::fungible_asset::FungibleStore";

pub const WITHDRAW_EVENT: &str = "0x1::fungible_asset::Withdraw";
pub const DEPOSIT_EVENT: &str = "0x1::fungible_asset::Deposit";

/// Returns true for `FungibleStore` type tags, including long-form `0x0..01` addresses
pub fn is_fungible_store_type(resource_type: &str) -> bool {
    resource_type.ends_with("::fungible_asset::FungibleStore")
}

/// Parse a ledger version given on the command line
pub fn parse_version(input: &str) -> Result<u64> {
    input
        .trim()
        .parse::<u64>()
        .map_err(|e| Error::invalid_input(format!("invalid transaction version {:?}: {}", input, e)))
}

/// How a transaction is addressed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionOrHash {
    Version(u64),
    Hash(String),
}

impl VersionOrHash {
    /// Digits are a version, `0x`-prefixed hex is a hash
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
            return parse_version(input).map(VersionOrHash::Version);
        }

        match input.strip_prefix("0x") {
            Some(digits) if !digits.is_empty() && hex::decode(pad_even(digits)).is_ok() => {
                Ok(VersionOrHash::Hash(input.to_lowercase()))
            }
            _ => Err(Error::invalid_input(format!(
                "expected a transaction version or 0x-prefixed hash, got {:?}",
                input
            ))),
        }
    }
}

impl FromStr for VersionOrHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionOrHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VersionOrHash::Version(v) => write!(f, "{}", v),
            VersionOrHash::Hash(h) => write!(f, "{}", h),
        }
    }
}

fn pad_even(digits: &str) -> String {
    if digits.len() % 2 == 1 {
        format!("0{}", digits)
    } else {
        digits.to_string()
    }
}

/// 32-byte Aptos account address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountAddress([u8; 32]);

impl AccountAddress {
    /// Parse short (`0x1`) or long form, with or without the `0x` prefix
    pub fn parse_relaxed(input: &str) -> Result<Self> {
        let digits = input.trim();
        let digits = digits.strip_prefix("0x").unwrap_or(digits);
        if digits.is_empty() || digits.len() > 64 {
            return Err(Error::invalid_input(format!("invalid account address {:?}", input)));
        }

        let bytes = hex::decode(format!("{:0>64}", digits))
            .map_err(|e| Error::invalid_input(format!("invalid account address {:?}: {}", input, e)))?;

        let mut address = [0u8; 32];
        address.copy_from_slice(&bytes);
        Ok(Self(address))
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// A committed transaction, reduced to its change set and event log
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Ledger version
    pub version: u64,

    /// Transaction hash
    pub hash: String,

    /// Commit time in microseconds since the epoch
    pub timestamp_us: Option<u64>,

    /// State changes, in the order the API reports them
    pub changes: Vec<StateChange>,

    /// Emitted events, in emission order
    pub events: Vec<Event>,
}

#[derive(Deserialize)]
struct RawTransaction {
    #[serde(default)]
    version: Value,

    #[serde(default)]
    hash: String,

    #[serde(default)]
    timestamp: Value,

    #[serde(default)]
    changes: Vec<Value>,

    #[serde(default)]
    events: Vec<Value>,
}

impl Transaction {
    /// Decode a transaction from the REST API response body
    pub fn from_json(value: &Value) -> Result<Self> {
        let raw = RawTransaction::deserialize(value)?;

        let version = u64_field(&raw.version).ok_or_else(|| {
            Error::decode(format!("transaction {} has no committed version", raw.hash))
        })?;

        let events = raw
            .events
            .iter()
            .filter_map(|event| match Event::deserialize(event) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::debug!("Skipping malformed event in version {}: {}", version, e);
                    None
                }
            })
            .collect();

        Ok(Self {
            version,
            hash: raw.hash,
            timestamp_us: u64_field(&raw.timestamp),
            changes: raw.changes.iter().map(StateChange::decode).collect(),
            events,
        })
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let micros = i64::try_from(self.timestamp_us?).ok()?;
        DateTime::from_timestamp_micros(micros)
    }
}

/// u64 fields arrive as JSON strings, occasionally as numbers
fn u64_field(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// One entry of a transaction's change set
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    WriteResource(WriteResource),
    /// Any other change kind, or a `write_resource` with an unexpected shape
    Other,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawChange {
    WriteResource(WriteResource),
    #[serde(other)]
    Other,
}

impl StateChange {
    pub fn decode(value: &Value) -> Self {
        match RawChange::deserialize(value) {
            Ok(RawChange::WriteResource(write)) => StateChange::WriteResource(write),
            Ok(RawChange::Other) => StateChange::Other,
            Err(e) => {
                tracing::debug!("Skipping malformed change record: {}", e);
                StateChange::Other
            }
        }
    }

    pub fn as_write_resource(&self) -> Option<&WriteResource> {
        match self {
            StateChange::WriteResource(write) => Some(write),
            StateChange::Other => None,
        }
    }
}

/// A resource written at an address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteResource {
    pub address: String,
    pub data: MoveResource,
}

/// A decoded Move resource: its type tag and field map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveResource {
    #[serde(rename = "type")]
    pub resource_type: String,

    #[serde(default)]
    pub data: Value,
}

/// Fields of a `FungibleStore` that the analysis reads
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FungibleStoreData {
    /// Metadata object address identifying the asset
    pub asset: Option<String>,

    /// Balance as a decimal string
    pub balance: Option<String>,
}

impl MoveResource {
    /// Owner field of an `ObjectCore`
    pub fn object_owner(&self) -> Option<String> {
        if self.resource_type != OBJECT_CORE {
            return None;
        }
        self.data.get("owner")?.as_str().map(str::to_string)
    }

    /// Asset and balance of a `FungibleStore`
    pub fn fungible_store(&self) -> Option<FungibleStoreData> {
        if !is_fungible_store_type(&self.resource_type) {
            return None;
        }
        let fields = self.data.as_object()?;

        Some(FungibleStoreData {
            asset: fields
                .get("metadata")
                .and_then(|m| m.get("inner"))
                .and_then(Value::as_str)
                .map(str::to_string),
            balance: fields
                .get("balance")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// An emitted event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub type_tag: String,

    #[serde(default)]
    pub data: Value,
}

impl Event {
    /// `store` and `amount` of a fungible asset Withdraw/Deposit payload
    pub fn store_and_amount(&self) -> Option<(&str, &str)> {
        let store = self.data.get("store")?.as_str()?;
        let amount = self.data.get("amount")?.as_str()?;
        Some((store, amount))
    }
}
