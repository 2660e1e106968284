//! Reserve snapshots produced by the external on-chain scanner
//!
//! The scanner writes snake_case keys and sometimes a numeric epoch id; both
//! are normalized here, at the edge.

use crate::error::{EvaluatorError, EvaluatorResult};
use serde::{Deserialize, Deserializer, Serialize};
use solvency_primitives::Amount;
use tracing::debug;

/// Balance held by one custody address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveAddress {
    pub address: String,
    #[serde(alias = "balance_wei")]
    pub balance_wei: Amount,
}

/// Reserves measured for one epoch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveSnapshot {
    #[serde(alias = "epoch_id", deserialize_with = "epoch_id_string")]
    pub epoch_id: String,
    pub chain: String,
    #[serde(alias = "chain_id")]
    pub chain_id: u64,
    /// Unix epoch seconds
    #[serde(default)]
    pub timestamp: u64,
    pub addresses: Vec<ReserveAddress>,
    #[serde(alias = "reserves_total_wei", alias = "total_wei")]
    pub reserves_total_wei: Amount,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EpochIdRepr {
    Text(String),
    Number(u64),
}

fn epoch_id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match EpochIdRepr::deserialize(deserializer)? {
        EpochIdRepr::Text(s) => s,
        EpochIdRepr::Number(n) => n.to_string(),
    })
}

impl ReserveSnapshot {
    /// Build a snapshot whose declared total is the per-address sum
    pub fn new(
        epoch_id: impl Into<String>,
        chain: impl Into<String>,
        chain_id: u64,
        timestamp: u64,
        addresses: Vec<ReserveAddress>,
    ) -> Self {
        let reserves_total_wei = addresses.iter().map(|a| &a.balance_wei).sum();
        Self {
            epoch_id: epoch_id.into(),
            chain: chain.into(),
            chain_id,
            timestamp,
            addresses,
            reserves_total_wei,
        }
    }

    /// Declared total, cross-checked against the per-address sum
    pub fn total(&self) -> EvaluatorResult<Amount> {
        if self.addresses.is_empty() {
            return Err(EvaluatorError::InvalidReserves(
                "snapshot lists no addresses".to_string(),
            ));
        }
        let computed: Amount = self.addresses.iter().map(|a| &a.balance_wei).sum();
        if computed != self.reserves_total_wei {
            return Err(EvaluatorError::ReserveTotalMismatch {
                declared: self.reserves_total_wei.to_string(),
                computed: computed.to_string(),
            });
        }
        debug!(
            epoch_id = %self.epoch_id,
            addresses = self.addresses.len(),
            total = %computed,
            "reserve total verified"
        );
        Ok(computed)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> EvaluatorResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EvaluatorError::SerializationFailed(format!("JSON error: {}", e)))
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> EvaluatorResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| EvaluatorError::DeserializationFailed(format!("JSON error: {}", e)))
    }
}
