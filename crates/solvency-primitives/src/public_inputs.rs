//! Canonical public inputs handed to the proof-generation collaborator
//!
//! The prover receives `{ liabilitiesRoot, liabilitiesTotal, epochId }`. Their
//! hash is computed over the RFC 8785 (JCS) canonical JSON form, so any
//! implementation that agrees on the field values agrees on the hash.

use crate::amount::{Amount, AmountError};
use crate::hash::Digest;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Domain separator for the public inputs hash
pub const DOMAIN_PUBLIC_INPUTS: &[u8] = b"SOLVENCY_PROOF_PUBLIC_INPUTS_V1";

/// Errors that can occur when handling public inputs
#[derive(Debug, Error)]
pub enum PublicInputsError {
    /// Invalid hex string in a public input field
    #[error("Invalid hex in {field}: {source}")]
    InvalidHex {
        field: &'static str,
        source: hex::FromHexError,
    },
    /// Invalid hex format (prefix, length or casing)
    #[error("Invalid hex format in {field}: {reason}")]
    InvalidHexFormat { field: &'static str, reason: String },
    /// Invalid decimal amount
    #[error("Invalid amount in {field}: {source}")]
    InvalidAmount {
        field: &'static str,
        source: AmountError,
    },
    /// Epoch identifier is empty
    #[error("epochId must not be empty")]
    EmptyEpochId,
    /// JSON serialization failed
    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    /// JCS canonicalization failed
    #[error("JCS canonicalization failed: {0}")]
    Canonicalization(String),
}

/// Public inputs of a solvency proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolvencyPublicInputs {
    /// Liability Merkle root (hex32, lowercase, 0x-prefixed)
    pub liabilities_root: String,

    /// Total liabilities (decimal string, smallest unit)
    pub liabilities_total: String,

    /// Opaque epoch identifier
    pub epoch_id: String,
}

impl SolvencyPublicInputs {
    pub fn new(root: &Digest, total: &Amount, epoch_id: impl Into<String>) -> Self {
        Self {
            liabilities_root: root.to_hex(),
            liabilities_total: total.to_string(),
            epoch_id: epoch_id.into(),
        }
    }

    /// Check field formats without computing anything
    pub fn validate(&self) -> Result<(), PublicInputsError> {
        self.root()?;
        self.total()?;
        if self.epoch_id.is_empty() {
            return Err(PublicInputsError::EmptyEpochId);
        }
        Ok(())
    }

    /// Parsed liabilities root
    pub fn root(&self) -> Result<Digest, PublicInputsError> {
        let hex_str = self
            .liabilities_root
            .strip_prefix("0x")
            .ok_or_else(|| PublicInputsError::InvalidHexFormat {
                field: "liabilitiesRoot",
                reason: "missing 0x prefix".to_string(),
            })?;
        validate_hex_string("liabilitiesRoot", hex_str, 64)?;
        Digest::from_hex(hex_str).map_err(|e| PublicInputsError::InvalidHex {
            field: "liabilitiesRoot",
            source: e,
        })
    }

    /// Parsed liabilities total
    pub fn total(&self) -> Result<Amount, PublicInputsError> {
        Amount::parse_decimal(&self.liabilities_total).map_err(|e| {
            PublicInputsError::InvalidAmount {
                field: "liabilitiesTotal",
                source: e,
            }
        })
    }

    /// Compute the hash of these public inputs
    pub fn compute_hash(&self) -> Result<Digest, PublicInputsError> {
        compute_public_inputs_hash(self)
    }
}

/// Compute public inputs hash: SHA256(domain || JCS(public_inputs))
pub fn compute_public_inputs_hash(
    inputs: &SolvencyPublicInputs,
) -> Result<Digest, PublicInputsError> {
    inputs.validate()?;
    let canonical = canonical_json(&serde_json::to_value(inputs)?)?;
    Ok(Digest::sha256_with_domain(
        DOMAIN_PUBLIC_INPUTS,
        canonical.as_bytes(),
    ))
}

fn validate_hex_string(
    field: &'static str,
    value: &str,
    expected_len: usize,
) -> Result<(), PublicInputsError> {
    if value.len() != expected_len {
        return Err(PublicInputsError::InvalidHexFormat {
            field,
            reason: format!("expected {} characters, got {}", expected_len, value.len()),
        });
    }

    for (i, c) in value.chars().enumerate() {
        if !c.is_ascii_hexdigit() {
            return Err(PublicInputsError::InvalidHexFormat {
                field,
                reason: format!("invalid character '{}' at position {}", c, i),
            });
        }
        if c.is_ascii_uppercase() {
            return Err(PublicInputsError::InvalidHexFormat {
                field,
                reason: format!(
                    "uppercase character '{}' at position {} (must be lowercase)",
                    c, i
                ),
            });
        }
    }

    Ok(())
}

/// Canonicalize JSON according to RFC 8785 (JCS)
pub fn canonical_json(value: &serde_json::Value) -> Result<String, PublicInputsError> {
    serde_jcs::to_string(value).map_err(|e| PublicInputsError::Canonicalization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SolvencyPublicInputs {
        SolvencyPublicInputs::new(&Digest([0x11; 32]), &Amount::from(1000u64), "epoch-1")
    }

    #[test]
    fn test_canonical_json_sorts_keys() {
        let obj = serde_json::json!({"b": 2, "a": 1});
        assert_eq!(canonical_json(&obj).unwrap(), r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "liabilitiesRoot": format!("0x{}", "11".repeat(32)),
                "liabilitiesTotal": "1000",
                "epochId": "epoch-1",
            })
        );
    }

    #[test]
    fn test_hash_deterministic_and_sensitive() {
        let a = sample();
        assert_eq!(a.compute_hash().unwrap(), a.compute_hash().unwrap());

        let mut b = sample();
        b.liabilities_total = "1001".to_string();
        assert_ne!(a.compute_hash().unwrap(), b.compute_hash().unwrap());

        let mut c = sample();
        c.epoch_id = "epoch-2".to_string();
        assert_ne!(a.compute_hash().unwrap(), c.compute_hash().unwrap());
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let mut missing_prefix = sample();
        missing_prefix.liabilities_root = "11".repeat(32);
        assert!(matches!(
            missing_prefix.validate(),
            Err(PublicInputsError::InvalidHexFormat { .. })
        ));

        let mut uppercase = sample();
        uppercase.liabilities_root = format!("0x{}", "AB".repeat(32));
        assert!(matches!(
            uppercase.validate(),
            Err(PublicInputsError::InvalidHexFormat { .. })
        ));

        let mut float_total = sample();
        float_total.liabilities_total = "1000.5".to_string();
        assert!(matches!(
            float_total.validate(),
            Err(PublicInputsError::InvalidAmount { .. })
        ));

        let mut no_epoch = sample();
        no_epoch.epoch_id.clear();
        assert!(matches!(
            no_epoch.compute_hash(),
            Err(PublicInputsError::EmptyEpochId)
        ));
    }

    #[test]
    fn test_accessors_roundtrip() {
        let inputs = sample();
        assert_eq!(inputs.root().unwrap(), Digest([0x11; 32]));
        assert_eq!(inputs.total().unwrap(), Amount::from(1000u64));
    }
}
