//! Audit entry model and hash derivation.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;

use credgate_utils::canonicalization::{hash_hex, hash_jcs};

use crate::commitment::Commitment;

/// One line of the audit chain.
///
/// Append-only: entries are never mutated or deleted by the running
/// system. `integrity_hash` covers every other field; `chain_hash` links
/// the entry to its predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry id
    pub entry_id: String,
    /// `chain_hash` of the previous entry, or the genesis value
    pub previous_hash: String,
    /// Commitment for a masked secret, if this event masked one
    pub commitment: Option<Commitment>,
    /// Canonical JSON describing the recorded event
    pub validation_proof: String,
    /// Hash linking this entry into the chain
    pub chain_hash: String,
    /// RFC 3339 creation time
    pub timestamp: String,
    /// Hash over all other fields of this entry
    pub integrity_hash: String,
}

impl AuditEntry {
    /// Hash of the entry's core fields (everything except the two derived
    /// hashes), over JCS canonical JSON so the digest is reproducible.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn fields_hash(&self) -> Result<String> {
        hash_jcs(&json!({
            "entry_id": self.entry_id,
            "previous_hash": self.previous_hash,
            "commitment": self.commitment,
            "validation_proof": self.validation_proof,
            "timestamp": self.timestamp,
        }))
    }

    /// Chain hash: `H(previous_hash ++ fields_hash)`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn derive_chain_hash(&self) -> Result<String> {
        let fields = self.fields_hash()?;
        Ok(hash_hex(
            format!("{}{}", self.previous_hash, fields).as_bytes(),
        ))
    }

    /// Integrity hash: digest of every field except `integrity_hash` itself.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn derive_integrity_hash(&self) -> Result<String> {
        hash_jcs(&json!({
            "entry_id": self.entry_id,
            "previous_hash": self.previous_hash,
            "commitment": self.commitment,
            "validation_proof": self.validation_proof,
            "chain_hash": self.chain_hash,
            "timestamp": self.timestamp,
        }))
    }
}
