//! Cryptographic commitment to a masked secret.
//!
//! A commitment binds a detection event to the secret it masked without
//! storing the secret: only the BLAKE3 hash of the original value is kept,
//! alongside the placeholder that replaced it and where it was found.

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use credgate_utils::canonicalization::{emit_jcs, hash_hex};

/// Where the masked value was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentContext {
    /// Tool whose payload contained the secret (e.g., "Bash")
    pub tool_name: String,
    /// Parameter or field name within the payload (e.g., "command")
    pub parameter: String,
}

/// Hash-before-mask commitment embedded in an audit entry.
///
/// Invariant: the original secret value never appears here or anywhere on
/// persistent storage; `original_hash` is the only trace of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    /// Short unique id for this commitment
    pub commitment_id: String,
    /// BLAKE3 hash of the original secret value
    pub original_hash: String,
    /// The placeholder token substituted into the payload
    pub masked_value: String,
    /// RFC 3339 creation time
    pub timestamp: String,
    /// Tool/parameter the secret was found in
    pub context: CommitmentContext,
    /// Hash binding the commitment id to its context
    pub validation_proof: String,
}

impl Commitment {
    /// Commit to a secret that is about to be masked.
    ///
    /// # Errors
    ///
    /// Returns an error if the context cannot be canonicalized.
    pub fn new(secret: &str, masked_value: &str, context: CommitmentContext) -> Result<Self> {
        let original_hash = hash_hex(secret.as_bytes());
        let timestamp = Utc::now().to_rfc3339();

        let commitment_id =
            hash_hex(format!("{original_hash}:{masked_value}:{timestamp}").as_bytes())[..16]
                .to_string();

        let context_canonical = emit_jcs(&context)?;
        let validation_proof =
            hash_hex(format!("{commitment_id}:{context_canonical}").as_bytes());

        Ok(Self {
            commitment_id,
            original_hash,
            masked_value: masked_value.to_string(),
            timestamp,
            context,
            validation_proof,
        })
    }

    /// Re-derive the validation proof and check it against the stored one.
    ///
    /// # Errors
    ///
    /// Returns an error if the context cannot be canonicalized.
    pub fn proof_is_valid(&self) -> Result<bool> {
        let context_canonical = emit_jcs(&self.context)?;
        let expected = hash_hex(
            format!("{}:{}", self.commitment_id, context_canonical).as_bytes(),
        );
        Ok(expected == self.validation_proof)
    }

    /// Check whether a candidate value is the committed secret.
    #[must_use]
    pub fn matches_secret(&self, candidate: &str) -> bool {
        hash_hex(candidate.as_bytes()) == self.original_hash
    }
}
