//! Append-only chain file management.
//!
//! The chain is one JSONL file under the audit directory. An append takes
//! an exclusive file descriptor lock, re-reads the tail hash from the file,
//! and writes the sealed entry as a single line, all under the same lock.
//! Concurrent hook invocations therefore interleave at line granularity and
//! always link to the entry that is actually last on disk.

use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use fd_lock::RwLock;
use tracing::debug;

use credgate_utils::canonicalization::{GENESIS_HASH, hash_hex};
use credgate_utils::error::CredGateError;
use credgate_utils::paths::{audit_dir, ensure_dir_all};

use crate::commitment::Commitment;
use crate::entry::AuditEntry;

/// File name of the chain inside the audit directory.
pub const CHAIN_FILE_NAME: &str = "chain.jsonl";

/// Summary counters for a chain file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainStats {
    /// Parseable entries in the file
    pub entry_count: usize,
    /// Lines that did not parse as entries
    pub unparseable_lines: usize,
    /// `chain_hash` of the last parseable entry, or genesis if none
    pub last_hash: String,
}

/// Handle to an audit chain file, tracking the tail hash for appends.
pub struct AuditChain {
    path: Utf8PathBuf,
    last_hash: String,
}

impl AuditChain {
    /// Open (creating if needed) the chain in the default audit directory.
    ///
    /// # Errors
    ///
    /// Returns [`CredGateError::AuditWrite`] if the directory cannot be
    /// created or an existing chain file cannot be read.
    pub fn open_default() -> Result<Self, CredGateError> {
        Self::open(&audit_dir())
    }

    /// Open (creating if needed) the chain file under `dir`.
    ///
    /// Recovers the tail hash by scanning the existing file; an empty or
    /// absent file starts the chain at the genesis hash.
    ///
    /// # Errors
    ///
    /// Returns [`CredGateError::AuditWrite`] if the directory cannot be
    /// created or an existing chain file cannot be read.
    pub fn open(dir: &Utf8Path) -> Result<Self, CredGateError> {
        ensure_dir_all(dir).map_err(|e| CredGateError::AuditWrite {
            path: dir.to_string(),
            reason: format!("failed to create audit directory: {e}"),
        })?;

        let path = dir.join(CHAIN_FILE_NAME);
        let last_hash = recover_last_hash(&path)?;
        debug!(path = %path, last_hash = %&last_hash[..8.min(last_hash.len())], "opened audit chain");

        Ok(Self { path, last_hash })
    }

    /// Path of the underlying chain file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// `chain_hash` the next append will link to.
    #[must_use]
    pub fn last_hash(&self) -> &str {
        &self.last_hash
    }

    /// Append one entry to the chain and return it.
    ///
    /// `commitment` is present when the event masked a secret;
    /// `validation_proof` is the canonical JSON description of the event
    /// (action, tool, pattern id).
    ///
    /// The entry's `previous_hash` is taken from the file content under the
    /// exclusive lock, not from this handle's cached tail, so another
    /// process appending between our open and our append cannot cause two
    /// entries to link to the same predecessor.
    ///
    /// # Errors
    ///
    /// Returns [`CredGateError::AuditWrite`] if hashing, locking, or the
    /// write itself fails. On failure the in-memory tail hash is unchanged.
    pub fn append(
        &mut self,
        commitment: Option<Commitment>,
        validation_proof: String,
    ) -> Result<AuditEntry, CredGateError> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(self.path.as_std_path())
            .map_err(|e| self.write_error(format!("failed to open chain file: {e}")))?;

        // Exclusive lock for the whole read-tail-then-append sequence; the
        // lock drops with `guard` before this function returns.
        let mut rw_lock = RwLock::new(file);
        let mut guard = rw_lock
            .write()
            .map_err(|e| self.write_error(format!("failed to lock chain file: {e}")))?;

        let mut content = String::new();
        guard
            .read_to_string(&mut content)
            .map_err(|e| self.write_error(format!("failed to read chain file: {e}")))?;
        let previous_hash = last_hash_in(&content);

        let timestamp = Utc::now().to_rfc3339();
        let entry_id = next_entry_id(&previous_hash, &validation_proof, &timestamp);

        let mut entry = AuditEntry {
            entry_id,
            previous_hash,
            commitment,
            validation_proof,
            chain_hash: String::new(),
            timestamp,
            integrity_hash: String::new(),
        };
        entry.chain_hash = entry
            .derive_chain_hash()
            .map_err(|e| self.write_error(format!("failed to derive chain hash: {e}")))?;
        entry.integrity_hash = entry
            .derive_integrity_hash()
            .map_err(|e| self.write_error(format!("failed to derive integrity hash: {e}")))?;

        let line = serde_json::to_string(&entry)
            .map_err(|e| self.write_error(format!("failed to serialize entry: {e}")))?;

        guard
            .write_all(line.as_bytes())
            .and_then(|()| guard.write_all(b"\n"))
            .and_then(|()| guard.flush())
            .map_err(|e| self.write_error(format!("failed to append entry: {e}")))?;

        self.last_hash = entry.chain_hash.clone();
        debug!(entry_id = %entry.entry_id, "appended audit entry");

        Ok(entry)
    }

    /// Read back all parseable entries, newest last.
    ///
    /// `limit` keeps only the most recent N entries.
    ///
    /// # Errors
    ///
    /// Returns [`CredGateError::AuditWrite`] if the file cannot be read.
    pub fn entries(&self, limit: Option<usize>) -> Result<Vec<AuditEntry>, CredGateError> {
        let content = self.read_file()?;
        let mut entries: Vec<AuditEntry> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect();
        if let Some(n) = limit {
            if entries.len() > n {
                entries.drain(..entries.len() - n);
            }
        }
        Ok(entries)
    }

    /// Summary counters for the chain file.
    ///
    /// # Errors
    ///
    /// Returns [`CredGateError::AuditWrite`] if the file cannot be read.
    pub fn stats(&self) -> Result<ChainStats, CredGateError> {
        let content = self.read_file()?;
        let mut entry_count = 0;
        let mut unparseable_lines = 0;
        let mut last_hash = GENESIS_HASH.to_string();

        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<AuditEntry>(line) {
                Ok(entry) => {
                    entry_count += 1;
                    last_hash = entry.chain_hash;
                }
                Err(_) => unparseable_lines += 1,
            }
        }

        Ok(ChainStats {
            entry_count,
            unparseable_lines,
            last_hash,
        })
    }

    fn read_file(&self) -> Result<String, CredGateError> {
        if !self.path.as_std_path().exists() {
            return Ok(String::new());
        }
        fs::read_to_string(self.path.as_std_path()).map_err(|e| CredGateError::AuditWrite {
            path: self.path.to_string(),
            reason: format!("failed to read chain file: {e}"),
        })
    }

    fn write_error(&self, reason: String) -> CredGateError {
        CredGateError::AuditWrite {
            path: self.path.to_string(),
            reason,
        }
    }
}

/// Entry ids are `audit_{unix_secs}_{hash8}` where the suffix is derived
/// from the tail hash and event content, keeping ids unique even for
/// multiple appends within the same second.
fn next_entry_id(last_hash: &str, validation_proof: &str, timestamp: &str) -> String {
    let unix_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let suffix = hash_hex(format!("{last_hash}:{validation_proof}:{timestamp}").as_bytes());
    format!("audit_{unix_secs}_{}", &suffix[..8])
}

fn recover_last_hash(path: &Utf8Path) -> Result<String, CredGateError> {
    if !path.as_std_path().exists() {
        return Ok(GENESIS_HASH.to_string());
    }
    let content = fs::read_to_string(path.as_std_path()).map_err(|e| CredGateError::AuditWrite {
        path: path.to_string(),
        reason: format!("failed to read chain file: {e}"),
    })?;
    Ok(last_hash_in(&content))
}

/// `chain_hash` of the last parseable line, or genesis for an empty file.
fn last_hash_in(content: &str) -> String {
    let mut last_hash = GENESIS_HASH.to_string();
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        if let Ok(entry) = serde_json::from_str::<AuditEntry>(line) {
            last_hash = entry.chain_hash;
        }
    }
    last_hash
}
