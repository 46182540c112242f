//! Full-scan chain verification.
//!
//! Verification is a reporting operation: it walks every line of the chain
//! file, re-derives both hashes for each entry, and returns all findings as
//! data. It never stops at the first violation, so a single report covers
//! the whole file.

use camino::Utf8Path;
use tracing::warn;

use credgate_utils::canonicalization::GENESIS_HASH;
use credgate_utils::error::CredGateError;

use crate::entry::AuditEntry;

/// What went wrong at a specific line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// The line is not a parseable audit entry
    UnparseableLine,
    /// `integrity_hash` does not match the entry's own fields
    IntegrityHashMismatch,
    /// `chain_hash` does not match the entry's fields and `previous_hash`
    ChainHashMismatch,
    /// `previous_hash` does not match the preceding entry's `chain_hash`
    ChainLinkBroken,
}

/// One verification finding, positioned by 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainViolation {
    pub line: usize,
    pub entry_id: Option<String>,
    pub kind: ViolationKind,
    pub detail: String,
}

/// Result of a full chain scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainVerification {
    /// Entries that passed every check
    pub valid_entries: usize,
    /// Every violation found, in file order
    pub violations: Vec<ChainViolation>,
}

impl ChainVerification {
    /// True when no violation of any kind was found. An empty chain is valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Verify every entry of the chain file at `path`.
///
/// Checks, per entry: parseability, the self-contained `integrity_hash`,
/// the derived `chain_hash`, and the link to the previous entry (genesis
/// for the first). A missing file verifies as an empty, valid chain.
///
/// # Errors
///
/// Returns [`CredGateError::AuditWrite`] only if the file exists but cannot
/// be read; tampered or malformed content is reported, not an error.
pub fn verify_chain_file(path: &Utf8Path) -> Result<ChainVerification, CredGateError> {
    if !path.as_std_path().exists() {
        return Ok(ChainVerification {
            valid_entries: 0,
            violations: Vec::new(),
        });
    }

    let content =
        std::fs::read_to_string(path.as_std_path()).map_err(|e| CredGateError::AuditWrite {
            path: path.to_string(),
            reason: format!("failed to read chain file: {e}"),
        })?;

    let mut valid_entries = 0;
    let mut violations = Vec::new();
    let mut expected_previous = GENESIS_HASH.to_string();

    for (idx, line) in content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
    {
        let line_no = idx + 1;
        let entry: AuditEntry = match serde_json::from_str(line) {
            Ok(entry) => entry,
            Err(e) => {
                violations.push(ChainViolation {
                    line: line_no,
                    entry_id: None,
                    kind: ViolationKind::UnparseableLine,
                    detail: format!("not a valid audit entry: {e}"),
                });
                // Cannot re-link across garbage; the next entry is checked
                // against the last known good chain hash.
                continue;
            }
        };

        let mut entry_ok = true;

        match entry.derive_integrity_hash() {
            Ok(expected) if expected == entry.integrity_hash => {}
            Ok(expected) => {
                entry_ok = false;
                violations.push(ChainViolation {
                    line: line_no,
                    entry_id: Some(entry.entry_id.clone()),
                    kind: ViolationKind::IntegrityHashMismatch,
                    detail: format!(
                        "stored {} != derived {}",
                        &entry.integrity_hash[..8.min(entry.integrity_hash.len())],
                        &expected[..8]
                    ),
                });
            }
            Err(e) => {
                entry_ok = false;
                violations.push(ChainViolation {
                    line: line_no,
                    entry_id: Some(entry.entry_id.clone()),
                    kind: ViolationKind::IntegrityHashMismatch,
                    detail: format!("could not derive integrity hash: {e}"),
                });
            }
        }

        match entry.derive_chain_hash() {
            Ok(expected) if expected == entry.chain_hash => {}
            Ok(expected) => {
                entry_ok = false;
                violations.push(ChainViolation {
                    line: line_no,
                    entry_id: Some(entry.entry_id.clone()),
                    kind: ViolationKind::ChainHashMismatch,
                    detail: format!(
                        "stored {} != derived {}",
                        &entry.chain_hash[..8.min(entry.chain_hash.len())],
                        &expected[..8]
                    ),
                });
            }
            Err(e) => {
                entry_ok = false;
                violations.push(ChainViolation {
                    line: line_no,
                    entry_id: Some(entry.entry_id.clone()),
                    kind: ViolationKind::ChainHashMismatch,
                    detail: format!("could not derive chain hash: {e}"),
                });
            }
        }

        if entry.previous_hash != expected_previous {
            entry_ok = false;
            violations.push(ChainViolation {
                line: line_no,
                entry_id: Some(entry.entry_id.clone()),
                kind: ViolationKind::ChainLinkBroken,
                detail: format!(
                    "previous_hash {} does not link to {}",
                    &entry.previous_hash[..8.min(entry.previous_hash.len())],
                    &expected_previous[..8]
                ),
            });
        }

        if entry_ok {
            valid_entries += 1;
        }
        // Later entries are checked against what is actually on disk, so one
        // tampered entry yields a bounded set of violations instead of
        // cascading to the end of the file.
        expected_previous = entry.chain_hash;
    }

    if !violations.is_empty() {
        warn!(
            path = %path,
            count = violations.len(),
            "audit chain verification found violations"
        );
    }

    Ok(ChainVerification {
        valid_entries,
        violations,
    })
}
