//! Append-only, hash-chained audit log.
//!
//! Every detection/masking/blocking event becomes one JSON line in the
//! chain file. Entries link through `previous_hash`/`chain_hash` rooted at
//! a fixed all-zero genesis value, and each entry carries its own
//! `integrity_hash` so any post-hoc edit of any field is detectable.
//! Secrets never appear in the log: a [`Commitment`] records only the
//! BLAKE3 hash of the original value plus the placeholder that replaced it.

pub mod chain;
pub mod commitment;
pub mod entry;
pub mod verify;

pub use chain::{AuditChain, CHAIN_FILE_NAME, ChainStats};
pub use commitment::{Commitment, CommitmentContext};
pub use entry::AuditEntry;
pub use verify::{ChainVerification, ChainViolation, ViolationKind, verify_chain_file};
