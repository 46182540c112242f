//! credgate - Secret detection, masking, and tamper-evident audit for AI
//! assistant tool calls
//!
//! credgate sits between an AI coding assistant and the tools it invokes:
//! every outgoing payload is scanned for credentials, detected secrets are
//! replaced with reversible placeholders, and each intervention is recorded
//! in a hash-chained audit log. The assistant works with sanitized text; the
//! original values never leave the session's memory.
//!
//! # Quick Start
//!
//! ```no_run
//! use credgate::SecretGate;
//!
//! # fn main() -> Result<(), credgate::CredGateError> {
//! let mut gate = SecretGate::new()?;
//! let outcome = gate.process("export OPENAI_API_KEY=sk-...");
//!
//! println!("{}: {}", outcome.decision, outcome.summary);
//! // outcome.sanitized holds the payload with placeholders substituted;
//! // gate.restore() maps placeholders back to original values.
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`credgate_detect`]: pattern registry and detector engine
//! - [`credgate_mask`]: reversible placeholder substitution
//! - [`credgate_audit`]: hash-chained append-only audit log
//! - [`credgate_gate`]: policy resolution (allow / mask / block)
//! - [`credgate_config`]: TOML configuration with discovery
//!
//! The pipeline in this crate wires them together; each layer is usable on
//! its own.

pub mod pipeline;

pub use pipeline::{SecretGate, ToolCallOutcome};

// Re-export the surface most callers need.
pub use credgate_audit::{
    AuditChain, AuditEntry, ChainVerification, Commitment, CommitmentContext, verify_chain_file,
};
pub use credgate_config::{Config, ConfigBuilder, OnDetection, OnError};
pub use credgate_detect::{PatternRegistry, ScanReport, Scanner, SecretMatch};
pub use credgate_gate::{Decision, GateOutcome, PolicyGate};
pub use credgate_mask::{MaskOutcome, PlaceholderMap, PlaceholderMapper};
pub use credgate_utils::error::{ConfigError, CredGateError, InputError};
pub use credgate_utils::logging::init_tracing;
