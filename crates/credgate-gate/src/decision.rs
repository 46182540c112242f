//! Decision types and policy resolution.
//!
//! The gate is deterministic: the same scan result and configuration always
//! produce the same decision. Failure handling is where fail-open and
//! fail-closed diverge; detections themselves are resolved by the
//! `on_detection` policy alone.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use credgate_config::{OnDetection, OnError, PolicyConfig};
use credgate_detect::SecretMatch;
use credgate_utils::error::CredGateError;

use crate::exit_codes;

/// Machine-readable gate decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Payload is clean (or policy says pass it through unchanged)
    Allow,
    /// Secrets were found and masked; the sanitized payload may proceed
    AllowWithMasking,
    /// Payload must not proceed
    Block,
}

impl Decision {
    /// Exit code for hook wrappers: 0 to proceed, 2 to refuse.
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Allow | Self::AllowWithMasking => exit_codes::SUCCESS,
            Self::Block => exit_codes::BLOCKED,
        }
    }

    /// Whether the payload may proceed at all.
    #[must_use]
    pub fn is_allowed(self) -> bool {
        !matches!(self, Self::Block)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "ALLOW"),
            Self::AllowWithMasking => write!(f, "ALLOW_WITH_MASKING"),
            Self::Block => write!(f, "BLOCK"),
        }
    }
}

/// What the gate hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct GateOutcome {
    /// The decision
    pub decision: Decision,
    /// Payload with secrets replaced by placeholders (unchanged when clean
    /// or when the policy allowed it through unmasked)
    pub sanitized: String,
    /// Human-readable one-line summary; secret values appear only as
    /// truncated previews
    pub summary: String,
    /// Non-fatal problems encountered while processing
    pub warnings: Vec<String>,
}

impl GateOutcome {
    /// Exit code for hook wrappers.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.decision.exit_code()
    }
}

/// Resolves detections and failures into decisions per configured policy.
#[derive(Debug, Clone, Copy)]
pub struct PolicyGate {
    policy: PolicyConfig,
}

impl PolicyGate {
    #[must_use]
    pub fn new(policy: PolicyConfig) -> Self {
        Self { policy }
    }

    /// The configured policy.
    #[must_use]
    pub fn policy(&self) -> PolicyConfig {
        self.policy
    }

    /// Decision for a completed scan.
    ///
    /// Clean payloads always allow. Detected secrets resolve per
    /// `on_detection`: mask, block, or pass through unchanged.
    #[must_use]
    pub fn decide(&self, has_secrets: bool) -> Decision {
        if !has_secrets {
            return Decision::Allow;
        }
        let decision = match self.policy.on_detection {
            OnDetection::Mask => Decision::AllowWithMasking,
            OnDetection::Block => Decision::Block,
            OnDetection::Allow => Decision::Allow,
        };
        debug!(on_detection = %self.policy.on_detection, %decision, "resolved detection");
        decision
    }

    /// Decision for a gate failure (empty input, scan failure, audit write
    /// failure). Fail-closed blocks; fail-open allows with the failure
    /// surfaced as a warning by the caller.
    #[must_use]
    pub fn resolve_failure(&self, error: &CredGateError) -> Decision {
        let decision = match self.policy.on_error {
            OnError::FailClosed => Decision::Block,
            OnError::FailOpen => Decision::Allow,
        };
        warn!(%error, on_error = %self.policy.on_error, %decision, "gate failure resolved by policy");
        decision
    }
}

/// One-line summary of detections, previews truncated so no full secret
/// value can reach a terminal or log.
#[must_use]
pub fn summarize_matches(matches: &[SecretMatch]) -> String {
    if matches.is_empty() {
        return "no secrets detected".to_string();
    }
    let details: Vec<String> = matches
        .iter()
        .map(|m| format!("{} ({})", m.pattern_id, m.preview()))
        .collect();
    format!(
        "{} secret(s) detected: {}",
        matches.len(),
        details.join(", ")
    )
}
