//! Library-level error taxonomy for credgate.
//!
//! `CredGateError` is the primary error type returned by credgate library
//! operations. Errors fall into four categories, each with a distinct
//! resolution path:
//!
//! | Category | Resolution |
//! |----------|------------|
//! | `Input` | Resolved by the policy gate (fail-open vs fail-closed) |
//! | `Detection` | Contained per-pattern; whole-scan failure reaches the gate |
//! | `AuditWrite` | Always surfaced to the gate; forces BLOCK under fail-closed |
//! | `Config` | Reported to the caller before any payload is processed |
//!
//! Integrity violations found by chain verification are deliberately *not*
//! errors: verification is a reporting operation and returns its findings as
//! data.
//!
//! Library code returns `CredGateError` and never calls
//! `std::process::exit()`; the hook wrapper owns process exit.

use thiserror::Error;

/// Top-level error type for credgate operations.
#[derive(Error, Debug)]
pub enum CredGateError {
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Detection failed for pattern '{pattern_id}': {reason}")]
    Detection { pattern_id: String, reason: String },

    #[error("All detection patterns failed; no scan results available")]
    AllPatternsFailed,

    #[error("Audit log append failed at {path}: {reason}")]
    AuditWrite { path: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Payload-shape errors, resolved per the active failure policy.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("payload is empty")]
    Empty,

    #[error("payload could not be parsed: {reason}")]
    Unparseable { reason: String },
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: String },

    #[error("failed to read config file {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("failed to parse config file {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("invalid extra pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl CredGateError {
    /// Whether this error is resolved by the failure policy (as opposed to
    /// being reported to the caller directly).
    ///
    /// Config errors are not policy-resolvable: a misconfigured gate should
    /// fail loudly before any payload is accepted.
    #[must_use]
    pub fn is_policy_resolvable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_policy_resolvable() {
        assert!(CredGateError::Input(InputError::Empty).is_policy_resolvable());
        assert!(
            CredGateError::AuditWrite {
                path: "/tmp/x".to_string(),
                reason: "disk full".to_string(),
            }
            .is_policy_resolvable()
        );
    }

    #[test]
    fn config_errors_are_not_policy_resolvable() {
        let err = CredGateError::Config(ConfigError::InvalidValue {
            field: "entropy_threshold".to_string(),
            reason: "must be positive".to_string(),
        });
        assert!(!err.is_policy_resolvable());
    }

    #[test]
    fn display_formats() {
        let err = CredGateError::Detection {
            pattern_id: "jwt_token".to_string(),
            reason: "regex did not compile".to_string(),
        };
        assert!(err.to_string().contains("jwt_token"));
    }
}
