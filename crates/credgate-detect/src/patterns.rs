//! Canonical secret pattern definitions.
//!
//! This is the authoritative source for all built-in secret patterns. The
//! same definitions drive runtime detection, introspection, and test
//! validation. Patterns are written without nested unbounded groups so the
//! regex engine stays linear on attacker-influenced input.

use serde::{Deserialize, Serialize};

/// Risk classification for a pattern's matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Heuristic detectors prone to false positives.
    Low,
    /// Indicators that usually warrant masking.
    Medium,
    /// Credential formats with well-known shapes.
    High,
}

/// Definition of a secret pattern for documentation and runtime use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretPatternDef {
    /// Unique identifier for the pattern (e.g., "aws_access_key")
    pub id: &'static str,
    /// Category for grouping (e.g., "Cloud Credentials")
    pub category: &'static str,
    /// The regex pattern string
    pub regex: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Risk classification carried into every match
    pub risk_level: RiskLevel,
    /// Whether the pattern is active without explicit configuration
    pub enabled_by_default: bool,
}

/// Canonical list of all default secret patterns.
pub static DEFAULT_SECRET_PATTERNS: &[SecretPatternDef] = &[
    // =========================================================================
    // LLM Provider Keys
    // =========================================================================
    SecretPatternDef {
        id: "openai_api_key",
        category: "LLM Provider Keys",
        regex: r"sk-[A-Za-z0-9]{40,}",
        description: "OpenAI API keys",
        risk_level: RiskLevel::High,
        enabled_by_default: true,
    },
    SecretPatternDef {
        id: "anthropic_api_key",
        category: "LLM Provider Keys",
        regex: r"sk-ant-[A-Za-z0-9_-]{20,}",
        description: "Anthropic API keys",
        risk_level: RiskLevel::High,
        enabled_by_default: true,
    },
    // =========================================================================
    // Platform Tokens
    // =========================================================================
    SecretPatternDef {
        id: "github_pat",
        category: "Platform Tokens",
        regex: r"ghp_[A-Za-z0-9]{36}",
        description: "GitHub personal access tokens",
        risk_level: RiskLevel::High,
        enabled_by_default: true,
    },
    SecretPatternDef {
        id: "github_fine_grained_pat",
        category: "Platform Tokens",
        regex: r"github_pat_[A-Za-z0-9_]{22,}",
        description: "GitHub fine-grained personal access tokens",
        risk_level: RiskLevel::High,
        enabled_by_default: true,
    },
    SecretPatternDef {
        id: "slack_bot_token",
        category: "Platform Tokens",
        regex: r"xoxb-[0-9]{4,}-[0-9]{4,}-[0-9]{4,}-[a-z0-9]{4,}",
        description: "Slack bot tokens",
        risk_level: RiskLevel::High,
        enabled_by_default: true,
    },
    // =========================================================================
    // Cloud Credentials
    // =========================================================================
    SecretPatternDef {
        id: "aws_access_key",
        category: "Cloud Credentials",
        regex: r"AKIA[0-9A-Z]{16}",
        description: "AWS access key IDs",
        risk_level: RiskLevel::High,
        enabled_by_default: true,
    },
    // =========================================================================
    // Web Tokens
    // =========================================================================
    SecretPatternDef {
        id: "jwt_token",
        category: "Web Tokens",
        regex: r"eyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+",
        description: "JSON Web Tokens",
        risk_level: RiskLevel::High,
        enabled_by_default: true,
    },
    // =========================================================================
    // Database Connection URLs
    // =========================================================================
    SecretPatternDef {
        id: "postgres_url",
        category: "Database Connection URLs",
        regex: r"postgres(?:ql)?://[^:\s]+:[^@\s]+@[^\s]+",
        description: "PostgreSQL URLs with credentials",
        risk_level: RiskLevel::High,
        enabled_by_default: true,
    },
    SecretPatternDef {
        id: "mysql_url",
        category: "Database Connection URLs",
        regex: r"mysql://[^:\s]+:[^@\s]+@[^\s]+",
        description: "MySQL URLs with credentials",
        risk_level: RiskLevel::High,
        enabled_by_default: true,
    },
    SecretPatternDef {
        id: "mongodb_url",
        category: "Database Connection URLs",
        regex: r"mongodb(?:\+srv)?://[^:\s]+:[^@\s]+@[^\s]+",
        description: "MongoDB URLs with credentials",
        risk_level: RiskLevel::High,
        enabled_by_default: true,
    },
    SecretPatternDef {
        id: "redis_url",
        category: "Database Connection URLs",
        regex: r"rediss?://[^:\s]*:[^@\s]+@[^\s]+",
        description: "Redis URLs with credentials",
        risk_level: RiskLevel::High,
        enabled_by_default: true,
    },
    // =========================================================================
    // Heuristic Fallbacks
    // =========================================================================
    SecretPatternDef {
        id: "generic_secret",
        category: "Heuristic Fallbacks",
        regex: r"[A-Za-z0-9+/=_-]{32,}",
        description: "Generic 32+ character token-like strings",
        risk_level: RiskLevel::Low,
        // Too noisy for default use; opt in via config.
        enabled_by_default: false,
    },
];

/// Returns the canonical list of default secret pattern definitions.
#[must_use]
pub fn default_pattern_defs() -> &'static [SecretPatternDef] {
    DEFAULT_SECRET_PATTERNS
}

/// Detection confidence assigned to matches of a given risk level.
///
/// Pattern matches with a well-known shape score 0.9; heuristics score
/// lower so downstream consumers can rank findings.
#[must_use]
pub fn confidence_for(risk_level: RiskLevel) -> f64 {
    match risk_level {
        RiskLevel::High => 0.9,
        RiskLevel::Medium => 0.7,
        RiskLevel::Low => 0.5,
    }
}
