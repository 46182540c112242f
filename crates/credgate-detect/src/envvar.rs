//! Sensitive environment-variable reference detection.
//!
//! Shell commands frequently smuggle secrets indirectly (`echo $API_KEY`).
//! This detector flags `$VAR` / `${VAR}` references whose names contain a
//! known sensitive indicator, without ever reading the variable's value.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::patterns::RiskLevel;
use crate::scan::SecretMatch;

/// Name fragments that mark an environment variable as sensitive.
const SENSITIVE_ENV_INDICATORS: &[&str] = &[
    "API_KEY",
    "SECRET",
    "PASSWORD",
    "TOKEN",
    "PRIVATE_KEY",
    "DATABASE_URL",
    "DB_PASSWORD",
    "DB_USER",
    "DB_HOST",
    "REDIS_URL",
    "MONGO_URI",
    "MONGODB_URI",
    "AWS_SECRET",
    "AWS_ACCESS",
    "AZURE_CLIENT",
    "GOOGLE_CLIENT",
    "OAUTH",
    "AUTH",
    "PRIVATE",
    "CREDENTIAL",
    "CERT",
    "SESSION_SECRET",
    "ENCRYPTION_KEY",
];

static ENV_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{?([A-Za-z_][A-Za-z0-9_]*)\}?").expect("static env ref regex compiles")
});

/// Confidence for env-var reference findings: the reference itself proves
/// nothing about the variable's content.
const ENV_VAR_CONFIDENCE: f64 = 0.6;

/// Detect references to sensitive environment variables.
#[must_use]
pub fn detect_sensitive_env_refs(text: &str) -> Vec<SecretMatch> {
    let mut matches = Vec::new();

    for caps in ENV_REF.captures_iter(text) {
        let Some(full) = caps.get(0) else { continue };
        let Some(name) = caps.get(1) else { continue };

        let upper = name.as_str().to_uppercase();
        if SENSITIVE_ENV_INDICATORS.iter().any(|s| upper.contains(s)) {
            matches.push(SecretMatch {
                pattern_id: "sensitive_env_var".to_string(),
                risk_level: RiskLevel::Medium,
                text: full.as_str().to_string(),
                start: full.start(),
                end: full.end(),
                confidence: ENV_VAR_CONFIDENCE,
            });
        }
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_dollar_reference() {
        let matches = detect_sensitive_env_refs("echo $OPENAI_API_KEY");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "$OPENAI_API_KEY");
        assert_eq!(matches[0].pattern_id, "sensitive_env_var");
    }

    #[test]
    fn flags_braced_reference() {
        let matches = detect_sensitive_env_refs("curl -H \"X-Auth: ${GITHUB_TOKEN}\"");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "${GITHUB_TOKEN}");
    }

    #[test]
    fn ignores_benign_variables() {
        assert!(detect_sensitive_env_refs("echo $HOME $PATH $SHELL").is_empty());
    }

    #[test]
    fn name_check_is_case_insensitive() {
        let matches = detect_sensitive_env_refs("echo $db_password");
        assert_eq!(matches.len(), 1);
    }
}
