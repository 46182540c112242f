//! Configuration model with discovery and precedence:
//! explicit path > discovered file > built-in defaults.
//!
//! Discovery looks for `./.credgate/config.toml` first, then the per-user
//! `~/.config/credgate/config.toml`. Every field has a code-level default,
//! so partial files are fine.

use std::fmt;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use tracing::debug;

use credgate_detect::DetectionConfigProvider;
use credgate_utils::error::ConfigError;
use credgate_utils::paths::audit_dir;

/// Project-local config file path, relative to the working directory.
pub const PROJECT_CONFIG_PATH: &str = ".credgate/config.toml";

fn default_true() -> bool {
    true
}

fn default_entropy_threshold() -> f64 {
    3.5
}

fn default_min_token_length() -> usize {
    8
}

fn default_placeholder_template() -> String {
    "<{TYPE}_PLACEHOLDER_{NNN}>".to_string()
}

/// What to do when a secret is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OnDetection {
    /// Mask the secret and allow the sanitized payload through (default)
    #[default]
    Mask,
    /// Refuse the payload outright
    Block,
    /// Record the detection but pass the payload unchanged
    Allow,
}

impl fmt::Display for OnDetection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mask => write!(f, "mask"),
            Self::Block => write!(f, "block"),
            Self::Allow => write!(f, "allow"),
        }
    }
}

/// What to do when the gate itself fails (bad input, scan failure, audit
/// write failure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnError {
    /// Block the payload when the gate cannot do its job (default)
    #[default]
    FailClosed,
    /// Let the payload through and surface the failure as a warning
    FailOpen,
}

impl fmt::Display for OnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailClosed => write!(f, "fail-closed"),
            Self::FailOpen => write!(f, "fail-open"),
        }
    }
}

/// `[detection]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Pattern ids to turn off
    pub disabled_patterns: Vec<String>,
    /// Additional regexes to detect beyond the built-ins
    pub extra_patterns: Vec<String>,
    /// Whether the entropy heuristic runs
    pub entropy_enabled: bool,
    /// Shannon entropy threshold in bits per character
    pub entropy_threshold: f64,
    /// Minimum token length the entropy heuristic considers
    pub min_token_length: usize,
    /// Whether sensitive env-var references are reported
    pub env_var_detection: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            disabled_patterns: Vec::new(),
            extra_patterns: Vec::new(),
            entropy_enabled: default_true(),
            entropy_threshold: default_entropy_threshold(),
            min_token_length: default_min_token_length(),
            env_var_detection: default_true(),
        }
    }
}

/// `[masking]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MaskingConfig {
    /// Placeholder template; must contain `{TYPE}` and `{NNN}`
    pub placeholder_template: String,
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            placeholder_template: default_placeholder_template(),
        }
    }
}

/// `[policy]` section.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Response to a detected secret
    pub on_detection: OnDetection,
    /// Response to a gate failure
    pub on_error: OnError,
}

/// `[audit]` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Audit directory override; absent means `<CREDGATE_HOME>/audit`
    pub dir: Option<Utf8PathBuf>,
}

impl AuditConfig {
    /// The directory the audit chain lives in, with `~` expanded.
    #[must_use]
    pub fn resolved_dir(&self) -> Utf8PathBuf {
        match &self.dir {
            None => audit_dir(),
            Some(dir) => expand_tilde(dir),
        }
    }
}

fn expand_tilde(path: &Utf8PathBuf) -> Utf8PathBuf {
    let Some(rest) = path.as_str().strip_prefix("~/") else {
        return path.clone();
    };
    match dirs::home_dir().and_then(|h| Utf8PathBuf::from_path_buf(h).ok()) {
        Some(home) => home.join(rest),
        None => path.clone(),
    }
}

/// Complete credgate configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub detection: DetectionConfig,
    pub masking: MaskingConfig,
    pub policy: PolicyConfig,
    pub audit: AuditConfig,
}

impl Config {
    /// Load configuration from an explicit file path.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `ReadFailed`, `ParseFailed`, or a validation
    /// error.
    pub fn load(path: &Utf8PathBuf) -> Result<Self, ConfigError> {
        if !path.as_std_path().exists() {
            return Err(ConfigError::NotFound {
                path: path.to_string(),
            });
        }
        let content =
            std::fs::read_to_string(path.as_std_path()).map_err(|e| ConfigError::ReadFailed {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        debug!(path = %path, "loaded config");
        Ok(config)
    }

    /// Discover configuration: `./.credgate/config.toml`, then
    /// `~/.config/credgate/config.toml`, then built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error only if a discovered file exists but cannot be read,
    /// parsed, or validated; absence of any file is not an error.
    pub fn discover() -> Result<Self, ConfigError> {
        let project = Utf8PathBuf::from(PROJECT_CONFIG_PATH);
        if project.as_std_path().exists() {
            return Self::load(&project);
        }

        if let Some(user_config) = dirs::config_dir()
            .and_then(|d| Utf8PathBuf::from_path_buf(d).ok())
            .map(|d| d.join("credgate").join("config.toml"))
            && user_config.as_std_path().exists()
        {
            return Self::load(&user_config);
        }

        debug!("no config file found; using defaults");
        Ok(Self::default())
    }

    /// Check value ranges and template shape.
    ///
    /// Extra pattern regexes are deliberately not compiled here: the scanner
    /// contains a bad pattern per-pattern instead of rejecting the whole
    /// config. Only structurally unusable values are rejected.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` or `InvalidPattern` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.detection.entropy_threshold.is_finite() || self.detection.entropy_threshold <= 0.0
        {
            return Err(ConfigError::InvalidValue {
                field: "detection.entropy_threshold".to_string(),
                reason: "must be a positive finite number".to_string(),
            });
        }
        if self.detection.min_token_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "detection.min_token_length".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        for pattern in &self.detection.extra_patterns {
            if pattern.trim().is_empty() {
                return Err(ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: "pattern is empty".to_string(),
                });
            }
        }
        let template = &self.masking.placeholder_template;
        if !template.contains("{TYPE}") || !template.contains("{NNN}") {
            return Err(ConfigError::InvalidValue {
                field: "masking.placeholder_template".to_string(),
                reason: "must contain {TYPE} and {NNN}".to_string(),
            });
        }
        Ok(())
    }

    /// Start a builder seeded with defaults, for programmatic use.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

impl DetectionConfigProvider for Config {
    fn disabled_patterns(&self) -> &[String] {
        &self.detection.disabled_patterns
    }
    fn extra_patterns(&self) -> &[String] {
        &self.detection.extra_patterns
    }
    fn entropy_enabled(&self) -> bool {
        self.detection.entropy_enabled
    }
    fn entropy_threshold(&self) -> f64 {
        self.detection.entropy_threshold
    }
    fn min_token_length(&self) -> usize {
        self.detection.min_token_length
    }
    fn env_var_detection(&self) -> bool {
        self.detection.env_var_detection
    }
}

/// Builder for embedding scenarios where behavior must not depend on the
/// user's environment or any config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Turn off a built-in pattern by id.
    #[must_use]
    pub fn disable_pattern(mut self, pattern_id: impl Into<String>) -> Self {
        self.config
            .detection
            .disabled_patterns
            .push(pattern_id.into());
        self
    }

    /// Add an extra detection regex.
    #[must_use]
    pub fn extra_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.detection.extra_patterns.push(pattern.into());
        self
    }

    /// Enable or disable the entropy heuristic.
    #[must_use]
    pub fn entropy_enabled(mut self, enabled: bool) -> Self {
        self.config.detection.entropy_enabled = enabled;
        self
    }

    /// Set the entropy threshold in bits per character.
    #[must_use]
    pub fn entropy_threshold(mut self, threshold: f64) -> Self {
        self.config.detection.entropy_threshold = threshold;
        self
    }

    /// Set the minimum token length the entropy heuristic considers.
    #[must_use]
    pub fn min_token_length(mut self, length: usize) -> Self {
        self.config.detection.min_token_length = length;
        self
    }

    /// Enable or disable env-var reference detection.
    #[must_use]
    pub fn env_var_detection(mut self, enabled: bool) -> Self {
        self.config.detection.env_var_detection = enabled;
        self
    }

    /// Set the placeholder template.
    #[must_use]
    pub fn placeholder_template(mut self, template: impl Into<String>) -> Self {
        self.config.masking.placeholder_template = template.into();
        self
    }

    /// Set the detection policy.
    #[must_use]
    pub fn on_detection(mut self, on_detection: OnDetection) -> Self {
        self.config.policy.on_detection = on_detection;
        self
    }

    /// Set the failure policy.
    #[must_use]
    pub fn on_error(mut self, on_error: OnError) -> Self {
        self.config.policy.on_error = on_error;
        self
    }

    /// Override the audit directory.
    #[must_use]
    pub fn audit_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.config.audit.dir = Some(dir.into());
        self
    }

    /// Validate and produce the config.
    ///
    /// # Errors
    ///
    /// Returns the same validation errors as [`Config::validate`].
    pub fn build(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.policy.on_detection, OnDetection::Mask);
        assert_eq!(config.policy.on_error, OnError::FailClosed);
        assert!(config.detection.entropy_enabled);
        assert_eq!(config.masking.placeholder_template, "<{TYPE}_PLACEHOLDER_{NNN}>");
    }

    #[test]
    fn parses_partial_file() {
        let toml = r#"
            [policy]
            on_detection = "block"
            on_error = "fail-open"

            [detection]
            disabled_patterns = ["jwt_token"]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.policy.on_detection, OnDetection::Block);
        assert_eq!(config.policy.on_error, OnError::FailOpen);
        assert_eq!(config.detection.disabled_patterns, vec!["jwt_token"]);
        // untouched sections keep defaults
        assert!((config.detection.entropy_threshold - 3.5).abs() < f64::EPSILON);
        assert!(config.audit.dir.is_none());
    }

    #[test]
    fn audit_dir_round_trips_through_toml() {
        let toml = r#"
            [audit]
            dir = "/var/log/credgate"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.audit.dir, Some(Utf8PathBuf::from("/var/log/credgate")));

        let rendered = toml::to_string(&config).unwrap();
        assert!(rendered.contains(r#"dir = "/var/log/credgate""#));
    }

    #[test]
    fn load_reports_missing_file() {
        let path = Utf8PathBuf::from("/nonexistent/credgate/config.toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn load_reports_parse_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let path =
            Utf8PathBuf::from_path_buf(dir.path().join("config.toml")).unwrap();
        std::fs::write(path.as_std_path(), "not [ valid toml").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed { .. }));
    }

    #[test]
    fn rejects_bad_threshold() {
        let err = Config::builder().entropy_threshold(-1.0).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field, .. }
            if field == "detection.entropy_threshold"));
    }

    #[test]
    fn rejects_zero_token_length() {
        let err = Config::builder().min_token_length(0).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn rejects_template_without_counter() {
        let err = Config::builder()
            .placeholder_template("<{TYPE}_MASKED>")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field, .. }
            if field == "masking.placeholder_template"));
    }

    #[test]
    fn rejects_empty_extra_pattern() {
        let err = Config::builder().extra_pattern("  ").build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn builder_round_trip() {
        let config = Config::builder()
            .disable_pattern("generic_secret")
            .extra_pattern(r"CORP-[0-9]{8}")
            .entropy_enabled(false)
            .on_detection(OnDetection::Block)
            .on_error(OnError::FailOpen)
            .audit_dir("/tmp/credgate-audit")
            .build()
            .unwrap();
        assert_eq!(config.detection.disabled_patterns, vec!["generic_secret"]);
        assert!(!config.detection.entropy_enabled);
        assert_eq!(config.audit.resolved_dir(), Utf8PathBuf::from("/tmp/credgate-audit"));
    }

    #[test]
    fn policy_enums_render_config_spelling() {
        assert_eq!(OnDetection::Mask.to_string(), "mask");
        assert_eq!(OnError::FailClosed.to_string(), "fail-closed");
        assert_eq!(OnError::FailOpen.to_string(), "fail-open");
    }

    #[test]
    fn audit_dir_defaults_under_home() {
        let config = Config::default();
        assert!(config.audit.resolved_dir().as_str().ends_with("audit"));
    }
}
