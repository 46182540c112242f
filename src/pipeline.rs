//! The end-to-end gate: scan, mask, audit, decide.
//!
//! [`SecretGate`] owns one detection engine, one placeholder mapper, and the
//! configured policy. Each processed payload flows scan → policy → mask →
//! audit; the caller gets a [`GateOutcome`] and the placeholder mapping
//! accumulates on the gate for later [`restore`](SecretGate::restore) calls.
//!
//! Failures inside the gate never panic and never silently vanish: they are
//! resolved by the configured failure policy (fail-closed blocks, fail-open
//! allows) and surfaced on the outcome's warnings.

use camino::Utf8PathBuf;
use serde_json::{Value, json};
use tracing::{debug, warn};

use credgate_audit::{
    AuditChain, CHAIN_FILE_NAME, ChainVerification, Commitment, CommitmentContext,
    verify_chain_file,
};
use credgate_config::Config;
use credgate_detect::Scanner;
use credgate_gate::{Decision, GateOutcome, PolicyGate, summarize_matches};
use credgate_mask::{PlaceholderMap, PlaceholderMapper};
use credgate_utils::canonicalization::emit_jcs;
use credgate_utils::error::{CredGateError, InputError};

/// Aggregate result of processing one structured tool call.
#[derive(Debug, Clone)]
pub struct ToolCallOutcome {
    /// Worst decision across all scanned fields
    pub decision: Decision,
    /// Tool input with every masked field substituted in place
    pub sanitized_input: Value,
    /// Combined summary across fields that had detections
    pub summary: String,
    /// Non-fatal problems across all fields
    pub warnings: Vec<String>,
}

impl ToolCallOutcome {
    /// Exit code for hook wrappers.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.decision.exit_code()
    }
}

/// Session-scoped secret gate.
///
/// One instance per assistant session: the placeholder counter and the
/// placeholder→secret mapping live here, so placeholders stay unique across
/// payloads and any sanitized text from the session can be restored.
pub struct SecretGate {
    config: Config,
    scanner: Scanner,
    mapper: PlaceholderMapper,
    gate: PolicyGate,
    audit_dir: Utf8PathBuf,
    session_mapping: PlaceholderMap,
}

impl SecretGate {
    /// Build a gate from discovered configuration
    /// (`./.credgate/config.toml`, then the per-user config, then defaults).
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but is unusable, or if the
    /// built-in pattern set fails to compile.
    pub fn new() -> Result<Self, CredGateError> {
        Self::from_config(Config::discover()?)
    }

    /// Build a gate from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns a config validation error or a detection engine build error.
    pub fn from_config(config: Config) -> Result<Self, CredGateError> {
        config.validate()?;
        let scanner = Scanner::from_config(&config)
            .map_err(|e| CredGateError::Detection {
                pattern_id: "builtin".to_string(),
                reason: e.to_string(),
            })?
            .with_placeholder_template(&config.masking.placeholder_template);
        let mapper = PlaceholderMapper::new(config.masking.placeholder_template.clone());
        let gate = PolicyGate::new(config.policy);
        let audit_dir = config.audit.resolved_dir();

        Ok(Self {
            config,
            scanner,
            mapper,
            gate,
            audit_dir,
            session_mapping: PlaceholderMap::default(),
        })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Placeholder→secret mapping accumulated over this session.
    #[must_use]
    pub fn mapping(&self) -> &PlaceholderMap {
        &self.session_mapping
    }

    /// Map placeholders in `text` back to their original values.
    ///
    /// Left-inverse of masking for any text produced by this session.
    #[must_use]
    pub fn restore(&self, text: &str) -> String {
        PlaceholderMapper::restore(text, &self.session_mapping)
    }

    /// Process a plain text payload.
    ///
    /// Never returns an error: gate failures are resolved by the configured
    /// failure policy and reported on the outcome's warnings.
    pub fn process(&mut self, payload: &str) -> GateOutcome {
        let context = CommitmentContext {
            tool_name: "direct".to_string(),
            parameter: "payload".to_string(),
        };
        self.run(payload, &context)
    }

    /// Process a structured tool call, scanning every string field.
    ///
    /// Fields are visited depth-first; nested keys are reported with dotted
    /// paths (`env.DATABASE_URL`). The worst per-field decision wins:
    /// one blocked field blocks the whole call.
    pub fn process_tool_call(&mut self, tool_name: &str, tool_input: &Value) -> ToolCallOutcome {
        let mut sanitized_input = tool_input.clone();
        let mut field_count = 0usize;
        let mut decision = Decision::Allow;
        let mut summaries = Vec::new();
        let mut warnings = Vec::new();

        self.walk_value(
            tool_name,
            String::new(),
            &mut sanitized_input,
            &mut field_count,
            &mut decision,
            &mut summaries,
            &mut warnings,
        );

        if field_count == 0 {
            // Nothing scannable at all; resolved like an empty payload.
            let err = CredGateError::Input(InputError::Unparseable {
                reason: "tool input contains no string fields".to_string(),
            });
            let resolved = self.gate.resolve_failure(&err);
            return ToolCallOutcome {
                decision: resolved,
                sanitized_input,
                summary: format!("gate failure: {err}"),
                warnings: vec![err.to_string()],
            };
        }

        let summary = if summaries.is_empty() {
            "no secrets detected".to_string()
        } else {
            summaries.join("; ")
        };
        debug!(tool = tool_name, fields = field_count, %decision, "tool call processed");

        ToolCallOutcome {
            decision,
            sanitized_input,
            summary,
            warnings,
        }
    }

    /// Verify the audit chain this gate appends to.
    ///
    /// # Errors
    ///
    /// Returns an error only if the chain file exists but cannot be read.
    pub fn verify_audit(&self) -> Result<ChainVerification, CredGateError> {
        verify_chain_file(&self.audit_dir.join(CHAIN_FILE_NAME))
    }

    #[allow(clippy::too_many_arguments)]
    fn walk_value(
        &mut self,
        tool_name: &str,
        path: String,
        value: &mut Value,
        field_count: &mut usize,
        decision: &mut Decision,
        summaries: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) {
        match value {
            Value::String(s) => {
                *field_count += 1;
                if s.is_empty() {
                    return;
                }
                let parameter = if path.is_empty() {
                    "input".to_string()
                } else {
                    path
                };
                let context = CommitmentContext {
                    tool_name: tool_name.to_string(),
                    parameter: parameter.clone(),
                };
                let outcome = self.run(s, &context);
                if outcome.decision != Decision::Block {
                    *s = outcome.sanitized;
                }
                if outcome.decision != Decision::Allow || outcome.summary != "no secrets detected"
                {
                    summaries.push(format!("{parameter}: {}", outcome.summary));
                }
                warnings.extend(outcome.warnings);
                *decision = worst(*decision, outcome.decision);
            }
            Value::Object(map) => {
                for (key, child) in map.iter_mut() {
                    let child_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{path}.{key}")
                    };
                    self.walk_value(
                        tool_name,
                        child_path,
                        child,
                        field_count,
                        decision,
                        summaries,
                        warnings,
                    );
                }
            }
            Value::Array(items) => {
                for (idx, child) in items.iter_mut().enumerate() {
                    let child_path = if path.is_empty() {
                        format!("[{idx}]")
                    } else {
                        format!("{path}[{idx}]")
                    };
                    self.walk_value(
                        tool_name,
                        child_path,
                        child,
                        field_count,
                        decision,
                        summaries,
                        warnings,
                    );
                }
            }
            _ => {}
        }
    }

    fn run(&mut self, payload: &str, context: &CommitmentContext) -> GateOutcome {
        if payload.is_empty() {
            return self.fail(payload, &CredGateError::Input(InputError::Empty));
        }

        let report = match self.scanner.scan(payload) {
            Ok(report) => report,
            Err(e) => return self.fail(payload, &e),
        };

        let mut warnings: Vec<String> = report
            .failed_patterns
            .iter()
            .map(|f| format!("pattern '{}' unavailable: {}", f.pattern_id, f.reason))
            .collect();

        let decision = self.gate.decide(report.has_secrets());
        let summary = summarize_matches(&report.matches);

        match decision {
            Decision::Allow if !report.has_secrets() => GateOutcome {
                decision,
                sanitized: payload.to_string(),
                summary,
                warnings,
            },
            Decision::Allow => {
                // Detected but the policy passes it through; still audited.
                let event = audit_event("allowed", context, report.matches.len());
                let decision = self.audit(vec![(None, event)], decision, &mut warnings);
                GateOutcome {
                    decision,
                    sanitized: payload.to_string(),
                    summary,
                    warnings,
                }
            }
            Decision::AllowWithMasking => {
                let masked = self.mapper.mask(payload, &report.matches);

                let mut events = Vec::with_capacity(masked.mapping.len());
                for entry in masked.mapping.entries() {
                    match Commitment::new(&entry.secret, &entry.placeholder, context.clone()) {
                        Ok(commitment) => {
                            let event = audit_event("masked", context, 1);
                            events.push((Some(commitment), event));
                        }
                        Err(e) => {
                            let err = CredGateError::AuditWrite {
                                path: self.audit_dir.to_string(),
                                reason: format!("failed to build commitment: {e}"),
                            };
                            return self.fail(payload, &err);
                        }
                    }
                }

                let decision = self.audit(events, decision, &mut warnings);
                self.session_mapping.absorb(masked.mapping);
                GateOutcome {
                    decision,
                    sanitized: masked.sanitized,
                    summary,
                    warnings,
                }
            }
            Decision::Block => {
                let event = audit_event("blocked", context, report.matches.len());
                // An audit failure cannot soften a block.
                let _ = self.audit(vec![(None, event)], decision, &mut warnings);
                GateOutcome {
                    decision: Decision::Block,
                    sanitized: payload.to_string(),
                    summary,
                    warnings,
                }
            }
        }
    }

    /// Append events to the chain, resolving any write failure by policy.
    /// Returns the (possibly escalated) decision.
    fn audit(
        &self,
        events: Vec<(Option<Commitment>, String)>,
        decision: Decision,
        warnings: &mut Vec<String>,
    ) -> Decision {
        let result = (|| -> Result<(), CredGateError> {
            let mut chain = AuditChain::open(&self.audit_dir)?;
            for (commitment, proof) in events {
                chain.append(commitment, proof)?;
            }
            Ok(())
        })();

        match result {
            Ok(()) => decision,
            Err(e) => {
                warn!(error = %e, "audit append failed");
                warnings.push(e.to_string());
                match self.gate.resolve_failure(&e) {
                    Decision::Block => Decision::Block,
                    _ => decision,
                }
            }
        }
    }

    fn fail(&self, payload: &str, error: &CredGateError) -> GateOutcome {
        let decision = self.gate.resolve_failure(error);
        GateOutcome {
            decision,
            sanitized: payload.to_string(),
            summary: format!("gate failure: {error}"),
            warnings: vec![error.to_string()],
        }
    }
}

/// Canonical JSON describing one audited event.
fn audit_event(action: &str, context: &CommitmentContext, match_count: usize) -> String {
    emit_jcs(&json!({
        "action": action,
        "tool": context.tool_name,
        "parameter": context.parameter,
        "match_count": match_count,
    }))
    .unwrap_or_else(|_| format!(r#"{{"action":"{action}"}}"#))
}

fn worst(a: Decision, b: Decision) -> Decision {
    fn rank(d: Decision) -> u8 {
        match d {
            Decision::Allow => 0,
            Decision::AllowWithMasking => 1,
            Decision::Block => 2,
        }
    }
    if rank(b) > rank(a) { b } else { a }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credgate_config::{OnDetection, OnError};
    use credgate_utils::paths::with_isolated_home;

    fn gate_with(on_detection: OnDetection, on_error: OnError) -> SecretGate {
        let config = Config::builder()
            .on_detection(on_detection)
            .on_error(on_error)
            .build()
            .unwrap();
        SecretGate::from_config(config).unwrap()
    }

    #[test]
    fn clean_payload_allows_without_audit() {
        let _home = with_isolated_home();
        let mut gate = gate_with(OnDetection::Mask, OnError::FailClosed);
        let outcome = gate.process("ls -la /tmp");
        assert_eq!(outcome.decision, Decision::Allow);
        assert_eq!(outcome.sanitized, "ls -la /tmp");
        assert_eq!(gate.verify_audit().unwrap().valid_entries, 0);
    }

    #[test]
    fn masked_payload_round_trips_and_audits() {
        let _home = with_isolated_home();
        let mut gate = gate_with(OnDetection::Mask, OnError::FailClosed);
        let key = format!("sk-{}", "a".repeat(48));
        let payload = format!("export OPENAI_API_KEY={key}");

        let outcome = gate.process(&payload);
        assert_eq!(outcome.decision, Decision::AllowWithMasking);
        assert!(!outcome.sanitized.contains(&key));
        assert_eq!(gate.restore(&outcome.sanitized), payload);

        let report = gate.verify_audit().unwrap();
        assert!(report.is_valid());
        assert_eq!(report.valid_entries, 1);
    }

    #[test]
    fn block_policy_blocks_and_audits() {
        let _home = with_isolated_home();
        let mut gate = gate_with(OnDetection::Block, OnError::FailClosed);
        let outcome = gate.process("psql postgres://admin:hunter2@db/prod");
        assert_eq!(outcome.decision, Decision::Block);
        assert_eq!(outcome.exit_code(), 2);
        assert_eq!(gate.verify_audit().unwrap().valid_entries, 1);
    }

    #[test]
    fn empty_payload_follows_failure_policy() {
        let _home = with_isolated_home();
        let mut closed = gate_with(OnDetection::Mask, OnError::FailClosed);
        assert_eq!(closed.process("").decision, Decision::Block);

        let mut open = gate_with(OnDetection::Mask, OnError::FailOpen);
        let outcome = open.process("");
        assert_eq!(outcome.decision, Decision::Allow);
        assert!(!outcome.warnings.is_empty());
    }

    #[test]
    fn tool_call_masks_nested_fields() {
        let _home = with_isolated_home();
        let mut gate = gate_with(OnDetection::Mask, OnError::FailClosed);
        let key = format!("sk-{}", "b".repeat(48));
        let input = json!({
            "command": format!("curl -H 'Authorization: Bearer {key}'"),
            "env": { "SAFE": "yes" },
        });

        let outcome = gate.process_tool_call("Bash", &input);
        assert_eq!(outcome.decision, Decision::AllowWithMasking);
        let sanitized_command = outcome.sanitized_input["command"].as_str().unwrap();
        assert!(!sanitized_command.contains(&key));
        assert!(sanitized_command.contains("PLACEHOLDER"));
        assert_eq!(outcome.sanitized_input["env"]["SAFE"], "yes");
        assert!(outcome.summary.contains("command"));
    }

    #[test]
    fn tool_call_with_no_strings_follows_failure_policy() {
        let _home = with_isolated_home();
        let mut gate = gate_with(OnDetection::Mask, OnError::FailClosed);
        let outcome = gate.process_tool_call("Bash", &json!({"count": 3}));
        assert_eq!(outcome.decision, Decision::Block);
    }

    #[test]
    fn custom_template_output_rescans_clean() {
        let _home = with_isolated_home();
        let config = Config::builder()
            .extra_pattern(r"MASKED_[0-9]{3}_[A-Z0-9_]+")
            .placeholder_template("MASKED_{NNN}_{TYPE}")
            .build()
            .unwrap();
        let mut gate = SecretGate::from_config(config).unwrap();

        let first = gate.process(&format!("sk-{}", "e".repeat(48)));
        assert_eq!(first.decision, Decision::AllowWithMasking);
        assert!(first.sanitized.contains("MASKED_001_OPENAI_API_KEY"));

        // The rendered placeholder matches the extra pattern, but the gate
        // recognizes its own template and does not mask it again.
        let second = gate.process(&first.sanitized);
        assert_eq!(second.decision, Decision::Allow);
        assert_eq!(second.sanitized, first.sanitized);
    }

    #[test]
    fn session_counter_spans_payloads() {
        let _home = with_isolated_home();
        let mut gate = gate_with(OnDetection::Mask, OnError::FailClosed);
        let first = gate.process(&format!("sk-{}", "c".repeat(48)));
        let second = gate.process(&format!("sk-{}", "d".repeat(48)));
        assert!(first.sanitized.contains("_001"));
        assert!(second.sanitized.contains("_002"));
        assert_eq!(gate.mapping().len(), 2);
    }
}
