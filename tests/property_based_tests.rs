//! Property-based tests for the masking round-trip, the no-leak invariant,
//! and audit chain integrity.

use credgate::{Config, Decision, OnDetection, OnError, PlaceholderMapper, Scanner, SecretGate};
use credgate_utils::paths::with_isolated_home;
use proptest::prelude::*;

fn mask_gate() -> SecretGate {
    let config = Config::builder()
        .on_detection(OnDetection::Mask)
        .on_error(OnError::FailClosed)
        .build()
        .unwrap();
    SecretGate::from_config(config).unwrap()
}

/// A payload embedding `n` distinct key-shaped secrets between prose words.
fn payload_with_secrets(n: usize) -> (String, Vec<String>) {
    let secrets: Vec<String> = (0..n)
        .map(|i| format!("sk-Zx9Qw7Er5Ty3Ui1Op{i:031}"))
        .collect();
    let mut payload = String::from("run deploy");
    for secret in &secrets {
        payload.push_str(&format!(" --key {secret}"));
    }
    (payload, secrets)
}

proptest! {
    // restore(mask(T)) == T for text with zero or more embedded secrets.
    #[test]
    fn round_trip_law(
        prefix in "[a-z ]{0,30}",
        bodies in proptest::collection::vec("[A-Za-z0-9]{40,60}", 0..4),
        suffix in "[a-z ]{0,30}",
    ) {
        let mut text = prefix;
        for body in &bodies {
            text.push_str(&format!(" sk-{body} "));
        }
        text.push_str(&suffix);

        let scanner = Scanner::new().unwrap();
        let report = scanner.scan(&text).unwrap();
        let mut mapper = PlaceholderMapper::default();
        let outcome = mapper.mask(&text, &report.matches);
        prop_assert_eq!(PlaceholderMapper::restore(&outcome.sanitized, &outcome.mapping), text);
    }

    // Text with no secrets is untouched and yields an empty mapping.
    #[test]
    fn safe_text_is_identity(words in proptest::collection::vec("[a-z]{1,7}", 0..15)) {
        let text = words.join(" ");
        let scanner = Scanner::new().unwrap();
        let report = scanner.scan(&text).unwrap();
        let mut mapper = PlaceholderMapper::default();
        let outcome = mapper.mask(&text, &report.matches);
        prop_assert_eq!(&outcome.sanitized, &text);
        prop_assert!(outcome.mapping.is_empty());
    }

    // Shapes containing EXAMPLE are never reported, regardless of casing.
    #[test]
    fn example_values_are_suppressed(
        marker in "(?i:example)",
        body in "[A-Za-z0-9]{41}",
    ) {
        let token = format!("sk-{marker}{body}");
        let scanner = Scanner::new().unwrap();
        let report = scanner.scan(&token).unwrap();
        prop_assert!(report.matches.is_empty());
    }
}

#[test]
fn no_secret_ever_reaches_the_chain_file() {
    let _home = with_isolated_home();
    let mut gate = mask_gate();
    let (payload, secrets) = payload_with_secrets(3);

    let outcome = gate.process(&payload);
    assert_eq!(outcome.decision, Decision::AllowWithMasking);

    let chain_path = gate
        .config()
        .audit
        .resolved_dir()
        .join(credgate_audit::CHAIN_FILE_NAME);
    let persisted = std::fs::read_to_string(chain_path.as_std_path()).unwrap();
    assert!(!persisted.is_empty());
    for secret in &secrets {
        assert!(!persisted.contains(secret), "secret persisted to audit log");
    }
}

#[test]
fn chain_stays_valid_over_many_appends() {
    let _home = with_isolated_home();
    let mut gate = mask_gate();
    for i in 0..20 {
        let payload = format!("sk-Ab3dEf6hIj9kLm{i:033}");
        gate.process(&payload);
    }

    let report = gate.verify_audit().unwrap();
    assert!(report.is_valid());
    assert_eq!(report.valid_entries, 20);
}

#[test]
fn any_single_field_edit_invalidates_the_chain() {
    let _home = with_isolated_home();
    let mut gate = mask_gate();
    for i in 0..3 {
        gate.process(&format!("sk-Qw2eRt4yUi6oPa8s{i:031}"));
    }

    let chain_path = gate
        .config()
        .audit
        .resolved_dir()
        .join(credgate_audit::CHAIN_FILE_NAME);
    let pristine = std::fs::read_to_string(chain_path.as_std_path()).unwrap();

    // Tamper with a different entry's timestamp on each iteration.
    for target_line in 0..3 {
        let mut lines: Vec<String> = pristine.lines().map(str::to_string).collect();
        let entry: serde_json::Value = serde_json::from_str(&lines[target_line]).unwrap();
        let original_ts = entry["timestamp"].as_str().unwrap().to_string();
        lines[target_line] =
            lines[target_line].replace(&original_ts, "1999-01-01T00:00:00+00:00");
        std::fs::write(chain_path.as_std_path(), format!("{}\n", lines.join("\n"))).unwrap();

        let report = gate.verify_audit().unwrap();
        assert!(!report.is_valid(), "edit at line {} not detected", target_line + 1);
        assert!(report.violations.iter().any(|v| v.line == target_line + 1));
    }
}
