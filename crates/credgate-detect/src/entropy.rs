//! Shannon-entropy heuristic for token-like secrets.
//!
//! Flags whitespace-delimited tokens whose per-character entropy exceeds a
//! threshold. Inherently approximate: short tokens and tokens dominated by
//! repeated characters never trigger regardless of content, and safe long
//! identifiers occasionally do. Matches carry reduced confidence so callers
//! can rank them below shape-based pattern hits.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::patterns::RiskLevel;
use crate::scan::SecretMatch;
use crate::validators::is_suppressed;

/// Default entropy threshold in bits per character.
pub const DEFAULT_ENTROPY_THRESHOLD: f64 = 3.5;

/// Default minimum token length the heuristic considers.
pub const DEFAULT_MIN_TOKEN_LENGTH: usize = 8;

/// Confidence assigned to entropy findings.
const ENTROPY_CONFIDENCE: f64 = 0.7;

static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+").expect("static token regex compiles"));

/// Entropy-based secret detector.
#[derive(Debug, Clone)]
pub struct EntropyDetector {
    threshold: f64,
    min_token_length: usize,
}

impl Default for EntropyDetector {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_ENTROPY_THRESHOLD,
            min_token_length: DEFAULT_MIN_TOKEN_LENGTH,
        }
    }
}

impl EntropyDetector {
    /// Create a detector with an explicit threshold and minimum token length.
    #[must_use]
    pub fn new(threshold: f64, min_token_length: usize) -> Self {
        Self {
            threshold,
            min_token_length,
        }
    }

    /// Flag high-entropy tokens in the text.
    #[must_use]
    pub fn detect(&self, text: &str) -> Vec<SecretMatch> {
        let mut matches = Vec::new();

        for token in TOKEN.find_iter(text) {
            let value = token.as_str();
            if value.len() <= self.min_token_length {
                continue;
            }
            if is_suppressed(value) {
                continue;
            }
            if shannon_entropy(value) > self.threshold {
                matches.push(SecretMatch {
                    pattern_id: "high_entropy".to_string(),
                    risk_level: RiskLevel::Medium,
                    text: value.to_string(),
                    start: token.start(),
                    end: token.end(),
                    confidence: ENTROPY_CONFIDENCE,
                });
            }
        }

        matches
    }
}

/// Shannon entropy of a string in bits per character.
#[must_use]
pub fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq = std::collections::HashMap::new();
    let mut length = 0usize;
    for c in s.chars() {
        *freq.entry(c).or_insert(0usize) += 1;
        length += 1;
    }

    let length = length as f64;
    let mut entropy = 0.0;
    for count in freq.values() {
        let probability = *count as f64 / length;
        entropy -= probability * probability.log2();
    }

    entropy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_of_repeated_chars_is_zero() {
        assert_eq!(shannon_entropy("aaaaaaaaaaaaaaaa"), 0.0);
    }

    #[test]
    fn entropy_of_empty_is_zero() {
        assert_eq!(shannon_entropy(""), 0.0);
    }

    #[test]
    fn entropy_grows_with_alphabet() {
        let low = shannon_entropy("abababababab");
        let high = shannon_entropy("aB3x9Qz7Lm2Wk5Rt");
        assert!(high > low);
    }

    #[test]
    fn short_tokens_never_trigger() {
        let detector = EntropyDetector::default();
        assert!(detector.detect("aB3x9Qz7").is_empty());
    }

    #[test]
    fn repeated_char_tokens_never_trigger() {
        let detector = EntropyDetector::default();
        assert!(detector.detect("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").is_empty());
    }

    #[test]
    fn random_looking_token_triggers() {
        let detector = EntropyDetector::default();
        let matches = detector.detect("ctx g9kQ2mXv7Lp1Rt4Zw8Jn3Bc6Ds0Fh word");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].pattern_id, "high_entropy");
        assert!((matches[0].confidence - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn plain_prose_does_not_trigger() {
        let detector = EntropyDetector::default();
        assert!(detector.detect("echo 'hello world' and nothing else").is_empty());
    }

    #[test]
    fn placeholder_tokens_are_ignored() {
        let detector = EntropyDetector::default();
        assert!(detector.detect("<OPENAI_API_KEY_PLACEHOLDER_001>").is_empty());
    }
}
