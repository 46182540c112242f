//! Canonical JSON emission and content hashing.
//!
//! All integrity hashes in credgate are computed over JCS (RFC 8785)
//! canonical JSON so that hash computation is reproducible regardless of
//! field ordering or serializer quirks. Digests are BLAKE3, rendered as
//! 64-char lowercase hex.

use anyhow::{Context, Result};
use serde::Serialize;

/// Fixed genesis value for hash chains: 64 zeros, the same width as a real
/// digest so verification needs no special case for the first entry.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Emit a value as JCS (RFC 8785) canonical JSON.
///
/// Object keys are sorted and number/string formatting is normalized, so the
/// same logical value always produces byte-identical output.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized to JSON or the
/// canonical form is not valid UTF-8.
pub fn emit_jcs<T: Serialize>(value: &T) -> Result<String> {
    let json_value =
        serde_json::to_value(value).context("Failed to serialize value to JSON")?;
    let json_bytes = serde_json_canonicalizer::to_vec(&json_value)
        .context("Failed to canonicalize JSON")?;
    let json_content =
        String::from_utf8(json_bytes).context("Canonical JSON is not valid UTF-8")?;

    Ok(json_content)
}

/// BLAKE3 digest of raw bytes as lowercase hex.
#[must_use]
pub fn hash_hex(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// BLAKE3 digest of a value's JCS canonical form.
///
/// # Errors
///
/// Returns an error if canonicalization fails.
pub fn hash_jcs<T: Serialize>(value: &T) -> Result<String> {
    let canonical = emit_jcs(value)?;
    Ok(hash_hex(canonical.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn jcs_sorts_object_keys() {
        let value = json!({"zebra": 1, "alpha": 2});
        let canonical = emit_jcs(&value).unwrap();
        assert_eq!(canonical, r#"{"alpha":2,"zebra":1}"#);
    }

    #[test]
    fn hash_is_stable_across_key_order() {
        let a = json!({"b": 1, "a": "x"});
        let b = json!({"a": "x", "b": 1});
        assert_eq!(hash_jcs(&a).unwrap(), hash_jcs(&b).unwrap());
    }

    #[test]
    fn hash_hex_is_64_chars() {
        let digest = hash_hex(b"credgate");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn genesis_hash_shape() {
        assert_eq!(GENESIS_HASH.len(), 64);
        assert!(GENESIS_HASH.chars().all(|c| c == '0'));
    }
}
