//! Canonical JSON hashing for the idempotency layer (§4.8, I4).
//!
//! `request_hash` must be a pure function of the payload's canonical form
//! and stable across serializer differences: object keys are sorted
//! lexicographically before hashing so `{"a":1,"b":2}` and `{"b":2,"a":1}`
//! hash identically. Arrays keep their original order.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Rewrite `value` so every object's keys are emitted in lexicographic
/// order. `serde_json::Value::Object` is backed by a `BTreeMap` when the
/// `preserve_order` feature is off, so constructing a fresh `Value` from
/// sorted entries is sufficient; this function is written to hold even if
/// that feature is later enabled upstream.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = serde_json::Map::new();
            for (k, v) in entries {
                out.insert(k.clone(), canonicalize(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Compute the 256-bit request hash over the canonical form of `value`.
pub fn compute_request_hash(value: &Value) -> [u8; 32] {
    let canonical = canonicalize(value);
    // to_string on a canonicalized Value is deterministic: key order is
    // now fixed and serde_json never reorders scalars or arrays.
    let bytes = canonical.to_string().into_bytes();
    let digest = Sha256::digest(&bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Format a request hash as lowercase hex, the form carried on the wire
/// and in the intent record.
pub fn format_request_hash(hash: &[u8; 32]) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// Convenience: hash-and-format in one call.
pub fn hash_payload(value: &Value) -> String {
    format_request_hash(&compute_request_hash(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_affect_hash() {
        let a = json!({"a": 1, "b": 2, "c": {"x": 1, "y": 2}});
        let b = json!({"c": {"y": 2, "x": 1}, "b": 2, "a": 1});
        assert_eq!(hash_payload(&a), hash_payload(&b));
    }

    #[test]
    fn array_order_does_affect_hash() {
        let a = json!({"xs": [1, 2, 3]});
        let b = json!({"xs": [3, 2, 1]});
        assert_ne!(hash_payload(&a), hash_payload(&b));
    }

    #[test]
    fn hash_is_deterministic() {
        let v = json!({"intent_id": "abc", "gas_limit": 21000});
        assert_eq!(hash_payload(&v), hash_payload(&v));
    }

    #[test]
    fn formatted_hash_is_64_hex_chars() {
        let v = json!({"k": "v"});
        assert_eq!(hash_payload(&v).len(), 64);
    }
}
