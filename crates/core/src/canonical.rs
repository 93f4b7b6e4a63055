// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical JSON encoding and hashing.
//!
//! Both the execution contract hash (§4.3) and the governance decision hash
//! (§4.8) are SHA-256 over a key-sorted JSON encoding with no insignificant
//! whitespace. This module is the single place that encoding is defined so
//! the two callers can't drift apart.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Re-order every object's keys lexicographically, recursively, and render
/// with no insignificant whitespace. Numbers are serialized by
/// `serde_json`, which already omits trailing zeros.
pub fn canonicalize(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut sorted = serde_json::Map::new();
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonicalize).collect())
        }
        other => other.clone(),
    }
}

/// Serialize `value` to canonical JSON text (sorted keys, no insignificant
/// whitespace, UTF-8).
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let raw = serde_json::to_value(value)?;
    let canon = canonicalize(&raw);
    serde_json::to_string(&canon)
}

/// SHA-256 of `canonical_json(value)`, hex-encoded.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = canonical_json(value)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

/// SHA-256 of raw bytes, hex-encoded. Used for workspace content-addressing.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonicalize_sorts_keys_recursively() {
        let value = json!({"b": 1, "a": {"z": 1, "y": 2}});
        let canon = canonicalize(&value);
        let text = serde_json::to_string(&canon).unwrap();
        assert_eq!(text, r#"{"a":{"y":2,"z":1},"b":1}"#);
    }

    #[test]
    fn canonical_hash_is_order_independent() {
        let a = json!({"x": 1, "y": 2});
        let b = json!({"y": 2, "x": 1});
        assert_eq!(canonical_hash(&a).unwrap(), canonical_hash(&b).unwrap());
    }

    #[test]
    fn hash_bytes_is_deterministic() {
        assert_eq!(hash_bytes(b"hello"), hash_bytes(b"hello"));
        assert_ne!(hash_bytes(b"hello"), hash_bytes(b"world"));
    }
}
