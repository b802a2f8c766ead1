//! Content digests
//!
//! Digests are SHA-256 over a canonical JSON rendering in which object keys are
//! sorted lexicographically and no whitespace is emitted. Incidental key order
//! in the input therefore never changes a digest.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::Result;

/// Render a JSON value canonically (sorted keys, no whitespace)
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Serializing a plain string cannot fail
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Hex-encoded SHA-256 of arbitrary bytes
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Digest of a JSON value in canonical form
pub fn digest_value(value: &Value) -> String {
    sha256_hex(canonical_json(value).as_bytes())
}

/// Digest of a raw schema set
///
/// Names the persisted type-path index, so it must be stable across
/// incidental key order in the schema files.
pub fn schemas_digest(schemas: &Value) -> String {
    digest_value(schemas)
}

/// Content digest of any serializable value
///
/// Used for `internal.contentDigest` on emitted nodes. Callers pass the
/// pre-normalization raw value so the digest does not move when normalization
/// policy changes.
pub fn content_digest<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value)?;
    Ok(digest_value(&value))
}
