//! Fingerprint computation for deployments

use crate::error::ApiError;
use crate::ledger::{Artifact, Value};
use crate::types::Hash;
use blake3::Hasher;

/// Domain tag; bump when the fingerprint layout changes
pub const FINGERPRINT_TAG: &[u8] = b"deployment:v1";

/// Compute the fingerprint of a deployment
///
/// Fingerprint = hash(tag || artifact || bytecode || args || linked_data)
///
/// Each section is length-prefixed (8 bytes, big-endian). Arguments must
/// already be resolved to concrete values, so a redeployed dependency
/// changes the fingerprint of everything built on it. Linked data is
/// hashed as JSON with object keys sorted at every level.
pub fn compute_fingerprint(
    artifact: &Artifact,
    args: &[Value],
    linked_data: &serde_json::Value,
) -> Result<Hash, ApiError> {
    let args_json = serde_json::to_vec(args)
        .map_err(|e| ApiError::ConfigError(format!("Failed to encode constructor args: {}", e)))?;
    let linked_json = serde_json::to_vec(&canonical_json(linked_data))
        .map_err(|e| ApiError::ConfigError(format!("Failed to encode linked data: {}", e)))?;

    let mut hasher = Hasher::new();
    hasher.update(FINGERPRINT_TAG);

    update_section(&mut hasher, b"artifact:", artifact.name.as_bytes());
    match &artifact.bytecode_digest {
        Some(digest) => update_section(&mut hasher, b"bytecode:", digest.as_bytes()),
        None => update_section(&mut hasher, b"bytecode:", &[]),
    }
    update_section(&mut hasher, b"args:", &args_json);
    update_section(&mut hasher, b"linked:", &linked_json);

    Ok(*hasher.finalize().as_bytes())
}

/// Rebuild a JSON value with object keys in sorted order
fn canonical_json(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = serde_json::Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonical_json(&map[key]));
            }
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonical_json).collect())
        }
        other => other.clone(),
    }
}

fn update_section(hasher: &mut Hasher, label: &[u8], data: &[u8]) {
    hasher.update(label);
    hasher.update(&(data.len() as u64).to_be_bytes());
    hasher.update(data);
}
