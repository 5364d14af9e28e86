//! SHA-256 hashing of files and normalized JSON.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::config::HashServiceConfig;

/// SHA-256 of a file's bytes, read in fixed-size chunks.
pub fn hash_file(path: &Path) -> String {
    match hash_file_inner(path) {
        Ok(digest) => digest,
        Err(e) => format!("Error calculating hash: {}", e),
    }
}

fn hash_file_inner(path: &Path) -> anyhow::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Recursively sort object keys so equivalent JSON hashes identically.
pub fn normalize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            let mut sorted = Map::new();
            for (key, val) in entries {
                sorted.insert(key.clone(), normalize_json(val));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize_json).collect()),
        other => other.clone(),
    }
}

/// SHA-256 hex digest of the key-sorted, whitespace-free serialization.
pub fn json_hash_local(json_str: &str) -> anyhow::Result<String> {
    let value: Value = serde_json::from_str(json_str)?;
    let normalized = serde_json::to_string(&normalize_json(&value))?;

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Hash a JSON string, local normalize-then-hash by default and the
/// network hash service only as the exception path.
pub async fn json_hash(json_str: &str, service: &HashServiceConfig) -> String {
    match json_hash_local(json_str) {
        Ok(digest) => digest,
        Err(e) => {
            warn!("Local JSON hash failed ({}), trying hash service", e);
            json_hash_remote(json_str, service).await
        }
    }
}

async fn json_hash_remote(json_str: &str, service: &HashServiceConfig) -> String {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(service.timeout_secs))
        .build()
    {
        Ok(client) => client,
        Err(e) => return format!("Error calculating JSON hash: {}", e),
    };

    let response = client
        .post(&service.url)
        .json(&serde_json::json!({ "data": json_str }))
        .send()
        .await;

    match response {
        Ok(response) if response.status().is_success() => {
            match response.json::<Value>().await {
                Ok(body) => body
                    .get("hash")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| "Error: No hash in response".to_string()),
                Err(e) => format!("Error calculating JSON hash: {}", e),
            }
        }
        Ok(response) => format!("Error from hash service: {}", response.status().as_u16()),
        Err(e) => format!("Error calculating JSON hash: {}", e),
    }
}
