//! JSON-file persistence shared by the record and account stores
//!
//! Each entity lives in its own `<key>.json` file inside the store's
//! directory. Writes go through a temporary file and a rename so a crash
//! mid-write never leaves a truncated record behind.

use crate::error::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

/// Load all JSON files from a directory into a Vec
///
/// Unreadable or corrupt files are logged and skipped.
pub fn load_json_files<T: DeserializeOwned>(dir: &Path) -> Vec<T> {
    let mut items = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to read directory {}: {}", dir.display(), e);
            }
            return items;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(item) => items.push(item),
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", path.display(), e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
            }
        }
    }

    items
}

/// Serialize `value` to `dir/<key>.json`
pub async fn write_json<T: Serialize>(dir: &Path, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let path = dir.join(format!("{}.json", key));
    let tmp = dir.join(format!(".{}.json.tmp", key));

    tokio::fs::write(&tmp, json)
        .await
        .map_err(|e| Error::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
    tokio::fs::rename(&tmp, &path)
        .await
        .map_err(|e| Error::Storage(format!("Failed to persist {}: {}", path.display(), e)))?;
    Ok(())
}

/// Remove `dir/<key>.json`; a file that is already gone is not an error
pub async fn remove_json(dir: &Path, key: &str) -> Result<()> {
    let path = dir.join(format!("{}.json", key));
    match tokio::fs::remove_file(&path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Storage(format!(
            "Failed to remove {}: {}",
            path.display(),
            e
        ))),
    }
}
