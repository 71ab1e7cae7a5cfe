//! Uploaded file storage
//!
//! Files land in the uploads folder under a unique name and are referred to
//! by their public path (`/uploads/<name>`), which is what section and
//! collection records store.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

/// Public URL prefix the uploads folder is served under
pub const PUBLIC_PREFIX: &str = "/uploads";

const MAX_NAME_LEN: usize = 100;

/// A file written to the uploads folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// File name inside the uploads folder
    pub name: String,
    /// Public path, e.g. `/uploads/4f1c...-team.jpg`
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` under a unique name derived from `original_name`
    pub async fn store(&self, original_name: &str, bytes: &[u8]) -> std::io::Result<StoredFile> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(original_name));
        tokio::fs::write(self.dir.join(&name), bytes).await?;

        info!("Stored upload {} ({} bytes)", name, bytes.len());

        Ok(StoredFile {
            path: format!("{}/{}", PUBLIC_PREFIX, name),
            name,
        })
    }

    /// Delete a stored file; failures are logged, not returned
    pub async fn remove(&self, file: &StoredFile) {
        match tokio::fs::remove_file(self.dir.join(&file.name)).await {
            Ok(()) => info!("Removed unused upload {}", file.name),
            Err(e) => warn!("Failed to remove upload {}: {}", file.name, e),
        }
    }
}

/// Whether any string anywhere in `value` is exactly `path`
pub fn references(value: &Value, path: &str) -> bool {
    match value {
        Value::String(s) => s == path,
        Value::Array(items) => items.iter().any(|item| references(item, path)),
        Value::Object(map) => map.values().any(|item| references(item, path)),
        _ => false,
    }
}

/// Reduce a client-supplied file name to a safe single path component
pub fn sanitize_file_name(name: &str) -> String {
    // Browsers on Windows may send the full client path
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.chars().take(MAX_NAME_LEN).collect()
    }
}
