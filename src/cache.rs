//! On-device mirror of CMS content and site settings.
//!
//! The mirror is read when the remote database cannot be loaded. It is a
//! single JSON document; without a configured path it lives in memory only.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::models::content::ContentEntry;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
struct CacheDocument {
    content: Vec<ContentEntry>,
    settings: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug)]
pub struct LocalCache {
    path: Option<PathBuf>,
    document: Mutex<CacheDocument>,
}

impl LocalCache {
    pub fn in_memory() -> Self {
        LocalCache {
            path: None,
            document: Mutex::new(CacheDocument::default()),
        }
    }

    /// Opens the cache file, starting empty when it is missing or unreadable.
    pub async fn open(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return LocalCache::in_memory();
        };

        let document = match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!("Local cache {} is corrupt, starting empty: {e}", path.display());
                CacheDocument::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No local cache at {}, starting empty", path.display());
                CacheDocument::default()
            }
            Err(e) => {
                warn!("Could not read local cache {}: {e}", path.display());
                CacheDocument::default()
            }
        };

        LocalCache {
            path: Some(path.to_path_buf()),
            document: Mutex::new(document),
        }
    }

    pub async fn content(&self) -> Vec<ContentEntry> {
        self.document.lock().await.content.clone()
    }

    pub async fn store_content(&self, entries: Vec<ContentEntry>) {
        let mut document = self.document.lock().await;
        document.content = entries;
        self.write(&document).await;
    }

    pub async fn setting(&self, key: &str) -> Option<serde_json::Value> {
        self.document.lock().await.settings.get(key).cloned()
    }

    pub async fn store_setting(&self, key: &str, value: serde_json::Value) {
        let mut document = self.document.lock().await;
        document.settings.insert(key.to_string(), value);
        self.write(&document).await;
    }

    // Held under the document lock so concurrent writers cannot interleave.
    async fn write(&self, document: &CacheDocument) {
        let Some(path) = &self.path else {
            return;
        };

        let bytes = match serde_json::to_vec_pretty(document) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Could not serialize local cache: {e}");
                return;
            }
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    warn!("Could not create {}: {e}", parent.display());
                    return;
                }
            }
        }

        if let Err(e) = tokio::fs::write(path, bytes).await {
            warn!("Could not write local cache {}: {e}", path.display());
        }
    }
}
