use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UploadFile;

/// An object as reported by the storage backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBlob {
    pub url: String,
    pub pathname: String,
    pub size: u64,
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Where uploaded bytes end up. Chosen once at startup.
#[async_trait]
pub trait UploadBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Stores the file under `object_name` and returns its public URL.
    async fn put(&self, object_name: &str, file: &UploadFile) -> Result<String>;

    async fn list(&self) -> Result<Vec<StoredBlob>>;
}
