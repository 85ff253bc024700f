use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::info;
use tokio::sync::Mutex;

use super::{
    backend::{StoredBlob, UploadBackend},
    UploadFile,
};

pub const DEFAULT_MOCK_BASE_URL: &str = "https://mock-storage.local";

/// Used when no storage credentials are configured. Nothing leaves the
/// process; the returned URLs only point at a placeholder host.
#[derive(Debug)]
pub struct MockBackend {
    base_url: String,
    stored: Mutex<Vec<StoredBlob>>,
}

impl MockBackend {
    pub fn new(base_url: Option<&str>) -> Self {
        MockBackend {
            base_url: base_url
                .unwrap_or(DEFAULT_MOCK_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            stored: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl UploadBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn put(&self, object_name: &str, file: &UploadFile) -> Result<String> {
        let url = format!("{}/{}", self.base_url, object_name);
        info!("Mock upload of {} ({} bytes) -> {url}", file.file_name, file.bytes.len());

        self.stored.lock().await.push(StoredBlob {
            url: url.clone(),
            pathname: object_name.to_string(),
            size: file.bytes.len() as u64,
            uploaded_at: Some(Utc::now()),
        });
        Ok(url)
    }

    async fn list(&self) -> Result<Vec<StoredBlob>> {
        Ok(self.stored.lock().await.clone())
    }
}
