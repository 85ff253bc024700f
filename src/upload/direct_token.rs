use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::info;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    StatusCode,
};
use serde::Deserialize;

use super::{
    backend::{StoredBlob, UploadBackend},
    UploadFile,
};

pub const DEFAULT_BLOB_BASE_URL: &str = "https://blob.vercel-storage.com";
const BLOB_API_VERSION: &str = "7";

#[derive(Debug, Deserialize)]
struct PutBlobResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ListBlobsResponse {
    blobs: Vec<StoredBlob>,
}

/// Sends bytes straight to the hosted object store, authenticated with a
/// read/write token.
#[derive(Debug)]
pub struct DirectTokenBackend {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl DirectTokenBackend {
    pub fn new(token: &str, base_url: Option<&str>) -> Self {
        DirectTokenBackend {
            client: reqwest::Client::new(),
            base_url: base_url
                .unwrap_or(DEFAULT_BLOB_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            token: token.to_string(),
        }
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token))
                .context("Blob token contains invalid header characters")?,
        );
        headers.insert("x-api-version", HeaderValue::from_static(BLOB_API_VERSION));
        Ok(headers)
    }
}

#[async_trait]
impl UploadBackend for DirectTokenBackend {
    fn name(&self) -> &'static str {
        "direct-token"
    }

    async fn put(&self, object_name: &str, file: &UploadFile) -> Result<String> {
        let mut headers = self.headers()?;
        headers.insert(
            "x-content-type",
            HeaderValue::from_str(&file.content_type).context("Invalid content type")?,
        );
        headers.insert("x-add-random-suffix", HeaderValue::from_static("0"));

        let url = format!("{}/{}", self.base_url, object_name);
        let response = self
            .client
            .put(url)
            .headers(headers)
            .body(file.bytes.clone())
            .send()
            .await
            .context("Failed to reach blob store")?;

        if response.status() == StatusCode::UNAUTHORIZED || response.status() == StatusCode::FORBIDDEN {
            return Err(anyhow!("Blob store rejected the token ({})", response.status()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Blob store responded with error {}: {}", status, body));
        }

        let parsed: PutBlobResponse = response
            .json()
            .await
            .context("Failed to deserialize blob store response")?;
        info!("Stored {} in blob store", parsed.url);
        Ok(parsed.url)
    }

    async fn list(&self) -> Result<Vec<StoredBlob>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("limit", "1000")])
            .headers(self.headers()?)
            .send()
            .await
            .context("Failed to reach blob store")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Blob store responded with error {}: {}", status, body));
        }

        let parsed: ListBlobsResponse = response
            .json()
            .await
            .context("Failed to deserialize blob listing")?;
        Ok(parsed.blobs)
    }
}
