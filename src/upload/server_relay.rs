use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::info;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::{
    backend::{StoredBlob, UploadBackend},
    UploadFile,
};

#[derive(Debug, Deserialize)]
struct RelayResponse {
    secure_url: String,
}

/// Posts the file as multipart form data to an upload relay
/// (Cloudinary-compatible: `file`, `upload_preset`, `folder`).
#[derive(Debug)]
pub struct ServerRelayBackend {
    client: reqwest::Client,
    relay_url: String,
    preset: Option<String>,
    folder: Option<String>,
}

impl ServerRelayBackend {
    pub fn new(relay_url: &str, preset: Option<&str>, folder: Option<&str>) -> Self {
        ServerRelayBackend {
            client: reqwest::Client::new(),
            relay_url: relay_url.to_string(),
            preset: preset.map(str::to_string),
            folder: folder.map(str::to_string),
        }
    }
}

#[async_trait]
impl UploadBackend for ServerRelayBackend {
    fn name(&self) -> &'static str {
        "server-relay"
    }

    async fn put(&self, object_name: &str, file: &UploadFile) -> Result<String> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .context("Invalid content type")?;

        // Relays pick their own extension, so the public id drops ours.
        let public_id = object_name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(object_name)
            .to_string();

        let mut form = Form::new().part("file", part).text("public_id", public_id);
        if let Some(preset) = &self.preset {
            form = form.text("upload_preset", preset.clone());
        }
        if let Some(folder) = &self.folder {
            form = form.text("folder", folder.clone());
        }

        let response = self
            .client
            .post(&self.relay_url)
            .multipart(form)
            .send()
            .await
            .context("Failed to reach upload relay")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Upload relay responded with error {}: {}", status, body));
        }

        let parsed: RelayResponse = response
            .json()
            .await
            .context("Failed to deserialize upload relay response")?;
        info!("Relay stored {}", parsed.secure_url);
        Ok(parsed.secure_url)
    }

    async fn list(&self) -> Result<Vec<StoredBlob>> {
        Err(anyhow!("listing is not supported by the upload relay"))
    }
}
