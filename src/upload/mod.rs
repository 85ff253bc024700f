pub mod backend;
pub mod direct_token;
pub mod mock;
pub mod server_relay;

use std::sync::Arc;

use chrono::Utc;
use lazy_static::lazy_static;
use log::{info, warn};
use rand::Rng;
use regex::Regex;
use serde::Serialize;

use crate::{
    config::{UploadBackendKind, UploadConfig},
    db::ImageRepository,
    error::SiteError,
    models::image::NewImageMetadata,
};
use backend::{StoredBlob, UploadBackend};
use direct_token::DirectTokenBackend;
use mock::MockBackend;
use server_relay::ServerRelayBackend;

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

pub const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/svg+xml",
];

lazy_static! {
    static ref UNSAFE_NAME_CHARS: Regex = Regex::new(r"[^a-z0-9._-]+").unwrap();
}

#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub url: String,
    pub size: u64,
    pub mime_type: String,
}

#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub max_bytes: u64,
    pub allowed_types: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        UploadLimits {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_types: ALLOWED_IMAGE_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl UploadLimits {
    pub fn check(&self, file: &UploadFile) -> Result<(), SiteError> {
        if file.bytes.is_empty() {
            return Err(SiteError::validation(format!("{} is empty", file.file_name)));
        }

        let content_type = file.content_type.to_ascii_lowercase();
        if !self.allowed_types.iter().any(|t| *t == content_type) {
            return Err(SiteError::validation(format!(
                "file type {} is not allowed, expected one of: {}",
                file.content_type,
                self.allowed_types.join(", ")
            )));
        }

        let size = file.bytes.len() as u64;
        if size > self.max_bytes {
            return Err(SiteError::validation(format!(
                "{} is {} bytes, the limit is {} bytes",
                file.file_name, size, self.max_bytes
            )));
        }
        Ok(())
    }
}

/// Storage name for an upload: `uploads/<millis>-<suffix>-<sanitized name>`.
pub fn object_name_for(original_name: &str) -> String {
    let lowered = original_name.trim().to_ascii_lowercase();
    let sanitized = UNSAFE_NAME_CHARS.replace_all(&lowered, "-");
    let sanitized = sanitized.trim_matches('-');
    let sanitized = if sanitized.is_empty() { "file" } else { sanitized };

    let suffix: u32 = rand::thread_rng().gen_range(0x1000_0000..=0xffff_ffff);
    format!(
        "uploads/{}-{:08x}-{}",
        Utc::now().timestamp_millis(),
        suffix,
        sanitized
    )
}

/// Picks the storage backend once, from whatever credentials are present.
/// An explicitly requested backend without its credentials degrades to mock.
pub fn backend_from_config(config: &UploadConfig) -> Arc<dyn UploadBackend> {
    let kind = config.backend.unwrap_or(if config.blob_token.is_some() {
        UploadBackendKind::DirectToken
    } else if config.relay_url.is_some() {
        UploadBackendKind::ServerRelay
    } else {
        UploadBackendKind::Mock
    });

    let backend: Arc<dyn UploadBackend> = match kind {
        UploadBackendKind::DirectToken => match &config.blob_token {
            Some(token) => Arc::new(DirectTokenBackend::new(
                token,
                config.blob_base_url.as_deref(),
            )),
            None => {
                warn!("direct-token upload backend requested without a blob token, using mock");
                Arc::new(MockBackend::new(config.mock_base_url.as_deref()))
            }
        },
        UploadBackendKind::ServerRelay => match &config.relay_url {
            Some(relay_url) => Arc::new(ServerRelayBackend::new(
                relay_url,
                config.relay_preset.as_deref(),
                config.relay_folder.as_deref(),
            )),
            None => {
                warn!("server-relay upload backend requested without a relay url, using mock");
                Arc::new(MockBackend::new(config.mock_base_url.as_deref()))
            }
        },
        UploadBackendKind::Mock => Arc::new(MockBackend::new(config.mock_base_url.as_deref())),
    };

    info!("Uploads go to the {} backend", backend.name());
    backend
}

/// Validates, stores and records uploaded images.
pub struct UploadPipeline {
    backend: Arc<dyn UploadBackend>,
    images: Option<Arc<dyn ImageRepository>>,
    limits: UploadLimits,
}

impl UploadPipeline {
    pub fn new(
        backend: Arc<dyn UploadBackend>,
        images: Option<Arc<dyn ImageRepository>>,
        limits: UploadLimits,
    ) -> Self {
        UploadPipeline {
            backend,
            images,
            limits,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    pub async fn upload(
        &self,
        file: UploadFile,
        target_section: Option<&str>,
        target_field: Option<&str>,
    ) -> Result<UploadOutcome, SiteError> {
        self.limits.check(&file)?;

        let object_name = object_name_for(&file.file_name);
        let url = self.backend.put(&object_name, &file).await.map_err(|e| {
            SiteError::RemoteUnavailable(format!("{} upload failed: {e:#}", self.backend.name()))
        })?;

        let outcome = UploadOutcome {
            url,
            size: file.bytes.len() as u64,
            mime_type: file.content_type.clone(),
        };

        let metadata = NewImageMetadata {
            filename: object_name,
            original_name: file.file_name,
            url: outcome.url.clone(),
            size: outcome.size as i64,
            mime_type: outcome.mime_type.clone(),
            section: target_section.map(str::to_string),
            field: target_field.map(str::to_string),
        };
        self.record_metadata(&metadata).await;

        Ok(outcome)
    }

    // The file is already reachable by URL; a missing record only hides it
    // from the gallery.
    async fn record_metadata(&self, metadata: &NewImageMetadata) {
        let Some(images) = &self.images else {
            return;
        };
        if let Err(e) = images.insert_image(metadata).await {
            warn!(
                "Uploaded {} but could not record its metadata: {e}",
                metadata.url
            );
        }
    }

    pub async fn list_stored(&self) -> Result<Vec<StoredBlob>, SiteError> {
        self.backend.list().await.map_err(|e| {
            SiteError::RemoteUnavailable(format!("{} listing failed: {e:#}", self.backend.name()))
        })
    }
}
