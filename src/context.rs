use std::{path::Path, sync::Arc};

use log::info;

use crate::{
    auth::{verifier_from_config, AdminVerifier},
    cache::LocalCache,
    config::Config,
    db::{ContentRepository, ImageRepository, PgDatabase, PropertyRepository, SettingsRepository},
    services::{content::ContentOverlay, properties::PropertyStore, settings::SettingsStore},
    upload::{backend::UploadBackend, backend_from_config, UploadLimits, UploadPipeline},
};

/// The remote tables, one handle per concern.
#[derive(Clone)]
pub struct RemoteStores {
    pub properties: Arc<dyn PropertyRepository>,
    pub content: Arc<dyn ContentRepository>,
    pub images: Arc<dyn ImageRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl RemoteStores {
    pub fn from_database<D>(database: Arc<D>) -> Self
    where
        D: PropertyRepository + ContentRepository + ImageRepository + SettingsRepository + 'static,
    {
        RemoteStores {
            properties: database.clone(),
            content: database.clone(),
            images: database.clone(),
            settings: database,
        }
    }
}

/// Every service the HTTP layer needs, wired once at startup.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub properties: Arc<PropertyStore>,
    pub content: ContentOverlay,
    pub settings: Arc<SettingsStore>,
    pub uploads: Arc<UploadPipeline>,
    pub images: Option<Arc<dyn ImageRepository>>,
    pub admin: Arc<dyn AdminVerifier>,
}

impl AppContext {
    pub fn build(
        config: Arc<Config>,
        remote: Option<RemoteStores>,
        cache: Arc<LocalCache>,
        upload_backend: Arc<dyn UploadBackend>,
        admin: Arc<dyn AdminVerifier>,
    ) -> Self {
        let limits = UploadLimits {
            max_bytes: config
                .upload
                .max_bytes
                .unwrap_or(UploadLimits::default().max_bytes),
            ..UploadLimits::default()
        };

        let properties = Arc::new(PropertyStore::new(
            remote.as_ref().map(|r| r.properties.clone()),
        ));
        let content = ContentOverlay::new(
            remote.as_ref().map(|r| r.content.clone()),
            cache.clone(),
            config.debounce(),
        );
        let settings = Arc::new(SettingsStore::new(
            remote.as_ref().map(|r| r.settings.clone()),
            cache,
        ));
        let images = remote.as_ref().map(|r| r.images.clone());
        let uploads = Arc::new(UploadPipeline::new(upload_backend, images.clone(), limits));

        AppContext {
            config,
            properties,
            content,
            settings,
            uploads,
            images,
            admin,
        }
    }

    pub async fn from_config(config: Arc<Config>) -> Self {
        let cache = Arc::new(LocalCache::open(config.local_cache_path.as_deref().map(Path::new)).await);

        let remote = match &config.database_url {
            Some(url) => {
                info!("Using remote database");
                Some(RemoteStores::from_database(Arc::new(PgDatabase::new(url))))
            }
            None => {
                info!("DATABASE_URL not set, running on local data only");
                None
            }
        };

        let upload_backend = backend_from_config(&config.upload);
        let admin: Arc<dyn AdminVerifier> = Arc::from(verifier_from_config(&config.auth));

        AppContext::build(config, remote, cache, upload_backend, admin)
    }

    pub fn database_configured(&self) -> bool {
        self.images.is_some()
    }

    pub async fn initialize(&self) {
        tokio::join!(self.properties.initialize(), self.content.initialize());
    }
}
