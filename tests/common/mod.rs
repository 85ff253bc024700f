#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use chrono::Utc;
use estate_site::{
    auth::StaticTokenVerifier,
    cache::LocalCache,
    config::{self, Config},
    context::{AppContext, RemoteStores},
    db::{ContentRepository, ImageRepository, PropertyRepository, SettingsRepository},
    error::StoreError,
    models::{
        content::ContentEntry,
        image::{ImageMetadata, NewImageMetadata},
        property::{Property, PropertyDraft, PropertyStatus, TransactionType},
    },
    upload::mock::MockBackend,
};

pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Stand-in for the hosted database. `fail` makes every call report the
/// database as unreachable.
#[derive(Default)]
pub struct MemoryDatabase {
    pub properties: Mutex<Vec<Property>>,
    pub content: Mutex<HashMap<(String, String), ContentEntry>>,
    pub images: Mutex<Vec<ImageMetadata>>,
    pub settings: Mutex<HashMap<String, serde_json::Value>>,
    pub fail: AtomicBool,
    pub fail_images: AtomicBool,
    pub images_table_missing: AtomicBool,
    pub content_writes: AtomicUsize,
    pub property_writes: AtomicUsize,
    next_image_id: AtomicI32,
}

impl MemoryDatabase {
    pub fn new() -> Arc<Self> {
        Arc::new(MemoryDatabase::default())
    }

    pub fn failing() -> Arc<Self> {
        let db = MemoryDatabase::default();
        db.fail.store(true, Ordering::SeqCst);
        Arc::new(db)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    pub fn stored_content(&self, section: &str, field: &str) -> Option<ContentEntry> {
        self.content
            .lock()
            .unwrap()
            .get(&(section.to_string(), field.to_string()))
            .cloned()
    }
}

#[async_trait]
impl PropertyRepository for MemoryDatabase {
    async fn load_properties(&self) -> Result<Vec<Property>, StoreError> {
        self.check()?;
        Ok(self.properties.lock().unwrap().clone())
    }

    async fn insert_properties(&self, properties: &[Property]) -> Result<(), StoreError> {
        self.check()?;
        self.property_writes.fetch_add(1, Ordering::SeqCst);
        // Stored the way the real table does: lists as JSON text.
        let mut stored = self.properties.lock().unwrap();
        for p in properties {
            let features = serde_json::to_string(&p.features).unwrap();
            let images = serde_json::to_string(&p.images).unwrap();
            let mut copy = p.clone();
            copy.features = serde_json::from_str(&features).unwrap();
            copy.images = serde_json::from_str(&images).unwrap();
            stored.push(copy);
        }
        Ok(())
    }

    async fn update_property(&self, property: &Property) -> Result<(), StoreError> {
        self.check()?;
        self.property_writes.fetch_add(1, Ordering::SeqCst);
        let mut stored = self.properties.lock().unwrap();
        if let Some(existing) = stored.iter_mut().find(|p| p.id == property.id) {
            *existing = property.clone();
        }
        Ok(())
    }

    async fn delete_property(&self, id: i32) -> Result<(), StoreError> {
        self.check()?;
        self.property_writes.fetch_add(1, Ordering::SeqCst);
        self.properties.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }
}

#[async_trait]
impl ContentRepository for MemoryDatabase {
    async fn load_content(&self) -> Result<Vec<ContentEntry>, StoreError> {
        self.check()?;
        Ok(self.content.lock().unwrap().values().cloned().collect())
    }

    async fn upsert_content(&self, entry: &ContentEntry) -> Result<(), StoreError> {
        self.check()?;
        self.content_writes.fetch_add(1, Ordering::SeqCst);
        self.content
            .lock()
            .unwrap()
            .insert((entry.section.clone(), entry.field.clone()), entry.clone());
        Ok(())
    }
}

#[async_trait]
impl ImageRepository for MemoryDatabase {
    async fn list_images(&self) -> Result<Vec<ImageMetadata>, StoreError> {
        self.check()?;
        if self.images_table_missing.load(Ordering::SeqCst) {
            return Err(StoreError::MissingTable(
                "relation \"uploaded_images\" does not exist".to_string(),
            ));
        }
        Ok(self.images.lock().unwrap().clone())
    }

    async fn insert_image(&self, image: &NewImageMetadata) -> Result<ImageMetadata, StoreError> {
        self.check()?;
        if self.fail_images.load(Ordering::SeqCst) {
            return Err(StoreError::Query("insert rejected".to_string()));
        }
        let saved = ImageMetadata {
            id: self.next_image_id.fetch_add(1, Ordering::SeqCst) + 1,
            filename: image.filename.clone(),
            original_name: image.original_name.clone(),
            url: image.url.clone(),
            size: image.size,
            mime_type: image.mime_type.clone(),
            section: image.section.clone(),
            field: image.field.clone(),
            created_at: Utc::now(),
        };
        self.images.lock().unwrap().push(saved.clone());
        Ok(saved)
    }
}

#[async_trait]
impl SettingsRepository for MemoryDatabase {
    async fn get_setting(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        self.check()?;
        Ok(self.settings.lock().unwrap().get(key).cloned())
    }

    async fn put_setting(&self, key: &str, value: &serde_json::Value) -> Result<(), StoreError> {
        self.check()?;
        self.settings
            .lock()
            .unwrap()
            .insert(key.to_string(), value.clone());
        Ok(())
    }
}

pub fn test_config() -> Config {
    config::create_test_config()
}

pub fn context_with(config: Config, database: Option<Arc<MemoryDatabase>>) -> AppContext {
    AppContext::build(
        Arc::new(config),
        database.map(RemoteStores::from_database),
        Arc::new(LocalCache::in_memory()),
        Arc::new(MockBackend::new(Some("https://mock.local"))),
        Arc::new(StaticTokenVerifier::new(ADMIN_TOKEN)),
    )
}

pub fn draft(title: &str, transaction_type: TransactionType) -> PropertyDraft {
    PropertyDraft {
        title: title.to_string(),
        description: "A listing used in tests".to_string(),
        price: 120000.0,
        transaction_type,
        address: "Via Garibaldi 1".to_string(),
        city: "Treviso".to_string(),
        province: "TV".to_string(),
        bedrooms: 2,
        bathrooms: 1,
        size: 70.5,
        floor: Some(2),
        total_floors: Some(4),
        year_built: Some(1990),
        energy_class: Some("B".to_string()),
        features: vec!["Balcony".to_string(), "Garage, double".to_string()],
        images: vec![
            "https://cdn.example.com/a.jpg".to_string(),
            "https://cdn.example.com/b \"quoted\".jpg".to_string(),
        ],
        status: PropertyStatus::Available,
        featured: false,
    }
}
