pub mod content;
pub mod image;
pub mod property;
pub mod schema;
pub mod settings;

use std::sync::Arc;

use async_trait::async_trait;
use diesel::{Connection, PgConnection};

use crate::{
    error::StoreError,
    models::{
        content::{ContentEntry, InsertableContent},
        image::{ImageMetadata, NewImageMetadata},
        property::Property,
    },
};

#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn load_properties(&self) -> Result<Vec<Property>, StoreError>;
    async fn insert_properties(&self, properties: &[Property]) -> Result<(), StoreError>;
    async fn update_property(&self, property: &Property) -> Result<(), StoreError>;
    async fn delete_property(&self, id: i32) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn load_content(&self) -> Result<Vec<ContentEntry>, StoreError>;
    async fn upsert_content(&self, entry: &ContentEntry) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn list_images(&self) -> Result<Vec<ImageMetadata>, StoreError>;
    async fn insert_image(&self, image: &NewImageMetadata) -> Result<ImageMetadata, StoreError>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get_setting(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;
    async fn put_setting(&self, key: &str, value: &serde_json::Value) -> Result<(), StoreError>;
}

pub fn establish_connection(database_url: &str) -> Result<PgConnection, StoreError> {
    Ok(PgConnection::establish(database_url)?)
}

/// Hosted Postgres. Diesel is synchronous, so every call opens a
/// connection on the blocking pool.
#[derive(Clone)]
pub struct PgDatabase {
    database_url: Arc<str>,
}

impl std::fmt::Debug for PgDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgDatabase").finish_non_exhaustive()
    }
}

impl PgDatabase {
    pub fn new(database_url: &str) -> Self {
        PgDatabase {
            database_url: Arc::from(database_url),
        }
    }

    async fn run<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let url = self.database_url.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&url)?;
            op(&mut conn)
        })
        .await?
    }
}

#[async_trait]
impl PropertyRepository for PgDatabase {
    async fn load_properties(&self) -> Result<Vec<Property>, StoreError> {
        self.run(property::get_all).await
    }

    async fn insert_properties(&self, properties: &[Property]) -> Result<(), StoreError> {
        let rows = property::to_rows(properties)?;
        self.run(move |conn| property::insert(conn, rows)).await
    }

    async fn update_property(&self, p: &Property) -> Result<(), StoreError> {
        let mut rows = property::to_rows(std::slice::from_ref(p))?;
        let row = rows.remove(0);
        self.run(move |conn| property::update(conn, row)).await
    }

    async fn delete_property(&self, id: i32) -> Result<(), StoreError> {
        self.run(move |conn| property::delete(conn, id)).await
    }
}

#[async_trait]
impl ContentRepository for PgDatabase {
    async fn load_content(&self) -> Result<Vec<ContentEntry>, StoreError> {
        self.run(content::get_all).await
    }

    async fn upsert_content(&self, entry: &ContentEntry) -> Result<(), StoreError> {
        let row: InsertableContent = entry.into();
        self.run(move |conn| content::upsert(conn, row)).await
    }
}

#[async_trait]
impl ImageRepository for PgDatabase {
    async fn list_images(&self) -> Result<Vec<ImageMetadata>, StoreError> {
        self.run(image::get_all).await
    }

    async fn insert_image(&self, new_image: &NewImageMetadata) -> Result<ImageMetadata, StoreError> {
        let row = new_image.clone();
        self.run(move |conn| image::insert(conn, row)).await
    }
}

#[async_trait]
impl SettingsRepository for PgDatabase {
    async fn get_setting(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let key = key.to_string();
        self.run(move |conn| settings::get(conn, &key)).await
    }

    async fn put_setting(&self, key: &str, value: &serde_json::Value) -> Result<(), StoreError> {
        let key = key.to_string();
        let raw = value.to_string();
        self.run(move |conn| settings::upsert(conn, key, raw)).await
    }
}
