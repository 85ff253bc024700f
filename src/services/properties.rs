use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::Utc;
use log::{error, info, warn};
use tokio::sync::RwLock;

use super::seed::sample_properties;
use crate::{
    db::PropertyRepository,
    error::SiteError,
    models::property::{Property, PropertyDraft, PropertyPatch, TransactionType},
};

/// In-memory catalogue with write-through to the remote database.
///
/// Mutations land in memory first and are then written remotely. A failed
/// remote write is logged and not rolled back, so memory may be the only
/// copy until the next restart. Last writer wins.
pub struct PropertyStore {
    properties: RwLock<Vec<Property>>,
    remote: Option<Arc<dyn PropertyRepository>>,
    initialized: AtomicBool,
}

impl PropertyStore {
    pub fn new(remote: Option<Arc<dyn PropertyRepository>>) -> Self {
        PropertyStore {
            properties: RwLock::new(Vec::new()),
            remote,
            initialized: AtomicBool::new(false),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Hydrates the catalogue. Always leaves the store with content.
    pub async fn initialize(&self) {
        let loaded = match &self.remote {
            None => {
                info!("No remote database configured, serving sample properties");
                sample_properties()
            }
            Some(remote) => match remote.load_properties().await {
                Ok(existing) if existing.is_empty() => {
                    info!("Property table is empty, inserting seed listings");
                    let seeds = sample_properties();
                    if let Err(e) = remote.insert_properties(&seeds).await {
                        error!("Could not seed property table: {e}");
                    }
                    seeds
                }
                Ok(existing) => {
                    info!("Loaded {} properties from remote database", existing.len());
                    existing
                }
                Err(e) => {
                    warn!("Could not load properties, falling back to samples: {e}");
                    sample_properties()
                }
            },
        };

        *self.properties.write().await = loaded;
        self.initialized.store(true, Ordering::Release);
    }

    pub async fn get_all(&self) -> Vec<Property> {
        self.properties.read().await.clone()
    }

    pub async fn get_by_id(&self, id: i32) -> Option<Property> {
        self.properties
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub async fn get_by_type(&self, transaction_type: TransactionType) -> Vec<Property> {
        self.properties
            .read()
            .await
            .iter()
            .filter(|p| p.transaction_type == transaction_type)
            .cloned()
            .collect()
    }

    pub async fn get_featured(&self) -> Vec<Property> {
        self.properties
            .read()
            .await
            .iter()
            .filter(|p| p.featured)
            .cloned()
            .collect()
    }

    pub async fn add(&self, draft: PropertyDraft) -> Result<Property, SiteError> {
        draft.validate()?;

        let created = {
            let mut properties = self.properties.write().await;
            let next_id = properties.iter().map(|p| p.id).max().unwrap_or(0) + 1;
            let created = draft.into_property(next_id, Utc::now());
            properties.push(created.clone());
            created
        };

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.insert_properties(std::slice::from_ref(&created)).await {
                error!(
                    "Property {} kept in memory only, remote insert failed: {e}",
                    created.id
                );
            }
        }

        Ok(created)
    }

    pub async fn update(&self, id: i32, patch: PropertyPatch) -> Result<Property, SiteError> {
        let updated = {
            let mut properties = self.properties.write().await;
            let current = properties
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| SiteError::NotFound(format!("property {id}")))?;

            let next = current.patched(patch, Utc::now());
            next.validate()?;
            *current = next.clone();
            next
        };

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.update_property(&updated).await {
                error!("Property {id} updated in memory only, remote update failed: {e}");
            }
        }

        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> Result<(), SiteError> {
        {
            let mut properties = self.properties.write().await;
            let before = properties.len();
            properties.retain(|p| p.id != id);
            if properties.len() == before {
                return Err(SiteError::NotFound(format!("property {id}")));
            }
        }

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.delete_property(id).await {
                error!("Property {id} deleted in memory only, remote delete failed: {e}");
            }
        }

        Ok(())
    }
}
