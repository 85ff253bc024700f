use std::sync::Arc;

use log::warn;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    cache::LocalCache,
    db::SettingsRepository,
    error::SiteError,
    models::settings::{CompanyInfo, SocialLinks, COMPANY_INFO_KEY, SOCIAL_LINKS_KEY},
};

/// Small keyed bag of site-wide JSON values (company info, social links).
pub struct SettingsStore {
    remote: Option<Arc<dyn SettingsRepository>>,
    cache: Arc<LocalCache>,
}

impl SettingsStore {
    pub fn new(remote: Option<Arc<dyn SettingsRepository>>, cache: Arc<LocalCache>) -> Self {
        SettingsStore { remote, cache }
    }

    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        if let Some(remote) = &self.remote {
            match remote.get_setting(key).await {
                Ok(Some(value)) => return Some(value),
                Ok(None) => {}
                Err(e) => warn!("Could not read setting {key}, using local cache: {e}"),
            }
        }
        self.cache.setting(key).await
    }

    pub async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), SiteError> {
        if key.trim().is_empty() {
            return Err(SiteError::validation("setting key is required"));
        }

        self.cache.store_setting(key, value.clone()).await;

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.put_setting(key, &value).await {
                warn!("Setting {key} saved locally only: {e}");
            }
        }
        Ok(())
    }

    async fn get_typed<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.get(key)
            .await
            .and_then(|value| match serde_json::from_value(value) {
                Ok(typed) => Some(typed),
                Err(e) => {
                    warn!("Setting {key} has an unexpected shape: {e}");
                    None
                }
            })
            .unwrap_or_default()
    }

    async fn set_typed<T: Serialize>(&self, key: &str, value: &T) -> Result<(), SiteError> {
        let value = serde_json::to_value(value).map_err(anyhow::Error::from)?;
        self.set(key, value).await
    }

    pub async fn company_info(&self) -> CompanyInfo {
        self.get_typed(COMPANY_INFO_KEY).await
    }

    pub async fn set_company_info(&self, info: &CompanyInfo) -> Result<(), SiteError> {
        self.set_typed(COMPANY_INFO_KEY, info).await
    }

    pub async fn social_links(&self) -> SocialLinks {
        self.get_typed(SOCIAL_LINKS_KEY).await
    }

    pub async fn set_social_links(&self, links: &SocialLinks) -> Result<(), SiteError> {
        self.set_typed(SOCIAL_LINKS_KEY, links).await
    }
}
