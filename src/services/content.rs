use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::Duration,
};

use futures::future::join_all;
use log::{debug, info, warn};
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    sync::{Mutex as AsyncMutex, RwLock},
    task::JoinHandle,
};

use crate::{
    cache::LocalCache,
    db::ContentRepository,
    error::SiteError,
    models::content::{ColorPalette, ContentEntry, ContentKey, ContentValue},
};

pub const COLORS_FIELD: &str = "colors";
pub const CUSTOM_CSS_FIELD: &str = "customCss";

/// Sparse map of admin edits laid over the site's built-in copy.
///
/// Reads never fail: a missing entry resolves to the caller's default.
/// Writes update memory and the local cache at once; the remote write for
/// each `(section, field)` waits until that key has been quiet for the
/// debounce window, then persists its latest value.
#[derive(Clone)]
pub struct ContentOverlay {
    inner: Arc<Inner>,
}

struct Inner {
    entries: RwLock<HashMap<ContentKey, ContentValue>>,
    remote: Option<Arc<dyn ContentRepository>>,
    cache: Arc<LocalCache>,
    debounce: Duration,
    pending: Mutex<HashMap<ContentKey, PendingWrite>>,
    writes: Mutex<HashMap<ContentKey, Arc<AsyncMutex<()>>>>,
    generation: AtomicU64,
    initialized: AtomicBool,
}

struct PendingWrite {
    generation: u64,
    handle: JoinHandle<()>,
}

impl ContentOverlay {
    pub fn new(
        remote: Option<Arc<dyn ContentRepository>>,
        cache: Arc<LocalCache>,
        debounce: Duration,
    ) -> Self {
        ContentOverlay {
            inner: Arc::new(Inner {
                entries: RwLock::new(HashMap::new()),
                remote,
                cache,
                debounce,
                pending: Mutex::new(HashMap::new()),
                writes: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
                initialized: AtomicBool::new(false),
            }),
        }
    }

    /// Loads remote entries, or the local mirror when the remote is absent
    /// or fails.
    pub async fn initialize(&self) {
        let remote_entries = match &self.inner.remote {
            Some(remote) => match remote.load_content().await {
                Ok(entries) => Some(entries),
                Err(e) => {
                    warn!("Could not load CMS content, using local cache: {e}");
                    None
                }
            },
            None => None,
        };

        let entries = match remote_entries {
            Some(entries) => {
                self.inner.cache.store_content(entries.clone()).await;
                entries
            }
            None => self.inner.cache.content().await,
        };

        info!("CMS overlay holds {} entries", entries.len());
        let mut map = self.inner.entries.write().await;
        *map = entries
            .into_iter()
            .map(|entry| (entry.key(), entry.value))
            .collect();
        drop(map);

        self.inner.initialized.store(true, Ordering::Release);
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::Acquire)
    }

    pub async fn get_value(&self, section: &str, field: &str) -> Option<ContentValue> {
        self.inner
            .entries
            .read()
            .await
            .get(&ContentKey::new(section, field))
            .cloned()
    }

    /// Resolved copy for an editable region. An empty stored string means
    /// the admin removed the content and is returned as is.
    pub async fn get_content(&self, section: &str, field: &str, default: &str) -> String {
        match self.get_value(section, field).await {
            Some(value) => value.to_text(),
            None => default.to_string(),
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, section: &str, field: &str) -> Option<T> {
        match self.get_value(section, field).await? {
            ContentValue::Json(value) => serde_json::from_value(value).ok(),
            ContentValue::Text(text) => serde_json::from_str(&text)
                .or_else(|_| serde_json::from_value(serde_json::Value::String(text)))
                .ok(),
        }
    }

    pub async fn all_entries(&self) -> Vec<ContentEntry> {
        sorted_entries(&*self.inner.entries.read().await)
    }

    pub async fn section_entries(&self, section: &str) -> Vec<ContentEntry> {
        self.all_entries()
            .await
            .into_iter()
            .filter(|entry| entry.section == section)
            .collect()
    }

    pub async fn update_content(
        &self,
        section: &str,
        field: &str,
        value: impl Into<ContentValue>,
    ) -> Result<(), SiteError> {
        if section.trim().is_empty() || field.trim().is_empty() {
            return Err(SiteError::validation("section and field are required"));
        }

        let key = ContentKey::new(section, field);
        {
            // The mirror is written under the entries lock so concurrent
            // edits reach it in the order they reached memory.
            let mut entries = self.inner.entries.write().await;
            entries.insert(key.clone(), value.into());
            self.inner.cache.store_content(sorted_entries(&entries)).await;
        }

        if self.inner.remote.is_some() {
            self.schedule_persist(key);
        }
        Ok(())
    }

    pub async fn update_json<T: Serialize>(
        &self,
        section: &str,
        field: &str,
        value: &T,
    ) -> Result<(), SiteError> {
        let value = serde_json::to_value(value).map_err(anyhow::Error::from)?;
        self.update_content(section, field, value).await
    }

    /// Stores an empty string, which pages render as "removed".
    pub async fn clear_content(&self, section: &str, field: &str) -> Result<(), SiteError> {
        self.update_content(section, field, "").await
    }

    pub async fn get_colors(&self, section: &str) -> ColorPalette {
        self.get_json(section, COLORS_FIELD).await.unwrap_or_default()
    }

    pub async fn update_colors(&self, section: &str, palette: &ColorPalette) -> Result<(), SiteError> {
        self.update_json(section, COLORS_FIELD, palette).await
    }

    pub async fn get_custom_css(&self, section: &str) -> String {
        self.get_content(section, CUSTOM_CSS_FIELD, "").await
    }

    pub async fn update_custom_css(&self, section: &str, css: &str) -> Result<(), SiteError> {
        self.update_content(section, CUSTOM_CSS_FIELD, css).await
    }

    /// Number of keys waiting for their debounced remote write.
    pub fn pending_writes(&self) -> usize {
        self.inner.lock_pending().len()
    }

    /// Persists every pending key now instead of waiting for its timer.
    pub async fn flush(&self) {
        let keys: Vec<ContentKey> = {
            let mut pending = self.inner.lock_pending();
            pending
                .drain()
                .map(|(key, write)| {
                    write.handle.abort();
                    key
                })
                .collect()
        };

        if !keys.is_empty() {
            info!("Flushing {} pending CMS writes", keys.len());
        }
        join_all(keys.iter().map(|key| self.inner.persist(key))).await;

        // Timers that fired before the flush may still be writing.
        let in_flight: Vec<_> = self.inner.lock_writes().values().cloned().collect();
        for lock in in_flight {
            drop(lock.lock().await);
        }
    }

    fn schedule_persist(&self, key: ContentKey) {
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
        let mut pending = self.inner.lock_pending();
        if let Some(previous) = pending.remove(&key) {
            previous.handle.abort();
        }

        let inner = self.inner.clone();
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            // Deregister before writing so a later edit schedules a fresh
            // timer instead of aborting this write. A newer edit that got
            // here first owns the key.
            {
                let mut pending = inner.lock_pending();
                match pending.get(&task_key) {
                    Some(write) if write.generation == generation => {
                        pending.remove(&task_key);
                    }
                    _ => return,
                }
            }
            inner.persist(&task_key).await;
        });
        pending.insert(key, PendingWrite { generation, handle });
    }
}

impl Inner {
    fn lock_pending(&self) -> MutexGuard<'_, HashMap<ContentKey, PendingWrite>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_writes(&self) -> MutexGuard<'_, HashMap<ContentKey, Arc<AsyncMutex<()>>>> {
        self.writes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Writes for one key run one at a time, each sending the value current
    /// when it starts, so the latest edit is always the last to land.
    async fn persist(&self, key: &ContentKey) {
        let Some(remote) = &self.remote else {
            return;
        };
        let write_lock = self.lock_writes().entry(key.clone()).or_default().clone();
        let _write = write_lock.lock().await;

        let Some(value) = self.entries.read().await.get(key).cloned() else {
            return;
        };

        let entry = ContentEntry {
            section: key.section.clone(),
            field: key.field.clone(),
            value,
        };
        match remote.upsert_content(&entry).await {
            Ok(()) => debug!("Persisted CMS field {}.{}", key.section, key.field),
            Err(e) => warn!(
                "CMS field {}.{} kept in local cache only: {e}",
                key.section, key.field
            ),
        }
    }
}

fn sorted_entries(entries: &HashMap<ContentKey, ContentValue>) -> Vec<ContentEntry> {
    let mut sorted: Vec<ContentEntry> = entries
        .iter()
        .map(|(key, value)| ContentEntry {
            section: key.section.clone(),
            field: key.field.clone(),
            value: value.clone(),
        })
        .collect();
    sorted.sort_by(|a, b| (&a.section, &a.field).cmp(&(&b.section, &b.field)));
    sorted
}
