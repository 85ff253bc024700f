mod common;

#[cfg(test)]
mod settings {
    use std::sync::{atomic::Ordering, Arc};

    use estate_site::{
        cache::LocalCache,
        config::{parse_config, UploadBackendKind},
        db::SettingsRepository,
        error::SiteError,
        models::settings::{CompanyInfo, SocialLinks, COMPANY_INFO_KEY},
        services::settings::SettingsStore,
    };
    use serde_json::json;

    use crate::common::MemoryDatabase;

    fn store_with(db: Option<Arc<MemoryDatabase>>, cache: Arc<LocalCache>) -> SettingsStore {
        SettingsStore::new(db.map(|db| db as Arc<dyn SettingsRepository>), cache)
    }

    #[tokio::test]
    async fn missing_setting_is_none_and_typed_reads_default() {
        let store = store_with(None, Arc::new(LocalCache::in_memory()));

        assert_eq!(store.get("anything").await, None);
        assert_eq!(store.company_info().await, CompanyInfo::default());
        assert_eq!(store.social_links().await, SocialLinks::default());
    }

    #[tokio::test]
    async fn set_writes_remote_and_cache() {
        let db = MemoryDatabase::new();
        let cache = Arc::new(LocalCache::in_memory());
        let store = store_with(Some(db.clone()), cache.clone());

        let info = CompanyInfo {
            name: "Casa Nostra Immobiliare".to_string(),
            phone: "+39 045 123456".to_string(),
            ..CompanyInfo::default()
        };
        store.set_company_info(&info).await.unwrap();

        assert_eq!(store.company_info().await, info);
        assert!(db.settings.lock().unwrap().contains_key(COMPANY_INFO_KEY));
        assert!(cache.setting(COMPANY_INFO_KEY).await.is_some());
    }

    #[tokio::test]
    async fn unreachable_remote_falls_back_to_cache() {
        let db = MemoryDatabase::new();
        let store = store_with(Some(db.clone()), Arc::new(LocalCache::in_memory()));
        db.fail.store(true, Ordering::SeqCst);

        store
            .set("social_links", json!({ "instagram": "https://instagram.com/casa" }))
            .await
            .unwrap();

        let links = store.social_links().await;
        assert_eq!(links.instagram.as_deref(), Some("https://instagram.com/casa"));
        assert_eq!(links.facebook, None);
        assert!(db.settings.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unexpected_shape_reads_as_default() {
        let store = store_with(None, Arc::new(LocalCache::in_memory()));

        store.set(COMPANY_INFO_KEY, json!("just a name")).await.unwrap();

        assert_eq!(store.company_info().await, CompanyInfo::default());
    }

    #[tokio::test]
    async fn blank_key_is_rejected() {
        let store = store_with(None, Arc::new(LocalCache::in_memory()));

        let err = store.set("  ", json!(1)).await.unwrap_err();

        assert!(matches!(err, SiteError::Validation(_)));
    }

    #[test]
    fn parses_partial_config() {
        let config = parse_config(
            r#"
            http_bind_address = "127.0.0.1:9000"
            content_debounce_ms = 500

            [upload]
            backend = "server-relay"
            relay_url = "https://relay.test/upload"
            max_bytes = 2048

            [auth]
            admin_token = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.http_bind_address.as_deref(), Some("127.0.0.1:9000"));
        assert_eq!(config.debounce().as_millis(), 500);
        assert_eq!(config.upload.backend, Some(UploadBackendKind::ServerRelay));
        assert_eq!(config.upload.max_bytes, Some(2048));
        assert_eq!(config.auth.admin_token.as_deref(), Some("secret"));
        assert_eq!(config.database_url, None);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("").unwrap();

        assert_eq!(config.debounce().as_millis(), 2000);
        assert_eq!(config.upload.backend, None);
        assert!(config.auth.session_url.is_none());
    }

    #[test]
    fn unknown_backend_is_a_parse_error() {
        assert!(parse_config("[upload]\nbackend = \"ftp\"\n").is_err());
    }
}
