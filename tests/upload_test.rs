mod common;

#[cfg(test)]
mod upload_pipeline {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    use anyhow::Result;
    use async_trait::async_trait;
    use axum::{
        extract::{Multipart, Path},
        http::{HeaderMap, StatusCode},
        routing::{get, post, put},
        Json, Router,
    };
    use estate_site::{
        config::{UploadBackendKind, UploadConfig},
        db::ImageRepository,
        error::SiteError,
        upload::{
            backend::{StoredBlob, UploadBackend},
            backend_from_config,
            direct_token::DirectTokenBackend,
            mock::MockBackend,
            object_name_for,
            server_relay::ServerRelayBackend,
            UploadFile, UploadLimits, UploadPipeline,
        },
    };
    use serde_json::{json, Value};

    use crate::common::MemoryDatabase;

    #[derive(Default)]
    struct CountingBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl UploadBackend for CountingBackend {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn put(&self, object_name: &str, _file: &UploadFile) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("https://files.test/{object_name}"))
        }

        async fn list(&self) -> Result<Vec<StoredBlob>> {
            Ok(Vec::new())
        }
    }

    fn png(size: usize) -> UploadFile {
        UploadFile {
            file_name: "Front View.PNG".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![7u8; size],
        }
    }

    fn limits(max_bytes: u64) -> UploadLimits {
        UploadLimits {
            max_bytes,
            ..UploadLimits::default()
        }
    }

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn oversized_file_is_rejected_before_any_network_call() {
        let backend = Arc::new(CountingBackend::default());
        let db = MemoryDatabase::new();
        let pipeline = UploadPipeline::new(
            backend.clone(),
            Some(db.clone() as Arc<dyn ImageRepository>),
            limits(1024),
        );

        let result = pipeline.upload(png(1025), Some("hero"), Some("image")).await;

        assert!(matches!(result, Err(SiteError::Validation(_))));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert!(db.images.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn disallowed_type_is_rejected() {
        let backend = Arc::new(CountingBackend::default());
        let pipeline = UploadPipeline::new(backend.clone(), None, limits(1024));
        let file = UploadFile {
            file_name: "notes.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: vec![1; 10],
        };

        let err = pipeline.upload(file, None, None).await.unwrap_err();

        assert!(err.to_string().contains("application/pdf"));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let pipeline = UploadPipeline::new(Arc::new(CountingBackend::default()), None, limits(1024));

        let result = pipeline.upload(png(0), None, None).await;

        assert!(matches!(result, Err(SiteError::Validation(_))));
    }

    #[tokio::test]
    async fn successful_upload_records_metadata() {
        let db = MemoryDatabase::new();
        let pipeline = UploadPipeline::new(
            Arc::new(MockBackend::new(Some("https://mock.local"))),
            Some(db.clone() as Arc<dyn ImageRepository>),
            limits(1024),
        );

        let outcome = pipeline.upload(png(512), Some("hero"), Some("image")).await.unwrap();

        assert!(outcome.url.starts_with("https://mock.local/uploads/"));
        assert!(outcome.url.ends_with("front-view.png"));
        assert_eq!(outcome.size, 512);
        assert_eq!(outcome.mime_type, "image/png");

        let images = db.images.lock().unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].url, outcome.url);
        assert_eq!(images[0].original_name, "Front View.PNG");
        assert_eq!(images[0].section.as_deref(), Some("hero"));
        assert_eq!(images[0].field.as_deref(), Some("image"));
    }

    #[tokio::test]
    async fn metadata_failure_does_not_fail_the_upload() {
        let db = MemoryDatabase::new();
        db.fail_images.store(true, Ordering::SeqCst);
        let pipeline = UploadPipeline::new(
            Arc::new(MockBackend::new(None)),
            Some(db.clone() as Arc<dyn ImageRepository>),
            limits(1024),
        );

        let outcome = pipeline.upload(png(10), None, None).await;

        assert!(outcome.is_ok());
        assert!(db.images.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mock_backend_lists_what_it_stored() {
        let pipeline = UploadPipeline::new(Arc::new(MockBackend::new(None)), None, limits(1024));

        let outcome = pipeline.upload(png(10), None, None).await.unwrap();
        let stored = pipeline.list_stored().await.unwrap();

        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].url, outcome.url);
        assert_eq!(stored[0].size, 10);
    }

    #[tokio::test]
    async fn direct_token_backend_puts_bytes_with_bearer_token() {
        let seen: Arc<Mutex<Vec<(String, String, usize)>>> = Arc::default();
        let seen_by_stub = seen.clone();
        let stub = Router::new()
            .route(
                "/uploads/:name",
                put(move |Path(name): Path<String>, headers: HeaderMap, body: axum::body::Bytes| {
                    let seen = seen_by_stub.clone();
                    async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        if auth != "Bearer blob-token" {
                            return Err(StatusCode::FORBIDDEN);
                        }
                        let content_type = headers
                            .get("x-content-type")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        seen.lock().unwrap().push((auth, content_type, body.len()));
                        Ok(Json(json!({ "url": format!("https://blob.test/uploads/{name}") })))
                    }
                }),
            )
            .route(
                "/",
                get(|| async {
                    Json(json!({
                        "blobs": [{
                            "url": "https://blob.test/uploads/a.png",
                            "pathname": "uploads/a.png",
                            "size": 3,
                            "uploadedAt": "2024-05-01T10:00:00Z"
                        }]
                    }))
                }),
            );
        let base = spawn_stub(stub).await;
        let pipeline = UploadPipeline::new(
            Arc::new(DirectTokenBackend::new("blob-token", Some(&base))),
            None,
            limits(1024),
        );

        let outcome = pipeline.upload(png(64), None, None).await.unwrap();
        let listed = pipeline.list_stored().await.unwrap();

        assert!(outcome.url.starts_with("https://blob.test/uploads/"));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, "image/png");
        assert_eq!(seen[0].2, 64);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].pathname, "uploads/a.png");
    }

    #[tokio::test]
    async fn direct_token_backend_surfaces_rejected_token() {
        let stub = Router::new().route(
            "/uploads/:name",
            put(|| async { StatusCode::FORBIDDEN }),
        );
        let base = spawn_stub(stub).await;
        let db = MemoryDatabase::new();
        let pipeline = UploadPipeline::new(
            Arc::new(DirectTokenBackend::new("wrong", Some(&base))),
            Some(db.clone() as Arc<dyn ImageRepository>),
            limits(1024),
        );

        let result = pipeline.upload(png(8), None, None).await;

        assert!(matches!(result, Err(SiteError::RemoteUnavailable(_))));
        assert!(db.images.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn server_relay_backend_posts_multipart_form() {
        let fields: Arc<Mutex<Vec<(String, Value)>>> = Arc::default();
        let fields_by_stub = fields.clone();
        let stub = Router::new().route(
            "/upload",
            post(move |mut multipart: Multipart| {
                let fields = fields_by_stub.clone();
                async move {
                    while let Some(field) = multipart.next_field().await.unwrap() {
                        let name = field.name().unwrap_or_default().to_string();
                        let value = if name == "file" {
                            json!(field.bytes().await.unwrap().len())
                        } else {
                            json!(field.text().await.unwrap())
                        };
                        fields.lock().unwrap().push((name, value));
                    }
                    Json(json!({ "secure_url": "https://relay.test/site/front-view.png" }))
                }
            }),
        );
        let base = spawn_stub(stub).await;
        let pipeline = UploadPipeline::new(
            Arc::new(ServerRelayBackend::new(
                &format!("{base}/upload"),
                Some("unsigned"),
                Some("site"),
            )),
            None,
            limits(1024),
        );

        let outcome = pipeline.upload(png(32), None, None).await.unwrap();

        assert_eq!(outcome.url, "https://relay.test/site/front-view.png");
        let fields = fields.lock().unwrap();
        let get = |name: &str| fields.iter().find(|(n, _)| n == name).map(|(_, v)| v.clone());
        assert_eq!(get("file"), Some(json!(32)));
        assert_eq!(get("upload_preset"), Some(json!("unsigned")));
        assert_eq!(get("folder"), Some(json!("site")));
        assert!(get("public_id").is_some());
    }

    #[tokio::test]
    async fn server_relay_cannot_list() {
        let pipeline = UploadPipeline::new(
            Arc::new(ServerRelayBackend::new("http://127.0.0.1:9/upload", None, None)),
            None,
            limits(1024),
        );

        assert!(pipeline.list_stored().await.is_err());
    }

    #[test]
    fn backend_is_chosen_from_present_credentials() {
        let mock = backend_from_config(&UploadConfig::default());
        let token = backend_from_config(&UploadConfig {
            blob_token: Some("t".to_string()),
            ..UploadConfig::default()
        });
        let relay = backend_from_config(&UploadConfig {
            relay_url: Some("https://relay.test/upload".to_string()),
            ..UploadConfig::default()
        });
        let forced_without_token = backend_from_config(&UploadConfig {
            backend: Some(UploadBackendKind::DirectToken),
            ..UploadConfig::default()
        });

        assert_eq!(mock.name(), "mock");
        assert_eq!(token.name(), "direct-token");
        assert_eq!(relay.name(), "server-relay");
        assert_eq!(forced_without_token.name(), "mock");
    }

    #[test]
    fn object_names_are_sanitized_and_unique() {
        let a = object_name_for("Villa  Garden (1).JPG");
        let b = object_name_for("Villa  Garden (1).JPG");

        assert!(a.starts_with("uploads/"));
        assert!(a.ends_with("villa-garden-1-.jpg"));
        assert_ne!(a, b);
        assert!(object_name_for("???").ends_with("-file"));
    }
}
