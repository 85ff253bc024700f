mod admin;
mod error;
mod extract;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::{HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::{
    context::AppContext,
    error::{SiteError, StoreError},
    models::{
        content::{ColorPalette, ContentEntry, ContentValue},
        image::{ImageMetadata, NewImageMetadata},
        property::{Property, PropertyDraft, PropertyPatch, TransactionType},
        settings::{CompanyInfo, SocialLinks},
    },
    upload::{backend::StoredBlob, UploadFile, UploadOutcome},
};
use admin::AdminSession;
use extract::{ApiJson, ApiPath, ApiQuery};

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

fn respond<T>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { data })
}

#[derive(Deserialize)]
pub struct PropertyQuery {
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub featured: Option<bool>,
}

#[derive(Deserialize)]
pub struct DefaultQuery {
    pub default: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldResponse {
    pub section: String,
    pub field: String,
    pub value: ContentValue,
    pub is_default: bool,
}

#[derive(Deserialize)]
pub struct UpdateContentRequest {
    pub value: ContentValue,
}

#[derive(Serialize, Deserialize)]
pub struct CustomCss {
    pub css: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database_configured: bool,
    pub upload_backend: &'static str,
    pub properties_initialized: bool,
    pub content_initialized: bool,
}

#[derive(Serialize)]
pub struct SiteInfo {
    pub company: CompanyInfo,
    pub social: SocialLinks,
}

pub fn router(state: AppContext) -> Router {
    // Leave room above the upload ceiling so oversize files reach the
    // pipeline's own validation and get a descriptive error.
    let body_limit = state.uploads.limits().max_bytes.saturating_mul(2) as usize;

    Router::new()
        .route("/api/health", get(health))
        .route("/api/properties", get(list_properties).post(create_property))
        .route(
            "/api/properties/:id",
            get(get_property).put(update_property).delete(delete_property),
        )
        .route("/api/content", get(list_content))
        .route("/api/content/:section", get(section_content))
        .route(
            "/api/content/:section/:field",
            get(get_content_field).put(put_content_field),
        )
        .route("/api/theme/:section/colors", get(get_colors).put(put_colors))
        .route("/api/theme/:section/css", get(get_css).put(put_css))
        .route("/api/images", get(list_images).post(save_image))
        .route("/api/blob", get(list_blobs).post(upload_blob))
        .route("/api/settings/:key", get(get_setting).put(put_setting))
        .route("/api/site-info", get(site_info))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(cors_layer))
        .with_state(state)
}

pub async fn start_http_server(
    state: AppContext,
    mut shutdown_rx: tokio::sync::broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let bind_addr = state
        .config
        .http_bind_address
        .clone()
        .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

    let listener = TcpListener::bind(&bind_addr).await?;
    log::info!("HTTP server listening on {}", bind_addr);
    let app = router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await?;
    Ok(())
}

async fn cors_layer(req: axum::http::Request<axum::body::Body>, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        apply_cors_headers(response.headers_mut());
        *response.status_mut() = StatusCode::NO_CONTENT;
        response
    } else {
        let mut response = next.run(req).await;
        apply_cors_headers(response.headers_mut());
        response
    }
}

fn apply_cors_headers(headers: &mut axum::http::HeaderMap) {
    headers.insert(
        axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        axum::http::header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type, authorization"),
    );
    headers.insert(
        axum::http::header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
}

async fn health(State(state): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        database_configured: state.database_configured(),
        upload_backend: state.uploads.backend_name(),
        properties_initialized: state.properties.is_initialized(),
        content_initialized: state.content.is_initialized(),
    })
}

async fn list_properties(
    State(state): State<AppContext>,
    ApiQuery(query): ApiQuery<PropertyQuery>,
) -> Json<ApiResponse<Vec<Property>>> {
    let mut properties = match query.transaction_type {
        Some(transaction_type) => state.properties.get_by_type(transaction_type).await,
        None => state.properties.get_all().await,
    };
    if query.featured == Some(true) {
        properties.retain(|p| p.featured);
    }
    respond(properties)
}

async fn get_property(
    State(state): State<AppContext>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ApiResponse<Property>>, SiteError> {
    state
        .properties
        .get_by_id(id)
        .await
        .map(respond)
        .ok_or_else(|| SiteError::NotFound(format!("property {id}")))
}

async fn create_property(
    State(state): State<AppContext>,
    _admin: AdminSession,
    ApiJson(draft): ApiJson<PropertyDraft>,
) -> Result<(StatusCode, Json<ApiResponse<Property>>), SiteError> {
    let created = state.properties.add(draft).await?;
    Ok((StatusCode::CREATED, respond(created)))
}

async fn update_property(
    State(state): State<AppContext>,
    _admin: AdminSession,
    ApiPath(id): ApiPath<i32>,
    ApiJson(patch): ApiJson<PropertyPatch>,
) -> Result<Json<ApiResponse<Property>>, SiteError> {
    state.properties.update(id, patch).await.map(respond)
}

async fn delete_property(
    State(state): State<AppContext>,
    _admin: AdminSession,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, SiteError> {
    state.properties.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_content(State(state): State<AppContext>) -> Json<ApiResponse<Vec<ContentEntry>>> {
    respond(state.content.all_entries().await)
}

async fn section_content(
    State(state): State<AppContext>,
    ApiPath(section): ApiPath<String>,
) -> Json<ApiResponse<Vec<ContentEntry>>> {
    respond(state.content.section_entries(&section).await)
}

async fn get_content_field(
    State(state): State<AppContext>,
    ApiPath((section, field)): ApiPath<(String, String)>,
    ApiQuery(query): ApiQuery<DefaultQuery>,
) -> Json<ApiResponse<FieldResponse>> {
    let (value, is_default) = match state.content.get_value(&section, &field).await {
        Some(value) => (value, false),
        None => (ContentValue::Text(query.default.unwrap_or_default()), true),
    };
    respond(FieldResponse {
        section,
        field,
        value,
        is_default,
    })
}

async fn put_content_field(
    State(state): State<AppContext>,
    _admin: AdminSession,
    ApiPath((section, field)): ApiPath<(String, String)>,
    ApiJson(body): ApiJson<UpdateContentRequest>,
) -> Result<Json<ApiResponse<ContentEntry>>, SiteError> {
    state
        .content
        .update_content(&section, &field, body.value.clone())
        .await?;
    Ok(respond(ContentEntry {
        section,
        field,
        value: body.value,
    }))
}

async fn get_colors(
    State(state): State<AppContext>,
    ApiPath(section): ApiPath<String>,
) -> Json<ApiResponse<ColorPalette>> {
    respond(state.content.get_colors(&section).await)
}

async fn put_colors(
    State(state): State<AppContext>,
    _admin: AdminSession,
    ApiPath(section): ApiPath<String>,
    ApiJson(palette): ApiJson<ColorPalette>,
) -> Result<Json<ApiResponse<ColorPalette>>, SiteError> {
    state.content.update_colors(&section, &palette).await?;
    Ok(respond(palette))
}

async fn get_css(
    State(state): State<AppContext>,
    ApiPath(section): ApiPath<String>,
) -> Json<ApiResponse<CustomCss>> {
    respond(CustomCss {
        css: state.content.get_custom_css(&section).await,
    })
}

async fn put_css(
    State(state): State<AppContext>,
    _admin: AdminSession,
    ApiPath(section): ApiPath<String>,
    ApiJson(body): ApiJson<CustomCss>,
) -> Result<Json<ApiResponse<CustomCss>>, SiteError> {
    state.content.update_custom_css(&section, &body.css).await?;
    Ok(respond(body))
}

async fn list_images(
    State(state): State<AppContext>,
) -> Result<Json<ApiResponse<Vec<ImageMetadata>>>, SiteError> {
    let Some(images) = &state.images else {
        return Ok(respond(Vec::new()));
    };
    match images.list_images().await {
        Ok(list) => Ok(respond(list)),
        Err(StoreError::MissingTable(detail)) => {
            log::info!("Image table missing, returning empty gallery: {detail}");
            Ok(respond(Vec::new()))
        }
        Err(e) => Err(e.into()),
    }
}

async fn save_image(
    State(state): State<AppContext>,
    _admin: AdminSession,
    ApiJson(metadata): ApiJson<NewImageMetadata>,
) -> Result<(StatusCode, Json<ApiResponse<ImageMetadata>>), SiteError> {
    let images = state
        .images
        .as_ref()
        .ok_or_else(|| SiteError::RemoteUnavailable("database not configured".to_string()))?;
    if metadata.url.trim().is_empty() {
        return Err(SiteError::validation("url is required"));
    }
    let saved = images.insert_image(&metadata).await?;
    Ok((StatusCode::CREATED, respond(saved)))
}

async fn list_blobs(
    State(state): State<AppContext>,
) -> Result<Json<ApiResponse<Vec<StoredBlob>>>, SiteError> {
    state.uploads.list_stored().await.map(respond)
}

async fn upload_blob(
    State(state): State<AppContext>,
    _admin: AdminSession,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ApiResponse<UploadOutcome>>), SiteError> {
    let mut multipart = multipart?;
    let mut file = None;
    let mut section = None;
    let mut field = None;

    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| SiteError::validation(format!("malformed upload: {e}")))?
    {
        match part.name() {
            Some("file") => {
                let file_name = part.file_name().unwrap_or("upload").to_string();
                let content_type = part
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = part
                    .bytes()
                    .await
                    .map_err(|e| SiteError::validation(format!("could not read file: {e}")))?;
                file = Some(UploadFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            Some("section") => section = part.text().await.ok().filter(|s| !s.is_empty()),
            Some("field") => field = part.text().await.ok().filter(|s| !s.is_empty()),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| SiteError::validation("no file provided"))?;
    let outcome = state
        .uploads
        .upload(file, section.as_deref(), field.as_deref())
        .await?;
    Ok((StatusCode::CREATED, respond(outcome)))
}

async fn get_setting(
    State(state): State<AppContext>,
    ApiPath(key): ApiPath<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, SiteError> {
    state
        .settings
        .get(&key)
        .await
        .map(respond)
        .ok_or_else(|| SiteError::NotFound(format!("setting {key}")))
}

async fn put_setting(
    State(state): State<AppContext>,
    _admin: AdminSession,
    ApiPath(key): ApiPath<String>,
    ApiJson(value): ApiJson<serde_json::Value>,
) -> Result<Json<ApiResponse<serde_json::Value>>, SiteError> {
    state.settings.set(&key, value.clone()).await?;
    Ok(respond(value))
}

async fn site_info(State(state): State<AppContext>) -> impl IntoResponse {
    let (company, social) = tokio::join!(state.settings.company_info(), state.settings.social_links());
    respond(SiteInfo { company, social })
}
