use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Bookkeeping for an uploaded file. The URL is what pages reference; this
/// record only makes the file discoverable in the gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable)]
#[serde(rename_all = "camelCase")]
#[diesel(table_name = crate::db::schema::uploaded_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ImageMetadata {
    pub id: i32,
    pub filename: String,
    pub original_name: String,
    pub url: String,
    pub size: i64,
    pub mime_type: String,
    pub section: Option<String>,
    pub field: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Insertable)]
#[serde(rename_all = "camelCase")]
#[diesel(table_name = crate::db::schema::uploaded_images)]
pub struct NewImageMetadata {
    pub filename: String,
    pub original_name: String,
    pub url: String,
    pub size: i64,
    pub mime_type: String,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
}
