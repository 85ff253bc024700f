use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Identifies one editable region: a page section and a field inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentKey {
    pub section: String,
    pub field: String,
}

impl ContentKey {
    pub fn new(section: impl Into<String>, field: impl Into<String>) -> Self {
        ContentKey {
            section: section.into(),
            field: field.into(),
        }
    }
}

/// An admin edit. Plain copy is `Text`; palettes and similar structures are
/// kept as `Json`. A bare JSON string is always `Text`, which keeps the
/// untagged form stable through the cache file and the HTTP API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentValue {
    Text(String),
    Json(serde_json::Value),
}

impl ContentValue {
    pub fn json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => ContentValue::Text(text),
            other => ContentValue::Json(other),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ContentValue::Text(_) => "text",
            ContentValue::Json(_) => "json",
        }
    }

    /// Text as-is, JSON in its compact serialized form.
    pub fn to_text(&self) -> String {
        match self {
            ContentValue::Text(text) => text.clone(),
            ContentValue::Json(value) => value.to_string(),
        }
    }

    pub fn from_stored(raw: String, value_type: &str) -> Self {
        if value_type == "json" {
            match serde_json::from_str(&raw) {
                Ok(value) => return ContentValue::json(value),
                Err(e) => log::warn!("stored json content is malformed, keeping as text: {e}"),
            }
        }
        ContentValue::Text(raw)
    }
}

impl From<&str> for ContentValue {
    fn from(text: &str) -> Self {
        ContentValue::Text(text.to_string())
    }
}

impl From<String> for ContentValue {
    fn from(text: String) -> Self {
        ContentValue::Text(text)
    }
}

impl From<serde_json::Value> for ContentValue {
    fn from(value: serde_json::Value) -> Self {
        ContentValue::json(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub section: String,
    pub field: String,
    pub value: ContentValue,
}

impl ContentEntry {
    pub fn key(&self) -> ContentKey {
        ContentKey::new(self.section.clone(), self.field.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColorPalette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub text: String,
}

impl Default for ColorPalette {
    fn default() -> Self {
        ColorPalette {
            primary: "#1e3a5f".to_string(),
            secondary: "#c9a227".to_string(),
            accent: "#e07a5f".to_string(),
            background: "#ffffff".to_string(),
            text: "#1f2933".to_string(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::db::schema::cms_content)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ContentRow {
    pub id: i32,
    pub section: String,
    pub field: String,
    pub value: String,
    pub value_type: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = crate::db::schema::cms_content)]
pub struct InsertableContent {
    pub section: String,
    pub field: String,
    pub value: String,
    pub value_type: String,
    pub updated_at: DateTime<Utc>,
}

impl From<ContentRow> for ContentEntry {
    fn from(row: ContentRow) -> Self {
        ContentEntry {
            section: row.section,
            field: row.field,
            value: ContentValue::from_stored(row.value, &row.value_type),
        }
    }
}

impl From<&ContentEntry> for InsertableContent {
    fn from(entry: &ContentEntry) -> Self {
        InsertableContent {
            section: entry.section.clone(),
            field: entry.field.clone(),
            value: entry.value.to_text(),
            value_type: entry.value.type_name().to_string(),
            updated_at: Utc::now(),
        }
    }
}
