use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SiteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Sale,
    Rental,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Sale => "sale",
            TransactionType::Rental => "rental",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sale" => Ok(TransactionType::Sale),
            "rental" | "rent" => Ok(TransactionType::Rental),
            other => Err(SiteError::validation(format!(
                "unknown transaction type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    #[default]
    Available,
    Reserved,
    Sold,
    Rented,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Available => "available",
            PropertyStatus::Reserved => "reserved",
            PropertyStatus::Sold => "sold",
            PropertyStatus::Rented => "rented",
        }
    }
}

impl FromStr for PropertyStatus {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(PropertyStatus::Available),
            "reserved" => Ok(PropertyStatus::Reserved),
            "sold" => Ok(PropertyStatus::Sold),
            "rented" => Ok(PropertyStatus::Rented),
            other => Err(SiteError::validation(format!("unknown status '{other}'"))),
        }
    }
}

/// A listing as served to the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub price: f64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub address: String,
    pub city: String,
    pub province: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub size: f64,
    pub floor: Option<i32>,
    pub total_floors: Option<i32>,
    pub year_built: Option<i32>,
    pub energy_class: Option<String>,
    pub features: Vec<String>,
    pub images: Vec<String>,
    pub status: PropertyStatus,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin form input for a new listing. Forms post numbers as strings, so
/// price and size accept either.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "serde_this_or_that::as_f64")]
    pub price: f64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub bedrooms: i32,
    #[serde(default)]
    pub bathrooms: i32,
    #[serde(deserialize_with = "serde_this_or_that::as_f64")]
    pub size: f64,
    #[serde(default)]
    pub floor: Option<i32>,
    #[serde(default)]
    pub total_floors: Option<i32>,
    #[serde(default)]
    pub year_built: Option<i32>,
    #[serde(default)]
    pub energy_class: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub status: PropertyStatus,
    #[serde(default)]
    pub featured: bool,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub size: Option<f64>,
    pub floor: Option<i32>,
    pub total_floors: Option<i32>,
    pub year_built: Option<i32>,
    pub energy_class: Option<String>,
    pub features: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub status: Option<PropertyStatus>,
    pub featured: Option<bool>,
}

// Optional counterpart of `serde_this_or_that::as_f64`, for patch fields.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Lenient(#[serde(deserialize_with = "serde_this_or_that::as_f64")] f64);

    Ok(Option::<Lenient>::deserialize(deserializer)?.map(|Lenient(value)| value))
}

fn check_listing(title: &str, price: f64, size: f64) -> Result<(), SiteError> {
    if title.trim().is_empty() {
        return Err(SiteError::validation("title is required"));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(SiteError::validation("price must be a non-negative number"));
    }
    if !size.is_finite() || size < 0.0 {
        return Err(SiteError::validation("size must be a non-negative number"));
    }
    Ok(())
}

impl PropertyDraft {
    pub fn validate(&self) -> Result<(), SiteError> {
        check_listing(&self.title, self.price, self.size)
    }

    pub fn into_property(self, id: i32, now: DateTime<Utc>) -> Property {
        Property {
            id,
            title: self.title,
            description: self.description,
            price: self.price,
            transaction_type: self.transaction_type,
            address: self.address,
            city: self.city,
            province: self.province,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            size: self.size,
            floor: self.floor,
            total_floors: self.total_floors,
            year_built: self.year_built,
            energy_class: self.energy_class,
            features: self.features,
            images: self.images,
            status: self.status,
            featured: self.featured,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Property {
    pub fn validate(&self) -> Result<(), SiteError> {
        check_listing(&self.title, self.price, self.size)
    }

    /// Applies the patch onto a copy; the caller decides whether to keep it.
    pub fn patched(&self, patch: PropertyPatch, now: DateTime<Utc>) -> Property {
        let mut next = self.clone();
        if let Some(v) = patch.title {
            next.title = v;
        }
        if let Some(v) = patch.description {
            next.description = v;
        }
        if let Some(v) = patch.price {
            next.price = v;
        }
        if let Some(v) = patch.transaction_type {
            next.transaction_type = v;
        }
        if let Some(v) = patch.address {
            next.address = v;
        }
        if let Some(v) = patch.city {
            next.city = v;
        }
        if let Some(v) = patch.province {
            next.province = v;
        }
        if let Some(v) = patch.bedrooms {
            next.bedrooms = v;
        }
        if let Some(v) = patch.bathrooms {
            next.bathrooms = v;
        }
        if let Some(v) = patch.size {
            next.size = v;
        }
        if patch.floor.is_some() {
            next.floor = patch.floor;
        }
        if patch.total_floors.is_some() {
            next.total_floors = patch.total_floors;
        }
        if patch.year_built.is_some() {
            next.year_built = patch.year_built;
        }
        if patch.energy_class.is_some() {
            next.energy_class = patch.energy_class;
        }
        if let Some(v) = patch.features {
            next.features = v;
        }
        if let Some(v) = patch.images {
            next.images = v;
        }
        if let Some(v) = patch.status {
            next.status = v;
        }
        if let Some(v) = patch.featured {
            next.featured = v;
        }
        next.updated_at = now;
        next
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = crate::db::schema::properties)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct PropertyRow {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub transaction_type: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub size: f64,
    pub floor: Option<i32>,
    pub total_floors: Option<i32>,
    pub year_built: Option<i32>,
    pub energy_class: Option<String>,
    pub features: String,
    pub images: String,
    pub status: String,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&Property> for PropertyRow {
    type Error = serde_json::Error;

    fn try_from(p: &Property) -> Result<Self, Self::Error> {
        Ok(PropertyRow {
            id: p.id,
            title: p.title.clone(),
            description: p.description.clone(),
            price: p.price,
            transaction_type: p.transaction_type.as_str().to_string(),
            address: p.address.clone(),
            city: p.city.clone(),
            province: p.province.clone(),
            bedrooms: p.bedrooms,
            bathrooms: p.bathrooms,
            size: p.size,
            floor: p.floor,
            total_floors: p.total_floors,
            year_built: p.year_built,
            energy_class: p.energy_class.clone(),
            features: serde_json::to_string(&p.features)?,
            images: serde_json::to_string(&p.images)?,
            status: p.status.as_str().to_string(),
            featured: p.featured,
            created_at: p.created_at,
            updated_at: p.updated_at,
        })
    }
}

impl TryFrom<PropertyRow> for Property {
    type Error = anyhow::Error;

    fn try_from(row: PropertyRow) -> Result<Self, Self::Error> {
        Ok(Property {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            transaction_type: row.transaction_type.parse()?,
            address: row.address,
            city: row.city,
            province: row.province,
            bedrooms: row.bedrooms,
            bathrooms: row.bathrooms,
            size: row.size,
            floor: row.floor,
            total_floors: row.total_floors,
            year_built: row.year_built,
            energy_class: row.energy_class,
            features: decode_list(&row.features)?,
            images: decode_list(&row.images)?,
            status: row.status.parse()?,
            featured: row.featured,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// Older rows may hold an empty string instead of "[]".
fn decode_list(raw: &str) -> Result<Vec<String>, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw)
}
