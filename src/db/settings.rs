use chrono::Utc;
use diesel::{prelude::*, PgConnection};

use super::schema::site_settings::{self, dsl::*};
use crate::{error::StoreError, models::settings::SettingRow};

pub fn get(conn: &mut PgConnection, target_key: &str) -> Result<Option<serde_json::Value>, StoreError> {
    let row: Option<SettingRow> = site_settings::table
        .filter(key.eq(target_key))
        .select(SettingRow::as_select())
        .first(conn)
        .optional()?;

    row.map(|r| serde_json::from_str(&r.value))
        .transpose()
        .map_err(|e| StoreError::Query(format!("setting {target_key} is not valid json: {e}")))
}

pub fn upsert(conn: &mut PgConnection, target_key: String, raw: String) -> Result<(), StoreError> {
    let row = SettingRow {
        key: target_key,
        value: raw,
        updated_at: Utc::now(),
    };
    diesel::insert_into(site_settings::table)
        .values(&row)
        .on_conflict(key)
        .do_update()
        .set(&row)
        .execute(conn)?;
    Ok(())
}
