use diesel::{prelude::*, PgConnection};
use log::{info, warn};

use super::schema::properties::{self, dsl::*};
use crate::{
    error::StoreError,
    models::property::{Property, PropertyRow},
};

pub fn to_rows(listings: &[Property]) -> Result<Vec<PropertyRow>, StoreError> {
    listings
        .iter()
        .map(|p| PropertyRow::try_from(p).map_err(|e| StoreError::Query(e.to_string())))
        .collect()
}

pub fn get_all(conn: &mut PgConnection) -> Result<Vec<Property>, StoreError> {
    let rows: Vec<PropertyRow> = properties::table
        .select(PropertyRow::as_select())
        .order(created_at.desc())
        .load(conn)?;

    // One malformed row should not hide the rest of the catalogue.
    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let row_id = row.id;
            match Property::try_from(row) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("Skipping property {row_id} with unreadable columns: {e}");
                    None
                }
            }
        })
        .collect())
}

pub fn insert(conn: &mut PgConnection, rows: Vec<PropertyRow>) -> Result<(), StoreError> {
    let n = diesel::insert_into(properties::table)
        .values(&rows)
        .execute(conn)?;
    info!("Inserted {n} rows into properties table");
    Ok(())
}

pub fn update(conn: &mut PgConnection, row: PropertyRow) -> Result<(), StoreError> {
    let n = diesel::update(properties::table.filter(id.eq(row.id)))
        .set(&row)
        .execute(conn)?;
    info!("Updated property {} ({n} rows)", row.id);
    Ok(())
}

pub fn delete(conn: &mut PgConnection, target_id: i32) -> Result<(), StoreError> {
    let n = diesel::delete(properties::table.filter(id.eq(target_id))).execute(conn)?;
    info!("Deleted {n} rows in properties with ID: {target_id}");
    Ok(())
}
