use diesel::{prelude::*, PgConnection};

use super::schema::cms_content::{self, dsl::*};
use crate::{
    error::StoreError,
    models::content::{ContentEntry, ContentRow, InsertableContent},
};

pub fn get_all(conn: &mut PgConnection) -> Result<Vec<ContentEntry>, StoreError> {
    let rows: Vec<ContentRow> = cms_content::table
        .select(ContentRow::as_select())
        .order((section.asc(), field.asc()))
        .load(conn)?;

    Ok(rows.into_iter().map(ContentEntry::from).collect())
}

pub fn upsert(conn: &mut PgConnection, row: InsertableContent) -> Result<(), StoreError> {
    diesel::insert_into(cms_content::table)
        .values(&row)
        .on_conflict((section, field))
        .do_update()
        .set(&row)
        .execute(conn)?;
    Ok(())
}
