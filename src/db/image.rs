use diesel::{prelude::*, PgConnection};
use log::info;

use super::schema::uploaded_images::{self, dsl::*};
use crate::{
    error::StoreError,
    models::image::{ImageMetadata, NewImageMetadata},
};

pub fn get_all(conn: &mut PgConnection) -> Result<Vec<ImageMetadata>, StoreError> {
    Ok(uploaded_images::table
        .select(ImageMetadata::as_select())
        .order(created_at.desc())
        .load(conn)?)
}

pub fn insert(conn: &mut PgConnection, row: NewImageMetadata) -> Result<ImageMetadata, StoreError> {
    let saved: ImageMetadata = diesel::insert_into(uploaded_images::table)
        .values(&row)
        .returning(ImageMetadata::as_returning())
        .get_result(conn)?;
    info!("Recorded uploaded image {} as {}", saved.url, saved.id);
    Ok(saved)
}
