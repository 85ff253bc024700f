use axum::extract::{FromRequest, FromRequestParts};

use crate::error::SiteError;

/// JSON body whose rejections answer with the site's error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(SiteError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(SiteError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(SiteError))]
pub struct ApiQuery<T>(pub T);
