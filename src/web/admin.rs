use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{context::AppContext, error::SiteError};

/// Proof that the request carries an admin bearer token. Handlers that
/// mutate site data take it as an argument.
#[derive(Debug)]
pub struct AdminSession;

#[async_trait]
impl FromRequestParts<AppContext> for AdminSession {
    type Rejection = SiteError;

    async fn from_request_parts(parts: &mut Parts, state: &AppContext) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(SiteError::Unauthorized)?;

        if state.admin.verify(bearer).await {
            Ok(AdminSession)
        } else {
            Err(SiteError::Unauthorized)
        }
    }
}
