use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde::Serialize;

use crate::error::SiteError;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    detail: String,
}

impl SiteError {
    pub fn status(&self) -> StatusCode {
        match self {
            SiteError::Validation(_) => StatusCode::BAD_REQUEST,
            SiteError::NotFound(_) => StatusCode::NOT_FOUND,
            SiteError::Unauthorized => StatusCode::UNAUTHORIZED,
            SiteError::RemoteUnavailable(_) | SiteError::Store(_) | SiteError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for SiteError {
    fn from(rejection: JsonRejection) -> Self {
        SiteError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for SiteError {
    fn from(rejection: PathRejection) -> Self {
        SiteError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for SiteError {
    fn from(rejection: QueryRejection) -> Self {
        SiteError::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for SiteError {
    fn from(rejection: MultipartRejection) -> Self {
        SiteError::Validation(rejection.body_text())
    }
}

impl IntoResponse for SiteError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {self:#}");
        }

        let error = match status {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            other => other
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
        };
        let body = ErrorBody {
            error,
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
