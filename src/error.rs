use thiserror::Error;

/// Failures of the remote relational store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The queried table has not been created yet.
    #[error("table missing: {0}")]
    MissingTable(String),
    #[error("database unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    Query(String),
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        match &err {
            diesel::result::Error::DatabaseError(_, info)
                if info.message().contains("does not exist")
                    && info.message().contains("relation") =>
            {
                StoreError::MissingTable(info.message().to_string())
            }
            _ => StoreError::Query(err.to_string()),
        }
    }
}

impl From<diesel::ConnectionError> for StoreError {
    fn from(err: diesel::ConnectionError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Unavailable(format!("database worker failed: {err}"))
    }
}

/// Errors surfaced by the site services and mapped to HTTP statuses at the
/// web boundary.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("admin authorization required")]
    Unauthorized,
    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl SiteError {
    pub fn validation(message: impl Into<String>) -> Self {
        SiteError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, SiteError::Validation(_))
    }
}
