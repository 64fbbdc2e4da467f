//! Error types for the server.

use loamdb_core::CoreError;
use thiserror::Error;

/// Result type for server operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced to API clients.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or invalid request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The addressed workspace, collection, index, or record is missing.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request conflicts with existing data or names.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal engine or storage failure.
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error on the connection.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Returns true if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_) | Self::NotFound(_) | Self::Conflict(_)
        )
    }

    /// Returns true if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Returns the HTTP-style status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Internal(_) | Self::Io(_) => 500,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MissingKey
            | CoreError::InvalidKey
            | CoreError::FieldCoercion { .. }
            | CoreError::InvalidOperation { .. } => Self::InvalidRequest(err.to_string()),
            CoreError::RecordNotFound { .. }
            | CoreError::WorkspaceNotFound { .. }
            | CoreError::CollectionNotFound { .. }
            | CoreError::IndexNotFound { .. } => Self::NotFound(err.to_string()),
            CoreError::DuplicateKey { .. }
            | CoreError::UniqueViolation { .. }
            | CoreError::AlreadyExists { .. } => Self::Conflict(err.to_string()),
            CoreError::Storage(_)
            | CoreError::Json(_)
            | CoreError::Io(_)
            | CoreError::DirectoryLocked => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loamdb_core::CollectionId;

    #[test]
    fn status_codes() {
        assert_eq!(ApiError::InvalidRequest("x".into()).status_code(), 400);
        assert_eq!(ApiError::NotFound("x".into()).status_code(), 404);
        assert_eq!(ApiError::Conflict("x".into()).status_code(), 409);
        assert_eq!(ApiError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn core_error_classification() {
        let err: ApiError = CoreError::MissingKey.into();
        assert!(err.is_client_error());
        assert_eq!(err.status_code(), 400);

        let err: ApiError = CoreError::duplicate_key(CollectionId::new(1), "k").into();
        assert_eq!(err.status_code(), 409);

        let err: ApiError = CoreError::collection_not_found("orders").into();
        assert_eq!(err.status_code(), 404);

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        let err: ApiError = CoreError::Io(io).into();
        assert!(err.is_server_error());
        assert_eq!(err.status_code(), 500);
    }
}
