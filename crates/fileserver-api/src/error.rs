use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// One error type for every handler; maps domain errors onto HTTP status
/// codes and a json error body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, what)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, message)
    }

    pub fn range_not_satisfiable(size: i64) -> Self {
        Self::new(
            StatusCode::RANGE_NOT_SATISFIABLE,
            format!("range not satisfiable for {} byte file", size),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {}", self.message);
        }
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<fileserver_core::Error> for ApiError {
    fn from(err: fileserver_core::Error) -> Self {
        use fileserver_core::Error as E;
        match &err {
            E::FileNotFound(_) | E::SessionNotFound(_) => Self::not_found(err.to_string()),
            E::SessionExpired(_) => Self::new(StatusCode::GONE, err.to_string()),
            E::InvalidFilename(_) | E::InvalidUpload(_) | E::ChunkOutOfRange { .. } => {
                Self::bad_request(err.to_string())
            }
            E::FileTooLarge { .. } => Self::payload_too_large(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}

impl From<fileserver_db::Error> for ApiError {
    fn from(err: fileserver_db::Error) -> Self {
        use fileserver_db::Error as E;
        match &err {
            E::FileNotFound(_) | E::SessionNotFound(_) => Self::not_found(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}

impl From<fileserver_storage::Error> for ApiError {
    fn from(err: fileserver_storage::Error) -> Self {
        use fileserver_storage::Error as E;
        match &err {
            E::BlobNotFound(_) => Self::not_found(err.to_string()),
            E::ChunkMissing { .. } | E::SizeMismatch { .. } => {
                Self::bad_request(err.to_string())
            }
            _ => Self::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let err: ApiError = fileserver_core::Error::FileNotFound("x".into()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err: ApiError = fileserver_core::Error::InvalidFilename("..".into()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err: ApiError = fileserver_core::Error::FileTooLarge {
            size: 10,
            limit: 5,
        }
        .into();
        assert_eq!(err.status, StatusCode::PAYLOAD_TOO_LARGE);

        let err: ApiError = fileserver_core::Error::SessionExpired("id".into()).into();
        assert_eq!(err.status, StatusCode::GONE);
    }

    #[test]
    fn test_storage_error_mapping() {
        let err: ApiError = fileserver_storage::Error::ChunkMissing { index: 3 }.into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err: ApiError = fileserver_storage::Error::BlobNotFound("y".into()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
