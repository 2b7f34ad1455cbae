use rouille::Response;
use serde_json::json;
use thiserror::Error;

use crate::storage::error::StorageError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TrackNotFound(_) => ApiError::NotFound("Track not found".into()),

            StorageError::InvalidTrackId => ApiError::BadRequest("invalid track id".into()),

            StorageError::InvalidFileName(name) => {
                ApiError::BadRequest(format!("invalid file name {name:?}"))
            }

            StorageError::Database(e) => ApiError::Internal(e.to_string()),

            StorageError::Fs(e) => {
                log::error!("filesystem error: {e}");
                ApiError::Internal("internal server error".into())
            }

            StorageError::Internal(e) => {
                log::error!("internal error: {e:#}");
                ApiError::Internal("internal server error".into())
            }
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::BadRequest(_) => 400,
            ApiError::Internal(_) => 500,
        }
    }

    /// `{"error": "<message>"}` with the matching status code
    pub fn into_response(self) -> Response {
        let status = self.status_code();
        Response::json(&json!({ "error": self.to_string() })).with_status_code(status)
    }
}
