use thiserror::Error;

use crate::domain::id::{InvalidTrackId, TrackId};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("track {0} not found")]
    TrackNotFound(TrackId),

    #[error("invalid track id")]
    InvalidTrackId,

    #[error("invalid file name {0:?}")]
    InvalidFileName(String),

    #[error("filesystem error: {0}")]
    Fs(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<InvalidTrackId> for StorageError {
    fn from(_: InvalidTrackId) -> Self {
        StorageError::InvalidTrackId
    }
}
