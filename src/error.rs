use crate::records::error::SourceError;
use crate::session::error::SessionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClimacacheError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("cache capacity must be at least 1 entry")]
    InvalidCacheCapacity,
}
