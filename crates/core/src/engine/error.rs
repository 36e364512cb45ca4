use thiserror::Error;

use crate::document::validate::SectionNameError;
use crate::identity::IdentityError;
use crate::mutation::UnsupportedSectionData;
use crate::store::StoreError;

pub type SyncResult<T> = Result<T, SyncError>;

/// Errors surfaced to callers of the sync engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A mutating call was made with nobody signed in.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The document store rejected the call.
    #[error("permission denied: {0}")]
    PermissionDenied(StoreError),

    #[error("invalid section: {0}")]
    InvalidSection(String),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// A document could not be converted to or from its model.
    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl SyncError {
    /// Returns true if the caller may retry the same call.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Store(err) if err.is_retryable())
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        if err.is_permission_denied() {
            SyncError::PermissionDenied(err)
        } else {
            SyncError::Store(err)
        }
    }
}

impl From<SectionNameError> for SyncError {
    fn from(err: SectionNameError) -> Self {
        SyncError::InvalidSection(err.to_string())
    }
}

impl From<UnsupportedSectionData> for SyncError {
    fn from(err: UnsupportedSectionData) -> Self {
        SyncError::InvalidSection(err.to_string())
    }
}
