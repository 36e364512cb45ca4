//! Remote document store abstraction.
//!
//! Documents are JSON values addressed by [`DocumentPath`]. Every call names
//! the [`Actor`] it is made for, so the store can apply an [`AccessPolicy`]
//! at the write layer.

pub mod memory;
pub mod postgres;
pub mod rules;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;

use crate::document::{DocumentPath, OwnerId};

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;
pub use rules::{AccessPolicy, OpenAccess, OwnerRules};

/// Principal a store call is made on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    Owner(OwnerId),
    /// Privileged out-of-band writer, e.g. the approval process.
    Service,
}

impl Actor {
    pub fn owner(&self) -> Option<&OwnerId> {
        match self {
            Actor::Owner(uid) => Some(uid),
            _ => None,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Anonymous => f.write_str("anonymous"),
            Actor::Owner(uid) => write!(f, "owner:{uid}"),
            Actor::Service => f.write_str("service"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("permission denied for {actor} on {path}: {reason}")]
    PermissionDenied {
        actor: String,
        path: String,
        reason: String,
    },

    #[error("store unavailable: {message}")]
    Unavailable { message: String, retryable: bool },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn permission_denied(
        actor: &Actor,
        path: &DocumentPath,
        reason: impl Into<String>,
    ) -> Self {
        Self::PermissionDenied {
            actor: actor.to_string(),
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, StoreError::PermissionDenied { .. })
    }

    /// Returns true if repeating the call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Unavailable { retryable, .. } => *retryable,
            StoreError::Database(err) => matches!(
                err,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
            ),
            _ => false,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A change subscription on one document.
///
/// Observes the latest value: intermediate writes may be coalesced, but the
/// observed sequence follows the order the store applied them.
#[derive(Debug)]
pub struct DocumentWatch {
    path: DocumentPath,
    rx: watch::Receiver<Option<Value>>,
}

impl DocumentWatch {
    pub fn new(path: DocumentPath, rx: watch::Receiver<Option<Value>>) -> Self {
        Self { path, rx }
    }

    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    /// The value as of now, marking it seen.
    pub fn current(&mut self) -> Option<Value> {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next write. Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Option<Value>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, actor: &Actor, path: &DocumentPath) -> StoreResult<Option<Value>>;

    /// Replace the whole document.
    async fn set(&self, actor: &Actor, path: &DocumentPath, document: Value) -> StoreResult<()>;

    /// Subscribe to a document. The first [`DocumentWatch::current`] call
    /// yields its present value.
    async fn watch(&self, actor: &Actor, path: &DocumentPath) -> StoreResult<DocumentWatch>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(StoreError::Unavailable {
            message: "offline".into(),
            retryable: true
        }
        .is_retryable());
        assert!(!StoreError::permission_denied(
            &Actor::Anonymous,
            &DocumentPath::new("users", "a"),
            "private"
        )
        .is_retryable());
        assert!(StoreError::Database(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(!StoreError::Database(sqlx::Error::RowNotFound).is_retryable());
    }

    #[test]
    fn permission_denied_display_names_actor_and_path() {
        let err = StoreError::permission_denied(
            &Actor::Owner(OwnerId::new("u1")),
            &DocumentPath::new("sites", "u2"),
            "not the owner",
        );
        let message = err.to_string();
        assert!(message.contains("owner:u1"));
        assert!(message.contains("sites/u2"));
        assert!(err.is_permission_denied());
    }
}
