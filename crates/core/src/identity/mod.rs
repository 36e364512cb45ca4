//! Owner identities and the providers that establish them.
//!
//! The sign-in protocol itself lives outside this crate. A provider only has
//! to hand back the signed-in [`Identity`] and broadcast auth-state changes.

pub mod token;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::document::OwnerId;

pub use token::{TokenClaims, TokenVerifier};

/// Result of a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: OwnerId,
    pub display_name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<OwnerId>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
            photo_url: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("sign-in failed: {0}")]
    SignInFailed(String),
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Run the provider's sign-in flow.
    async fn sign_in(&self) -> Result<Identity, IdentityError>;

    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// The currently signed-in identity, if any.
    fn current(&self) -> Option<Identity>;

    /// Auth-state changes. The receiver starts at the current state.
    fn watch(&self) -> watch::Receiver<Option<Identity>>;
}

/// In-process provider. Signs in as a preset identity, or holds an identity
/// established elsewhere (e.g. a verified bearer token).
#[derive(Debug)]
pub struct StaticIdentityProvider {
    next: Mutex<Option<Identity>>,
    state: watch::Sender<Option<Identity>>,
}

impl StaticIdentityProvider {
    /// A provider with nobody signed in, whose `sign_in` yields `identity`.
    pub fn new(identity: Option<Identity>) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            next: Mutex::new(identity),
            state,
        }
    }

    /// A provider that is already signed in as `identity`.
    pub fn signed_in(identity: Identity) -> Self {
        let provider = Self::new(Some(identity.clone()));
        provider.state.send_replace(Some(identity));
        provider
    }

    /// Change who the next `sign_in` returns.
    pub fn set_next(&self, identity: Option<Identity>) {
        *self.next.lock() = identity;
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn sign_in(&self) -> Result<Identity, IdentityError> {
        let identity = self
            .next
            .lock()
            .clone()
            .ok_or_else(|| IdentityError::SignInFailed("no identity available".to_string()))?;
        self.state.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.state.send_replace(None);
        Ok(())
    }

    fn current(&self) -> Option<Identity> {
        self.state.borrow().clone()
    }

    fn watch(&self) -> watch::Receiver<Option<Identity>> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_in_and_out_update_state() {
        let provider = StaticIdentityProvider::new(Some(Identity::new("owner-1")));
        let mut state = provider.watch();
        assert!(provider.current().is_none());

        let identity = provider.sign_in().await.unwrap();
        assert_eq!(identity.uid.as_str(), "owner-1");
        state.changed().await.unwrap();
        assert_eq!(state.borrow().as_ref(), Some(&identity));

        provider.sign_out().await.unwrap();
        assert!(provider.current().is_none());
    }

    #[tokio::test]
    async fn sign_in_without_identity_fails() {
        let provider = StaticIdentityProvider::new(None);
        assert!(matches!(
            provider.sign_in().await,
            Err(IdentityError::SignInFailed(_))
        ));
    }

    #[test]
    fn signed_in_provider_reports_identity() {
        let provider = StaticIdentityProvider::signed_in(Identity::new("owner-2"));
        assert_eq!(provider.current().unwrap().uid.as_str(), "owner-2");
    }
}
