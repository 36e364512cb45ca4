use std::future::Future;

use chrono::Utc;

use super::{ConfigSyncEngine, RetryConfig, SyncResult};
use crate::document::{default_site_config, DocumentPath, PublicPointer, UserProfile};
use crate::identity::Identity;
use crate::store::{Actor, StoreError, StoreResult};

/// What [`ConfigSyncEngine::ensure_user_doc`] had to create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProvisionOutcome {
    pub profile_created: bool,
    pub config_created: bool,
}

impl ProvisionOutcome {
    pub fn was_noop(&self) -> bool {
        !self.profile_created && !self.config_created
    }
}

#[derive(Debug)]
pub struct PublishOutcome {
    pub pointer: PublicPointer,
    /// Set when the mirror at `system/public_site_settings` could not be
    /// written. The primary pointer is in place.
    pub mirror_error: Option<StoreError>,
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempts run out.
async fn with_retry<T, F, Fut>(retry: &RetryConfig, what: &str, mut op: F) -> StoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt + 1 < retry.max_attempts => {
                attempt += 1;
                let delay = retry.delay_for_attempt(attempt);
                tracing::warn!(what, attempt, ?delay, error = %err, "retrying store call");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

impl ConfigSyncEngine {
    /// Sign in through the identity provider and provision the owner's
    /// documents on first sight.
    pub async fn sign_in(&self) -> SyncResult<Identity> {
        let identity = self.inner.identity.sign_in().await?;
        tracing::info!(uid = %identity.uid, "sign-in completed");
        self.ensure_user_doc(&identity).await?;
        Ok(identity)
    }

    pub async fn sign_out(&self) -> SyncResult<()> {
        self.inner.identity.sign_out().await?;
        self.end_session();
        Ok(())
    }

    /// First sign-in provisioning. Idempotent.
    ///
    /// An existing profile means provisioning already finished and nothing
    /// is written. Otherwise the default site document is created if absent,
    /// then the pending profile. A failure between the two leaves no profile,
    /// so the next call completes the job without overwriting the site.
    pub async fn ensure_user_doc(&self, identity: &Identity) -> SyncResult<ProvisionOutcome> {
        let retry = &self.inner.settings.retry;
        let store = &self.inner.store;
        let actor = Actor::Owner(identity.uid.clone());
        let profile_path = DocumentPath::profile(&identity.uid);
        let site_path = DocumentPath::site(&identity.uid);

        let existing =
            with_retry(retry, "read profile", || store.get(&actor, &profile_path)).await?;
        if existing.is_some() {
            tracing::debug!(uid = %identity.uid, "profile already provisioned");
            return Ok(ProvisionOutcome::default());
        }

        let mut outcome = ProvisionOutcome::default();
        let site = with_retry(retry, "read site", || store.get(&actor, &site_path)).await?;
        if site.is_none() {
            let mut config = default_site_config();
            config.stamp_provenance(identity, Utc::now());
            let document = config.to_value()?;
            with_retry(retry, "create site", || {
                store.set(&actor, &site_path, document.clone())
            })
            .await?;
            outcome.config_created = true;
        }

        let profile = serde_json::to_value(UserProfile::pending(identity, Utc::now()))?;
        with_retry(retry, "create profile", || {
            store.set(&actor, &profile_path, profile.clone())
        })
        .await?;
        outcome.profile_created = true;

        tracing::info!(
            uid = %identity.uid,
            config_created = outcome.config_created,
            "owner provisioned"
        );
        Ok(outcome)
    }

    /// Make the signed-in owner's site the one the public page shows.
    pub async fn publish_site(&self) -> SyncResult<PublishOutcome> {
        let identity = self.require_identity()?;
        let actor = Actor::Owner(identity.uid.clone());
        let pointer = PublicPointer {
            owner_uid: identity.uid.clone(),
            updated_at: Utc::now(),
        };
        let document = serde_json::to_value(&pointer)?;

        self.inner
            .store
            .set(&actor, &DocumentPath::public_pointer(), document.clone())
            .await?;

        let mirror_error = self
            .inner
            .store
            .set(&actor, &DocumentPath::public_settings(), document)
            .await
            .err();
        if let Some(err) = &mirror_error {
            tracing::warn!(error = %err, "published pointer mirror not written");
        }

        tracing::info!(uid = %identity.uid, "site published");
        Ok(PublishOutcome {
            pointer,
            mirror_error,
        })
    }
}
