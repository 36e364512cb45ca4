use std::sync::Arc;

use portfolio_site_core::cache::LocalCache;
use portfolio_site_core::identity::{Identity, StaticIdentityProvider, TokenVerifier};
use portfolio_site_core::store::DocumentStore;
use portfolio_site_core::{ConfigSyncEngine, EngineSettings};
use sqlx::PgPool;

use crate::config::AppConfig;

/// Shared application state, passed to all handlers via Axum's `State` extractor.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    store: Arc<dyn DocumentStore>,
    cache: Arc<dyn LocalCache>,
    /// Present for the postgres backend only.
    pool: Option<PgPool>,
    verifier: TokenVerifier,
    settings: EngineSettings,
    config: AppConfig,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cache: Arc<dyn LocalCache>,
        pool: Option<PgPool>,
        config: AppConfig,
    ) -> Self {
        Self {
            inner: Arc::new(InnerState {
                store,
                cache,
                pool,
                verifier: TokenVerifier::new(config.jwt_secret.as_bytes()),
                settings: EngineSettings::new(config.fallback_owner.as_str()),
                config,
            }),
        }
    }

    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.inner.verifier
    }

    /// Engine for an anonymous visitor of the public page.
    pub fn public_engine(&self) -> ConfigSyncEngine {
        self.engine(StaticIdentityProvider::new(None))
    }

    /// Engine for a request carrying a verified owner token.
    pub fn owner_engine(&self, identity: Identity) -> ConfigSyncEngine {
        self.engine(StaticIdentityProvider::signed_in(identity))
    }

    fn engine(&self, identity: StaticIdentityProvider) -> ConfigSyncEngine {
        ConfigSyncEngine::new(
            Arc::clone(&self.inner.store),
            Arc::clone(&self.inner.cache),
            Arc::new(identity),
            self.inner.settings.clone(),
        )
    }
}
