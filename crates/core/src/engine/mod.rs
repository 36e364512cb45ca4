//! The configuration sync engine.
//!
//! One engine serves one session: the owner signed in through its
//! [`IdentityProvider`], or an anonymous visitor of the public page. It keeps
//! the in-memory copy of the site configuration and profile, writes edits
//! through to the [`DocumentStore`], and mirrors what it loads into the
//! [`LocalCache`].

mod error;
mod provision;
mod public;
mod settings;

use std::sync::{Arc, Weak};

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::cache::{CacheError, LocalCache, CONFIG_KEY, OWNER_KEY};
use crate::document::validate::validate_section_name;
use crate::document::{default_site_config, DocumentPath, OwnerId, SiteConfig, UserProfile};
use crate::events::{self, EventBus, HandlerGuard, SiteEvent};
use crate::identity::{Identity, IdentityProvider};
use crate::mutation::{apply_section_update, SectionData};
use crate::store::{Actor, DocumentStore, DocumentWatch};

pub use error::{SyncError, SyncResult};
pub use provision::{ProvisionOutcome, PublishOutcome};
pub use public::{ConfigSource, PublicResolution, ResolvedVia};
pub use settings::{EngineSettings, RetryConfig, DEFAULT_FALLBACK_OWNER};

/// Result of a successful save.
#[derive(Debug)]
pub struct SaveOutcome {
    /// The document as written, provenance included.
    pub config: SiteConfig,
    /// Set when mirroring into the local cache failed. The remote write
    /// has already succeeded.
    pub cache_warning: Option<CacheError>,
}

#[derive(Debug, Default)]
struct SessionState {
    config: Option<SiteConfig>,
    profile: Option<UserProfile>,
    /// Owner whose documents the listeners are attached to.
    owner: Option<OwnerId>,
}

/// State shared with listener tasks.
#[derive(Debug)]
struct Shared {
    state: RwLock<SessionState>,
    events: EventBus,
}

impl Shared {
    fn apply_profile(&self, value: Option<Value>) {
        let Some(value) = value else {
            tracing::debug!("profile document absent");
            return;
        };
        match serde_json::from_value::<UserProfile>(value) {
            Ok(profile) => {
                self.state.write().profile = Some(profile.clone());
                self.events.publish(SiteEvent::ProfileUpdated(profile));
            }
            Err(err) => tracing::warn!(error = %err, "ignoring malformed profile document"),
        }
    }

    fn apply_config(&self, value: Option<Value>) {
        let Some(value) = value else {
            tracing::debug!("site document absent");
            return;
        };
        match SiteConfig::from_value(value) {
            Ok(config) => self.set_config(config),
            Err(err) => tracing::warn!(error = %err, "ignoring malformed site document"),
        }
    }

    fn set_config(&self, config: SiteConfig) {
        self.state.write().config = Some(config.clone());
        self.events.publish(SiteEvent::ConfigUpdated(config));
    }
}

struct Inner {
    store: Arc<dyn DocumentStore>,
    cache: Arc<dyn LocalCache>,
    identity: Arc<dyn IdentityProvider>,
    settings: EngineSettings,
    shared: Arc<Shared>,
    auth_task: Mutex<Option<JoinHandle<()>>>,
    listeners: Mutex<Vec<JoinHandle<()>>>,
}

impl Inner {
    fn cancel_listeners(&self) {
        for task in self.listeners.lock().drain(..) {
            task.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(task) = self.auth_task.get_mut().take() {
            task.abort();
        }
        for task in self.listeners.get_mut().drain(..) {
            task.abort();
        }
    }
}

/// Mediates between the admin or public surface, the local cache, and the
/// document store. Cloning is cheap and clones share one session.
#[derive(Clone)]
pub struct ConfigSyncEngine {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ConfigSyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigSyncEngine")
            .field("settings", &self.inner.settings)
            .field("state", &*self.inner.shared.state.read())
            .finish_non_exhaustive()
    }
}

impl ConfigSyncEngine {
    /// Build an idle engine. Nothing is read until [`start`](Self::start),
    /// [`load_user_data`](Self::load_user_data) or a public resolution runs.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cache: Arc<dyn LocalCache>,
        identity: Arc<dyn IdentityProvider>,
        settings: EngineSettings,
    ) -> Self {
        let events = EventBus::new(settings.event_capacity);
        Self {
            inner: Arc::new(Inner {
                store,
                cache,
                identity,
                settings,
                shared: Arc::new(Shared {
                    state: RwLock::new(SessionState::default()),
                    events,
                }),
                auth_task: Mutex::new(None),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.inner.settings
    }

    /// Follow the identity provider: attach listeners when an owner signs
    /// in, release them on sign-out. Calling it again has no effect.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut slot = self.inner.auth_task.lock();
        if slot.is_some() {
            return;
        }
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let mut auth = self.inner.identity.watch();
        *slot = Some(tokio::spawn(async move {
            loop {
                let identity = auth.borrow_and_update().clone();
                let Some(inner) = weak.upgrade() else { break };
                ConfigSyncEngine { inner }.on_auth_changed(identity).await;
                if auth.changed().await.is_err() {
                    break;
                }
            }
        }));
    }

    /// Stop following the identity provider and release all listeners.
    /// Writes already issued still complete.
    pub fn stop(&self) {
        if let Some(task) = self.inner.auth_task.lock().take() {
            task.abort();
        }
        self.inner.cancel_listeners();
    }

    async fn on_auth_changed(&self, identity: Option<Identity>) {
        match identity {
            Some(identity) => {
                tracing::info!(uid = %identity.uid, "owner signed in");
                if let Err(err) = self.load_user_data(&identity.uid).await {
                    tracing::error!(
                        uid = %identity.uid,
                        error = %err,
                        "failed to attach session listeners"
                    );
                }
            }
            None => self.end_session(),
        }
    }

    fn end_session(&self) {
        self.inner.cancel_listeners();
        let mut state = self.inner.shared.state.write();
        if let Some(owner) = state.owner.take() {
            tracing::info!(uid = %owner, "owner session ended");
            state.profile = None;
            state.config = None;
        }
    }

    /// The current configuration, or the built-in default when none has
    /// been loaded.
    pub fn config(&self) -> SiteConfig {
        self.inner
            .shared
            .state
            .read()
            .config
            .clone()
            .unwrap_or_else(default_site_config)
    }

    /// The attached owner's profile, if their profile document exists.
    pub fn profile(&self) -> Option<UserProfile> {
        self.inner.shared.state.read().profile.clone()
    }

    /// The identity the provider reports as signed in right now.
    pub fn current_user(&self) -> Option<Identity> {
        self.inner.identity.current()
    }

    /// Whether the admin surface should enable editing: an owner is signed
    /// in and their profile is approved. Advisory only; the store enforces
    /// its own rules.
    pub fn can_edit(&self) -> bool {
        let Some(identity) = self.current_user() else {
            return false;
        };
        let state = self.inner.shared.state.read();
        state.owner.as_ref() == Some(&identity.uid)
            && state.profile.as_ref().is_some_and(UserProfile::is_approved)
    }

    /// Receive every profile and config change announced by this engine.
    pub fn subscribe(&self) -> broadcast::Receiver<SiteEvent> {
        self.inner.shared.events.subscribe()
    }

    /// Run `handler` on each profile change until the guard is dropped.
    pub fn on_profile_changed<F>(&self, handler: F) -> HandlerGuard
    where
        F: Fn(UserProfile) + Send + Sync + 'static,
    {
        events::on_profile_changed(&self.inner.shared.events, handler)
    }

    /// Run `handler` on each config change until the guard is dropped.
    pub fn on_config_changed<F>(&self, handler: F) -> HandlerGuard
    where
        F: Fn(SiteConfig) + Send + Sync + 'static,
    {
        events::on_config_changed(&self.inner.shared.events, handler)
    }

    fn actor(&self) -> Actor {
        match self.current_user() {
            Some(identity) => Actor::Owner(identity.uid),
            None => Actor::Anonymous,
        }
    }

    fn require_identity(&self) -> SyncResult<Identity> {
        self.current_user().ok_or(SyncError::NotAuthenticated)
    }

    /// Subscribe to `owner`'s profile and site documents. Values present
    /// now are applied and announced before this returns; later changes are
    /// forwarded in the background until the session ends.
    pub async fn load_user_data(&self, owner: &OwnerId) -> SyncResult<()> {
        let actor = Actor::Owner(owner.clone());
        let mut profile = self
            .inner
            .store
            .watch(&actor, &DocumentPath::profile(owner))
            .await?;
        let mut site = self.inner.store.watch(&actor, &DocumentPath::site(owner)).await?;

        self.inner.cancel_listeners();
        let shared = &self.inner.shared;
        {
            let mut state = shared.state.write();
            if state.owner.as_ref() != Some(owner) {
                state.profile = None;
                state.config = None;
                state.owner = Some(owner.clone());
            }
        }
        shared.apply_profile(profile.current());
        shared.apply_config(site.current());

        let profile_task =
            tokio::spawn(forward(Arc::clone(shared), profile, Shared::apply_profile));
        let site_task = tokio::spawn(forward(Arc::clone(shared), site, Shared::apply_config));
        self.inner.listeners.lock().extend([profile_task, site_task]);

        tracing::debug!(uid = %owner, "session listeners attached");
        Ok(())
    }

    /// Replace or merge one section, then save the whole document.
    ///
    /// Arrays replace the section; objects are merged key by key into the
    /// previous value.
    pub async fn update_section(
        &self,
        section: &str,
        data: SectionData,
    ) -> SyncResult<SaveOutcome> {
        let config = self.merge_section(section, data)?;
        self.save_config(config).await
    }

    /// The document [`update_section`](Self::update_section) would write,
    /// before provenance is stamped. Nothing is saved.
    pub fn merge_section(&self, section: &str, data: SectionData) -> SyncResult<SiteConfig> {
        validate_section_name(section)?;
        self.require_identity()?;
        let mut config = self.config();
        apply_section_update(&mut config, section, data);
        Ok(config)
    }

    /// [`update_section`](Self::update_section) for untyped JSON input.
    pub async fn update_section_json(&self, section: &str, data: Value) -> SyncResult<SaveOutcome> {
        let data = SectionData::try_from(data)?;
        self.update_section(section, data).await
    }

    /// Write the full document as the signed-in owner.
    ///
    /// Provenance is always overwritten with the writer's identity. There is
    /// no concurrency check: the last full write wins. On failure the
    /// in-memory copy is rolled back unless it has been replaced meanwhile.
    pub async fn save_config(&self, mut config: SiteConfig) -> SyncResult<SaveOutcome> {
        let identity = self.require_identity()?;
        config.stamp_provenance(&identity, Utc::now());
        let document = config.to_value()?;

        let previous = self.inner.shared.state.write().config.replace(config.clone());

        let actor = Actor::Owner(identity.uid.clone());
        let path = DocumentPath::site(&identity.uid);
        if let Err(err) = self.inner.store.set(&actor, &path, document).await {
            let mut state = self.inner.shared.state.write();
            if state.config.as_ref() == Some(&config) {
                state.config = previous;
            }
            tracing::warn!(uid = %identity.uid, error = %err, "config save rejected");
            return Err(err.into());
        }
        tracing::info!(uid = %identity.uid, "config saved");

        let cache_warning = self.mirror_to_cache(&config, Some(&identity.uid)).err();
        if let Some(err) = &cache_warning {
            tracing::warn!(error = %err, "config saved remotely but not cached locally");
        }
        Ok(SaveOutcome {
            config,
            cache_warning,
        })
    }

    fn mirror_to_cache(
        &self,
        config: &SiteConfig,
        owner: Option<&OwnerId>,
    ) -> Result<(), CacheError> {
        let serialized = serde_json::to_string(config)?;
        self.inner.cache.set(CONFIG_KEY, &serialized)?;
        if let Some(owner) = owner {
            self.inner.cache.set(OWNER_KEY, owner.as_str())?;
        }
        Ok(())
    }
}

async fn forward(shared: Arc<Shared>, mut watch: DocumentWatch, apply: fn(&Shared, Option<Value>)) {
    while let Some(value) = watch.changed().await {
        tracing::debug!(path = %watch.path(), "document changed");
        apply(&shared, value);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::cache::MemoryCache;
    use crate::identity::StaticIdentityProvider;
    use crate::store::{MemoryDocumentStore, OwnerRules};

    pub(crate) struct Harness {
        pub store: Arc<MemoryDocumentStore>,
        pub cache: Arc<MemoryCache>,
        pub identity: Arc<StaticIdentityProvider>,
        pub engine: ConfigSyncEngine,
    }

    pub(crate) fn owner_identity() -> Identity {
        Identity::new("owner-1")
            .with_display_name("Owner One")
            .with_email("owner@example.com")
    }

    pub(crate) fn harness_with(
        store: MemoryDocumentStore,
        cache: MemoryCache,
        identity: StaticIdentityProvider,
    ) -> Harness {
        let store = Arc::new(store);
        let cache = Arc::new(cache);
        let identity = Arc::new(identity);
        let engine = ConfigSyncEngine::new(
            store.clone(),
            cache.clone(),
            identity.clone(),
            EngineSettings::new("fallback-owner").with_retry(RetryConfig::no_retry()),
        );
        Harness {
            store,
            cache,
            identity,
            engine,
        }
    }

    pub(crate) fn signed_in() -> Harness {
        harness_with(
            MemoryDocumentStore::new(),
            MemoryCache::new(),
            StaticIdentityProvider::signed_in(owner_identity()),
        )
    }

    pub(crate) fn anonymous() -> Harness {
        harness_with(
            MemoryDocumentStore::new(),
            MemoryCache::new(),
            StaticIdentityProvider::new(None),
        )
    }

    fn site_path() -> DocumentPath {
        DocumentPath::site(&OwnerId::new("owner-1"))
    }

    fn profile_path() -> DocumentPath {
        DocumentPath::profile(&OwnerId::new("owner-1"))
    }

    async fn next_event(rx: &mut broadcast::Receiver<SiteEvent>) -> SiteEvent {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("event within a second")
            .expect("bus open")
    }

    #[test]
    fn config_defaults_when_nothing_loaded() {
        let h = anonymous();
        assert_eq!(h.engine.config(), default_site_config());
        assert!(h.engine.profile().is_none());
        assert!(!h.engine.can_edit());
    }

    #[tokio::test]
    async fn save_requires_identity() {
        let h = anonymous();
        let err = h.engine.save_config(default_site_config()).await.unwrap_err();
        assert!(matches!(err, SyncError::NotAuthenticated));

        let err = h
            .engine
            .update_section_json("hero", json!({ "title": "x" }))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NotAuthenticated));
        assert_eq!(h.engine.config(), default_site_config());
    }

    #[tokio::test]
    async fn save_stamps_writer_provenance() {
        let h = signed_in();
        let mut draft = default_site_config();
        draft.owner_uid = Some(OwnerId::new("intruder"));
        draft.email = Some("intruder@example.com".into());
        draft.updated_by = Some("intruder".into());

        let outcome = h.engine.save_config(draft).await.unwrap();
        assert!(outcome.cache_warning.is_none());

        let stored = SiteConfig::from_value(h.store.peek(&site_path()).unwrap()).unwrap();
        assert_eq!(stored.owner_uid, Some(OwnerId::new("owner-1")));
        assert_eq!(stored.email.as_deref(), Some("owner@example.com"));
        assert_eq!(stored.updated_by.as_deref(), Some("owner-1"));
        assert!(stored.last_updated.is_some());
        assert_eq!(stored, outcome.config);
    }

    #[tokio::test]
    async fn save_mirrors_into_cache() {
        let h = signed_in();
        h.engine.save_config(default_site_config()).await.unwrap();

        let cached: SiteConfig =
            serde_json::from_str(&h.cache.get(CONFIG_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(cached.owner_uid, Some(OwnerId::new("owner-1")));
        assert_eq!(h.cache.get(OWNER_KEY).unwrap().as_deref(), Some("owner-1"));
    }

    #[tokio::test]
    async fn cache_failure_is_only_a_warning() {
        let h = harness_with(
            MemoryDocumentStore::new(),
            MemoryCache::with_quota(16),
            StaticIdentityProvider::signed_in(owner_identity()),
        );

        let outcome = h.engine.save_config(default_site_config()).await.unwrap();
        assert!(matches!(outcome.cache_warning, Some(CacheError::QuotaExceeded { .. })));
        assert!(h.store.peek(&site_path()).is_some());
    }

    #[tokio::test]
    async fn update_section_replaces_arrays_and_merges_objects() {
        let h = signed_in();
        let before = h.engine.config();

        h.engine
            .update_section_json("hero", json!({ "title": "Fresh" }))
            .await
            .unwrap();
        let stats = json!([{ "number": "7", "label": "Albums" }]);
        h.engine
            .update_section_json("stats", stats.clone())
            .await
            .unwrap();

        let stored = SiteConfig::from_value(h.store.peek(&site_path()).unwrap()).unwrap();
        assert_eq!(stored.section("stats"), Some(&stats));
        let hero = stored.section("hero").unwrap();
        assert_eq!(hero["title"], "Fresh");
        assert_eq!(hero["subtitle"], before.section("hero").unwrap()["subtitle"]);
        assert_eq!(h.engine.config(), stored);
    }

    #[tokio::test]
    async fn update_section_rejects_bad_input_without_writing() {
        let h = signed_in();
        let err = h
            .engine
            .update_section_json("hero", json!("just a string"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidSection(_)));

        let err = h
            .engine
            .update_section_json("ownerUid", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidSection(_)));
        assert_eq!(h.store.write_count(&site_path()), 0);
    }

    #[tokio::test]
    async fn load_user_data_delivers_current_values_then_changes() {
        let h = signed_in();
        h.store.insert(&profile_path(), json!({ "name": "Owner One", "isLogin": false }));
        h.store.insert(&site_path(), json!({ "hero": { "title": "Remote" } }));
        let mut rx = h.engine.subscribe();

        h.engine.load_user_data(&OwnerId::new("owner-1")).await.unwrap();
        assert!(matches!(next_event(&mut rx).await, SiteEvent::ProfileUpdated(p) if !p.is_login));
        assert!(matches!(next_event(&mut rx).await, SiteEvent::ConfigUpdated(_)));
        assert_eq!(h.engine.config().section("hero").unwrap()["title"], "Remote");
        assert!(!h.engine.can_edit());

        // approval arrives out-of-band
        h.store.insert(&profile_path(), json!({ "name": "Owner One", "isLogin": true }));
        assert!(matches!(next_event(&mut rx).await, SiteEvent::ProfileUpdated(p) if p.is_login));
        assert!(h.engine.can_edit());
    }

    #[tokio::test]
    async fn switching_owner_drops_previous_session_state() {
        let h = signed_in();
        h.store.insert(&profile_path(), json!({ "isLogin": true }));
        h.store.insert(&site_path(), json!({ "hero": { "title": "A's site" } }));
        h.engine.load_user_data(&OwnerId::new("owner-1")).await.unwrap();
        assert!(h.engine.can_edit());

        let second = OwnerId::new("owner-2");
        h.identity.set_next(Some(Identity::new("owner-2")));
        h.identity.sign_in().await.unwrap();
        h.engine.load_user_data(&second).await.unwrap();

        assert_eq!(h.engine.config(), default_site_config());
        assert!(h.engine.profile().is_none());
        assert!(!h.engine.can_edit());

        h.engine
            .update_section_json("contact", json!({ "email": "b@example.com" }))
            .await
            .unwrap();
        let stored = h.store.peek(&DocumentPath::site(&second)).unwrap();
        assert_eq!(stored["hero"], default_site_config().section("hero").unwrap().clone());
        assert_eq!(stored["ownerUid"], "owner-2");
    }

    #[tokio::test]
    async fn reloading_same_owner_keeps_loaded_state() {
        let h = signed_in();
        h.store.insert(&site_path(), json!({ "hero": { "title": "Kept" } }));
        let owner = OwnerId::new("owner-1");
        h.engine.load_user_data(&owner).await.unwrap();
        h.engine.load_user_data(&owner).await.unwrap();
        assert_eq!(h.engine.config().section("hero").unwrap()["title"], "Kept");
    }

    #[tokio::test]
    async fn stored_document_with_bad_provenance_still_loads() {
        let h = signed_in();
        h.store.insert(
            &site_path(),
            json!({ "hero": { "title": "Remote" }, "ownerUid": 7, "lastUpdated": "yesterday" }),
        );
        h.engine.load_user_data(&OwnerId::new("owner-1")).await.unwrap();

        let config = h.engine.config();
        assert_eq!(config.section("hero").unwrap()["title"], "Remote");
        assert_eq!(config.last_updated, None);
    }

    #[tokio::test]
    async fn unapproved_write_succeeds_without_store_rules() {
        let h = signed_in();
        h.store.insert(&profile_path(), json!({ "isLogin": false }));
        h.store.insert(&site_path(), default_site_config().to_value().unwrap());
        h.engine.load_user_data(&OwnerId::new("owner-1")).await.unwrap();
        assert!(!h.engine.can_edit());

        h.engine
            .update_section_json("hero", json!({ "title": "Bypassed" }))
            .await
            .unwrap();
        assert_eq!(h.store.peek(&site_path()).unwrap()["hero"]["title"], "Bypassed");
    }

    #[tokio::test]
    async fn unapproved_write_is_rejected_by_owner_rules() {
        let h = harness_with(
            MemoryDocumentStore::with_policy(OwnerRules),
            MemoryCache::new(),
            StaticIdentityProvider::signed_in(owner_identity()),
        );
        h.store.insert(&profile_path(), json!({ "isLogin": false }));
        h.store.insert(&site_path(), default_site_config().to_value().unwrap());
        h.engine.load_user_data(&OwnerId::new("owner-1")).await.unwrap();

        let err = h
            .engine
            .update_section_json("hero", json!({ "title": "Blocked" }))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::PermissionDenied(_)));
        assert_ne!(h.engine.config().section("hero").unwrap()["title"], "Blocked");
        assert!(h.cache.is_empty());
    }

    #[tokio::test]
    async fn last_write_wins() {
        let h = signed_in();
        let first = h.engine.update_section_json("contact", json!({ "email": "a@example.com" }));
        let second = h.engine.update_section_json("contact", json!({ "email": "b@example.com" }));
        let (first, second) = tokio::join!(first, second);
        first.unwrap();
        second.unwrap();

        assert_eq!(h.store.write_count(&site_path()), 2);
        assert_eq!(h.store.peek(&site_path()).unwrap()["contact"]["email"], "b@example.com");
    }

    #[tokio::test]
    async fn start_follows_sign_in_and_sign_out() {
        let h = harness_with(
            MemoryDocumentStore::new(),
            MemoryCache::new(),
            StaticIdentityProvider::new(Some(owner_identity())),
        );
        h.store.insert(&profile_path(), json!({ "isLogin": true }));
        h.store.insert(&site_path(), json!({ "hero": { "title": "Mine" } }));
        let mut rx = h.engine.subscribe();
        h.engine.start();
        h.engine.start();

        h.engine.sign_in().await.unwrap();
        assert!(matches!(next_event(&mut rx).await, SiteEvent::ProfileUpdated(_)));
        assert!(matches!(next_event(&mut rx).await, SiteEvent::ConfigUpdated(_)));
        assert!(h.engine.can_edit());

        h.engine.sign_out().await.unwrap();
        assert!(h.engine.current_user().is_none());
        assert!(h.engine.profile().is_none());
        assert_eq!(h.engine.config(), default_site_config());

        // listeners are gone: remote writes no longer reach the engine
        h.store.insert(&site_path(), json!({ "hero": { "title": "Later" } }));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());
        h.engine.stop();
    }

    #[tokio::test]
    async fn typed_handlers_receive_config() {
        let h = signed_in();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _guard = h.engine.on_config_changed(move |config| {
            let _ = tx.send(config);
        });
        h.store.insert(&site_path(), json!({ "hero": { "title": "Handled" } }));

        h.engine.load_user_data(&OwnerId::new("owner-1")).await.unwrap();
        let config = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(config.section("hero").unwrap()["title"], "Handled");
    }
}
