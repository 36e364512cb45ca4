use serde::Serialize;
use serde_json::Value;

use super::ConfigSyncEngine;
use crate::cache::{CONFIG_KEY, OWNER_KEY};
use crate::document::{default_site_config, DocumentPath, OwnerId, SiteConfig};
use crate::store::StoreResult;

/// How the owner of the public page was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolvedVia {
    /// Named by the caller.
    Requested,
    /// Last-known owner from the local cache.
    LocalOverride,
    /// `sites/public_info`.
    PublicPointer,
    /// `system/public_site_settings`.
    PublicSettings,
    /// `EngineSettings::fallback_owner`.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ConfigSource {
    Remote { owner: OwnerId, via: ResolvedVia },
    Cache,
    Default,
}

#[derive(Debug, Clone)]
pub struct PublicResolution {
    pub config: SiteConfig,
    pub source: ConfigSource,
}

impl ConfigSyncEngine {
    /// Resolve which owner's site the public page shows and load it.
    ///
    /// Never fails. An explicit owner skips the lookup. Otherwise any cached
    /// config is announced first as a provisional value, then the published
    /// pointer, its mirror and finally the fallback owner are tried in turn.
    /// When the remote load fails or finds nothing, the cached config is
    /// used, then the default document.
    pub async fn load_public_config(&self, requested: Option<&OwnerId>) -> PublicResolution {
        let explicit = match requested {
            Some(owner) => Some((owner.clone(), ResolvedVia::Requested)),
            None if self.inner.settings.local_owner_override => {
                self.cached_owner().map(|owner| (owner, ResolvedVia::LocalOverride))
            }
            None => None,
        };

        let mut provisional = None;
        let (owner, via) = match explicit {
            Some(target) => target,
            None => {
                provisional = self.cached_config();
                if let Some(config) = &provisional {
                    tracing::debug!("applying cached config while resolving owner");
                    self.inner.shared.set_config(config.clone());
                }
                self.resolve_public_owner().await
            }
        };

        match self.read_site(&owner).await {
            Ok(Some(config)) => {
                tracing::info!(uid = %owner, ?via, "public config loaded");
                if let Err(err) = self.mirror_to_cache(&config, None) {
                    tracing::warn!(error = %err, "public config not cached locally");
                }
                self.inner.shared.set_config(config.clone());
                return PublicResolution {
                    config,
                    source: ConfigSource::Remote { owner, via },
                };
            }
            Ok(None) => tracing::warn!(uid = %owner, "published owner has no site document"),
            Err(err) => tracing::warn!(uid = %owner, error = %err, "public config unavailable"),
        }

        if provisional.is_some() {
            return PublicResolution {
                config: self.config(),
                source: ConfigSource::Cache,
            };
        }
        match self.cached_config() {
            Some(config) => {
                self.inner.shared.set_config(config.clone());
                PublicResolution {
                    config,
                    source: ConfigSource::Cache,
                }
            }
            None => {
                let config = default_site_config();
                self.inner.shared.set_config(config.clone());
                PublicResolution {
                    config,
                    source: ConfigSource::Default,
                }
            }
        }
    }

    async fn resolve_public_owner(&self) -> (OwnerId, ResolvedVia) {
        let tiers = [
            (DocumentPath::public_pointer(), ResolvedVia::PublicPointer),
            (DocumentPath::public_settings(), ResolvedVia::PublicSettings),
        ];
        for (path, via) in tiers {
            match self.inner.store.get(&self.actor(), &path).await {
                Ok(Some(document)) => match pointer_owner(&document) {
                    Some(owner) => return (owner, via),
                    None => tracing::warn!(%path, "pointer document has no owner"),
                },
                Ok(None) => tracing::debug!(%path, "no pointer document"),
                Err(err) => tracing::warn!(%path, error = %err, "pointer unreadable"),
            }
        }
        (self.inner.settings.fallback_owner.clone(), ResolvedVia::Fallback)
    }

    async fn read_site(&self, owner: &OwnerId) -> StoreResult<Option<SiteConfig>> {
        let document = self.inner.store.get(&self.actor(), &DocumentPath::site(owner)).await?;
        Ok(document.map(SiteConfig::from_value).transpose()?)
    }

    fn cached_config(&self) -> Option<SiteConfig> {
        let raw = match self.inner.cache.get(CONFIG_KEY) {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!(error = %err, "cache read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(config) => {
                tracing::debug!("cache hit");
                Some(config)
            }
            Err(err) => {
                tracing::warn!(error = %err, "discarding unreadable cached config");
                None
            }
        }
    }

    fn cached_owner(&self) -> Option<OwnerId> {
        match self.inner.cache.get(OWNER_KEY) {
            Ok(owner) => owner.filter(|uid| !uid.is_empty()).map(OwnerId::from),
            Err(err) => {
                tracing::warn!(error = %err, "cache read failed");
                None
            }
        }
    }
}

/// `ownerUid` of a pointer document. Read leniently: anything but a
/// non-empty string counts as absent.
fn pointer_owner(document: &Value) -> Option<OwnerId> {
    document
        .get("ownerUid")
        .and_then(Value::as_str)
        .filter(|uid| !uid.is_empty())
        .map(OwnerId::from)
}
