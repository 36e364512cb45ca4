/// Document addressing.
///
/// Every document lives at `{collection}/{id}`:
/// - Owner profile: `users/{uid}`
/// - Owner site configuration: `sites/{uid}`
/// - Published pointer: `sites/public_info`
/// - Published pointer mirror: `system/public_site_settings`
use std::fmt;

use serde::{Deserialize, Serialize};

pub const USERS: &str = "users";
pub const SITES: &str = "sites";
pub const SYSTEM: &str = "system";

const PUBLIC_INFO_ID: &str = "public_info";
const PUBLIC_SETTINGS_ID: &str = "public_site_settings";

/// Stable identifier of an owner, as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(uid: &str) -> Self {
        Self::new(uid)
    }
}

impl From<String> for OwnerId {
    fn from(uid: String) -> Self {
        Self(uid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    collection: String,
    id: String,
}

/// What a path refers to, as far as the site model is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    Profile(OwnerId),
    Site(OwnerId),
    PublicPointer,
    PublicSettings,
    Other,
}

impl DocumentPath {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn profile(owner: &OwnerId) -> Self {
        Self::new(USERS, owner.as_str())
    }

    pub fn site(owner: &OwnerId) -> Self {
        Self::new(SITES, owner.as_str())
    }

    pub fn public_pointer() -> Self {
        Self::new(SITES, PUBLIC_INFO_ID)
    }

    pub fn public_settings() -> Self {
        Self::new(SYSTEM, PUBLIC_SETTINGS_ID)
    }

    /// Parse a `collection/id` string. Returns `None` unless there is exactly
    /// one separator and both halves are non-empty.
    pub fn parse(path: &str) -> Option<Self> {
        let (collection, id) = path.split_once('/')?;
        if collection.is_empty() || id.is_empty() || id.contains('/') {
            return None;
        }
        Some(Self::new(collection, id))
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> DocumentKind {
        match (self.collection.as_str(), self.id.as_str()) {
            (SITES, PUBLIC_INFO_ID) => DocumentKind::PublicPointer,
            (SYSTEM, PUBLIC_SETTINGS_ID) => DocumentKind::PublicSettings,
            (USERS, id) => DocumentKind::Profile(OwnerId::new(id)),
            (SITES, id) => DocumentKind::Site(OwnerId::new(id)),
            _ => DocumentKind::Other,
        }
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}
