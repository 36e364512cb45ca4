use serde::{Deserialize, Serialize};

use crate::document::{SiteConfig, UserProfile};

/// Notifications emitted by the sync engine whenever its view of a document
/// changes, including the first delivery after subscribing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "kebab-case")]
pub enum SiteEvent {
    ProfileUpdated(UserProfile),
    ConfigUpdated(SiteConfig),
}

impl SiteEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SiteEvent::ProfileUpdated(_) => "profile-updated",
            SiteEvent::ConfigUpdated(_) => "config-updated",
        }
    }
}
