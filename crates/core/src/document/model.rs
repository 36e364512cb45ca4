use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::OwnerId;
use crate::identity::Identity;

/// Top-level section names used by the admin forms and the public page.
pub mod sections {
    pub const HERO: &str = "hero";
    pub const ABOUT: &str = "about";
    pub const CONTACT: &str = "contact";
    pub const STYLE: &str = "style";
    pub const THEME: &str = "theme";
    pub const STATS: &str = "stats";
    pub const BRANDS: &str = "brands";
    pub const GALLERY: &str = "gallery";
    pub const VIDEOS: &str = "videos";
    pub const PRICING: &str = "pricing";
}

/// Keys written by the engine on every save. Never addressable as sections.
pub const PROVENANCE_KEYS: [&str; 4] = ["ownerUid", "email", "updatedBy", "lastUpdated"];

pub fn is_provenance_key(key: &str) -> bool {
    PROVENANCE_KEYS.contains(&key)
}

/// One owner's site content, stored at `sites/{uid}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub owner_uid: Option<OwnerId>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    /// Section content keyed by section name, stored as-is.
    #[serde(flatten)]
    pub sections: Map<String, Value>,
}

/// Provenance is overwritten on every save, so a badly-typed stored value reads as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl SiteConfig {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Parse a caller-supplied draft. Provenance keys are discarded before typing
    /// since the save path stamps its own.
    pub fn from_draft(mut value: Value) -> Result<Self, serde_json::Error> {
        if let Some(object) = value.as_object_mut() {
            for key in PROVENANCE_KEYS {
                object.remove(key);
            }
        }
        Self::from_value(value)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }

    /// Deserialize a section into one of the typed views.
    pub fn section_as<T: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Option<T>, serde_json::Error> {
        self.sections
            .get(name)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
    }

    pub fn set_section(&mut self, name: impl Into<String>, value: Value) {
        self.sections.insert(name.into(), value);
    }

    /// Overwrite write-provenance with the writer's identity.
    pub fn stamp_provenance(&mut self, writer: &Identity, at: DateTime<Utc>) {
        for key in PROVENANCE_KEYS {
            self.sections.remove(key);
        }
        self.owner_uid = Some(writer.uid.clone());
        self.email = writer.email.clone();
        self.updated_by = Some(writer.uid.to_string());
        self.last_updated = Some(at);
    }

    /// Size of the document as the store will receive it.
    pub fn encoded_len(&self) -> Result<usize, serde_json::Error> {
        serde_json::to_vec(self).map(|bytes| bytes.len())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hero {
    pub title: String,
    pub subtitle: String,
    pub button_text: String,
    pub image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct About {
    pub subtitle: String,
    pub title: String,
    pub text: String,
    pub image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub whatsapp: String,
    pub email: String,
    pub instagram: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stat {
    pub number: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Brand {
    pub name: String,
    /// URL or embedded data URL.
    pub logo: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoKind {
    Local,
    #[default]
    Youtube,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Video {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub url: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: VideoKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingPlan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub title: String,
    pub price: String,
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Theme {
    pub primary_color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionStatus {
    #[default]
    Pending,
    Active,
    Other(String),
}

impl From<String> for SubscriptionStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => Self::Pending,
            "active" => Self::Active,
            _ => Self::Other(value),
        }
    }
}

impl From<SubscriptionStatus> for String {
    fn from(status: SubscriptionStatus) -> Self {
        match status {
            SubscriptionStatus::Pending => "pending".to_string(),
            SubscriptionStatus::Active => "active".to_string(),
            SubscriptionStatus::Other(value) => value,
        }
    }
}

/// One per owner identity, stored at `users/{uid}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    /// `true` once the owner has been approved. Written only by the approval process.
    #[serde(default)]
    pub is_login: bool,
    #[serde(default)]
    pub subscription_status: SubscriptionStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Profile written on first sign-in: pending approval.
    pub fn pending(identity: &Identity, created_at: DateTime<Utc>) -> Self {
        Self {
            name: identity.display_name.clone(),
            email: identity.email.clone(),
            photo: identity.photo_url.clone(),
            is_login: false,
            subscription_status: SubscriptionStatus::Pending,
            created_at: Some(created_at),
        }
    }

    pub fn is_approved(&self) -> bool {
        self.is_login
    }
}

/// Records which owner's configuration the public page renders by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPointer {
    pub owner_uid: OwnerId,
    pub updated_at: DateTime<Utc>,
}
