pub mod defaults;
pub mod id;
pub mod model;
pub mod validate;

pub use defaults::default_site_config;
pub use id::{DocumentKind, DocumentPath, OwnerId};
pub use model::{PublicPointer, SiteConfig, SubscriptionStatus, UserProfile};
