pub mod bus;
pub mod observer;
pub mod types;

pub use bus::EventBus;
pub use observer::{on_config_changed, on_profile_changed, HandlerGuard};
pub use types::SiteEvent;
