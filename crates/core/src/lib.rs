//! Core of the portfolio site: the site configuration model, the document
//! store and local cache seams, and the [`ConfigSyncEngine`] that keeps them
//! in step.

#![deny(unsafe_code)]

pub mod assets;
pub mod cache;
pub mod document;
pub mod engine;
pub mod events;
pub mod identity;
pub mod mutation;
pub mod store;

pub use engine::{
    ConfigSource, ConfigSyncEngine, EngineSettings, ProvisionOutcome, PublicResolution,
    PublishOutcome, ResolvedVia, RetryConfig, SaveOutcome, SyncError, SyncResult,
};
