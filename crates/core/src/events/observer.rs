use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::bus::EventBus;
use super::types::SiteEvent;
use crate::document::{SiteConfig, UserProfile};

/// Keeps a registered handler alive. Dropping it unsubscribes.
#[derive(Debug)]
pub struct HandlerGuard {
    task: JoinHandle<()>,
}

impl HandlerGuard {
    pub fn unsubscribe(self) {}
}

impl Drop for HandlerGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run `handler` for every event `select` picks out, in publish order.
/// Must be called from within a tokio runtime.
pub fn observe<T, S, F>(bus: &EventBus, select: S, handler: F) -> HandlerGuard
where
    T: Send + 'static,
    S: Fn(SiteEvent) -> Option<T> + Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    let mut rx = bus.subscribe();
    let task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(value) = select(event) {
                        handler(value);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event handler lagged behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
    HandlerGuard { task }
}

pub fn on_profile_changed<F>(bus: &EventBus, handler: F) -> HandlerGuard
where
    F: Fn(UserProfile) + Send + Sync + 'static,
{
    observe(
        bus,
        |event| match event {
            SiteEvent::ProfileUpdated(profile) => Some(profile),
            SiteEvent::ConfigUpdated(_) => None,
        },
        handler,
    )
}

pub fn on_config_changed<F>(bus: &EventBus, handler: F) -> HandlerGuard
where
    F: Fn(SiteConfig) + Send + Sync + 'static,
{
    observe(
        bus,
        |event| match event {
            SiteEvent::ConfigUpdated(config) => Some(config),
            SiteEvent::ProfileUpdated(_) => None,
        },
        handler,
    )
}
