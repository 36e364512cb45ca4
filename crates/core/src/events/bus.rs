use tokio::sync::broadcast;

use super::types::SiteEvent;

/// Fan-out of [`SiteEvent`]s to every live subscriber in the process.
///
/// Clones share one channel. A subscriber that falls more than `capacity`
/// events behind loses the oldest ones and sees `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SiteEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Returns how many subscribers the event reached. Zero when nobody is
    /// listening.
    pub fn publish(&self, event: SiteEvent) -> usize {
        let name = event.name();
        match self.tx.send(event) {
            Ok(reached) => {
                tracing::debug!(event = name, reached, "site event published");
                reached
            }
            Err(_) => {
                tracing::debug!(event = name, "site event dropped, no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SiteEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::error::RecvError;

    use super::*;
    use crate::document::{default_site_config, UserProfile};

    #[tokio::test]
    async fn every_subscriber_sees_each_event() {
        let bus = EventBus::new(16);
        let mut first = bus.subscribe();
        let mut second = bus.clone().subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        assert_eq!(bus.publish(SiteEvent::ProfileUpdated(UserProfile::default())), 2);

        assert!(matches!(first.recv().await.unwrap(), SiteEvent::ProfileUpdated(_)));
        assert!(matches!(second.recv().await.unwrap(), SiteEvent::ProfileUpdated(_)));
    }

    #[test]
    fn publish_without_subscribers() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(SiteEvent::ConfigUpdated(default_site_config())), 0);
    }

    #[tokio::test]
    async fn slow_subscriber_lags() {
        let bus = EventBus::new(1);
        let mut rx = bus.subscribe();
        bus.publish(SiteEvent::ConfigUpdated(default_site_config()));
        bus.publish(SiteEvent::ProfileUpdated(UserProfile::default()));

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(1))));
        assert!(matches!(rx.recv().await.unwrap(), SiteEvent::ProfileUpdated(_)));
    }
}
