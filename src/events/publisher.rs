use super::dispatch::{DispatchError, NotificationDispatcher};
use super::domain::DomainEvent;
use crate::constants::DEFAULT_EVENT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

/// Fan-out publisher for domain events over a tokio broadcast channel
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub name: String,
    pub event: DomainEvent,
    pub published_at: DateTime<Utc>,
}

impl EventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: DomainEvent) {
        let published = PublishedEvent {
            name: event.name(),
            event,
            published_at: Utc::now(),
        };

        // No subscribers is fine: events are published whether or not anyone listens
        let _ = self.sender.send(published);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CHANNEL_CAPACITY)
    }
}

#[async_trait]
impl NotificationDispatcher for EventPublisher {
    async fn notify(&self, event: &DomainEvent) -> Result<(), DispatchError> {
        self.publish(event.clone());
        Ok(())
    }
}
