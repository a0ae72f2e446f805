//! Outbound collaborators for domain events.
//!
//! Both seams are best-effort: the orchestrator logs a failed delivery and
//! keeps the committed result.

use super::domain::DomainEvent;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Event channel is closed")]
    ChannelClosed,
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Collaborator failed: {0}")]
    Collaborator(#[from] anyhow::Error),
}

/// Delivers events to users (email, SMS, in-app) outside this crate
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(&self, event: &DomainEvent) -> Result<(), DispatchError>;
}

/// Durable audit trail of ownership and status changes
#[async_trait]
pub trait AuditRecorder: Send + Sync {
    async fn record(&self, event: &DomainEvent) -> Result<(), DispatchError>;
}

/// Audit recorder that writes each event as a structured log line
#[derive(Debug, Clone, Default)]
pub struct TracingAuditRecorder;

#[async_trait]
impl AuditRecorder for TracingAuditRecorder {
    async fn record(&self, event: &DomainEvent) -> Result<(), DispatchError> {
        let payload = serde_json::to_string(event)?;
        info!(
            event_name = %event.name(),
            event_id = %event.event_id(),
            item_id = event.item_id(),
            company_id = event.company_id(),
            payload = %payload,
            "📝 AUDIT"
        );
        Ok(())
    }
}

/// Keeps every event in memory; can be told to fail for error-path tests
#[derive(Debug, Clone, Default)]
pub struct CollectingRecorder {
    events: Arc<Mutex<Vec<DomainEvent>>>,
    failing: bool,
}

impl CollectingRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records nothing and returns an error on every call
    pub fn failing() -> Self {
        Self {
            events: Arc::default(),
            failing: true,
        }
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().clone()
    }

    pub fn event_names(&self) -> Vec<String> {
        self.events.lock().iter().map(DomainEvent::name).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn push(&self, event: &DomainEvent) -> Result<(), DispatchError> {
        if self.failing {
            return Err(anyhow::anyhow!("collector configured to fail").into());
        }
        self.events.lock().push(event.clone());
        Ok(())
    }
}

#[async_trait]
impl NotificationDispatcher for CollectingRecorder {
    async fn notify(&self, event: &DomainEvent) -> Result<(), DispatchError> {
        self.push(event)
    }
}

#[async_trait]
impl AuditRecorder for CollectingRecorder {
    async fn record(&self, event: &DomainEvent) -> Result<(), DispatchError> {
        self.push(event)
    }
}
