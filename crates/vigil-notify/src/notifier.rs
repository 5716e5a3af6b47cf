use crate::message::AlertMessage;
use async_trait::async_trait;
use vigil_types::{DeliveryChannel, Recipient};

/// Delivery errors. Never retried by the engine.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Delivery queue is full")]
    QueueFull,

    #[error("Delivery queue is closed")]
    QueueClosed,

    #[error("No notifier registered for channel {0}")]
    NoRoute(DeliveryChannel),

    #[error("Notifier {0} is disabled")]
    Disabled(String),
}

/// Transport hand-off for one (recipient, message) pair.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &Recipient, message: &AlertMessage) -> Result<(), NotifyError>;

    fn name(&self) -> &str;

    fn is_enabled(&self) -> bool {
        true
    }
}
