use crate::message::AlertMessage;
use crate::notifier::{Notifier, NotifyError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use vigil_types::{DeliveryChannel, Recipient};

/// Routes each delivery to the notifier registered for the recipient's channel.
pub struct NotifyManager {
    notifiers: Arc<RwLock<HashMap<DeliveryChannel, Arc<dyn Notifier>>>>,
}

impl NotifyManager {
    pub fn new() -> Self {
        Self {
            notifiers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Replaces any notifier already bound to `channel`.
    pub async fn register(&self, channel: DeliveryChannel, notifier: Arc<dyn Notifier>) {
        let mut notifiers = self.notifiers.write().await;
        info!(channel = %channel, notifier = notifier.name(), "Registered notifier");
        notifiers.insert(channel, notifier);
    }
}

impl Default for NotifyManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for NotifyManager {
    async fn send(&self, recipient: &Recipient, message: &AlertMessage) -> Result<(), NotifyError> {
        let notifier = {
            let notifiers = self.notifiers.read().await;
            notifiers
                .get(&recipient.channel)
                .cloned()
                .ok_or(NotifyError::NoRoute(recipient.channel))?
        };

        if !notifier.is_enabled() {
            return Err(NotifyError::Disabled(notifier.name().to_string()));
        }

        notifier.send(recipient, message).await
    }

    fn name(&self) -> &str {
        "manager"
    }
}
