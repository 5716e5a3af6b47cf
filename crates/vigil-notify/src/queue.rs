use crate::message::AlertMessage;
use crate::notifier::{Notifier, NotifyError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use vigil_types::Recipient;

struct Delivery {
    recipient: Recipient,
    message: AlertMessage,
}

/// Hands deliveries to a background worker through a bounded channel.
///
/// `send` returns as soon as the delivery is queued, so a slow transport never
/// holds up a run. Transport failures are logged by the worker.
#[derive(Clone)]
pub struct QueuedNotifier {
    tx: mpsc::Sender<Delivery>,
    name: String,
    enabled: bool,
}

impl QueuedNotifier {
    /// The worker exits once every clone of the returned notifier is dropped.
    pub fn spawn(inner: Arc<dyn Notifier>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Delivery>(capacity.max(1));
        let name = format!("queued-{}", inner.name());
        let enabled = inner.is_enabled();

        let handle = tokio::spawn(async move {
            while let Some(delivery) = rx.recv().await {
                match inner.send(&delivery.recipient, &delivery.message).await {
                    Ok(()) => debug!(
                        recipient = %delivery.recipient,
                        alert_id = %delivery.message.alert_id,
                        "Queued delivery sent"
                    ),
                    Err(e) => warn!(
                        recipient = %delivery.recipient,
                        alert_id = %delivery.message.alert_id,
                        error = %e,
                        "Queued delivery failed"
                    ),
                }
            }
            debug!(notifier = inner.name(), "Delivery worker stopped");
        });

        (Self { tx, name, enabled }, handle)
    }
}

#[async_trait]
impl Notifier for QueuedNotifier {
    async fn send(&self, recipient: &Recipient, message: &AlertMessage) -> Result<(), NotifyError> {
        let delivery = Delivery {
            recipient: recipient.clone(),
            message: message.clone(),
        };

        self.tx.try_send(delivery).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => NotifyError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => NotifyError::QueueClosed,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for Recording {
        async fn send(&self, recipient: &Recipient, _message: &AlertMessage) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(recipient.address.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn message() -> AlertMessage {
        AlertMessage {
            alert_id: "a-1".into(),
            alert_name: "Crash spike".into(),
            subject: "s".into(),
            body: "b".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_worker_drains_queue() {
        let inner = Arc::new(Recording::default());
        let (queued, handle) = QueuedNotifier::spawn(inner.clone(), 8);

        queued.send(&Recipient::email("a@example.com"), &message()).await.unwrap();
        queued.send(&Recipient::email("b@example.com"), &message()).await.unwrap();
        assert_eq!(queued.name(), "queued-recording");

        drop(queued);
        handle.await.unwrap();

        assert_eq!(
            *inner.sent.lock().unwrap(),
            vec!["a@example.com".to_string(), "b@example.com".to_string()]
        );
    }

    #[tokio::test]
    async fn test_closed_queue_rejects() {
        let inner = Arc::new(Recording::default());
        let (queued, handle) = QueuedNotifier::spawn(inner, 1);
        handle.abort();
        let _ = handle.await;

        let err = queued
            .send(&Recipient::email("a@example.com"), &message())
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::QueueClosed));
    }
}
