use crate::counter::AlertCounter;
use crate::message::MessageComposer;
use crate::notifier::Notifier;
use crate::recipients::dedup_recipients;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use vigil_core::{AlertConfig, RecipientResolver};
use vigil_types::FiredAlert;

/// Outcome of one dispatch call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    /// Recipients a delivery was handed off for
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Turns a fired alert into one message and hands it to every recipient once.
pub struct NotificationDispatcher {
    resolver: Arc<dyn RecipientResolver>,
    notifier: Arc<dyn Notifier>,
    counter: Arc<dyn AlertCounter>,
    composer: MessageComposer,
}

impl NotificationDispatcher {
    pub fn new(
        resolver: Arc<dyn RecipientResolver>,
        notifier: Arc<dyn Notifier>,
        counter: Arc<dyn AlertCounter>,
        composer: MessageComposer,
    ) -> Self {
        Self {
            resolver,
            notifier,
            counter,
            composer,
        }
    }

    /// Deliver `fired` to the recipients selected by `config`.
    ///
    /// Transport failures only show up as a missing counter increment and in
    /// `DeliveryReport::failed`; they never fail the call.
    pub async fn dispatch(&self, config: &AlertConfig, fired: &FiredAlert) -> DeliveryReport {
        self.counter.record_firing(&config.id);

        let message = self.composer.compose(config, fired);

        let recipients = match self.resolver.resolve(&config.recipients).await {
            Ok(recipients) => dedup_recipients(recipients),
            Err(e) => {
                warn!(alert_id = %config.id, error = %e, "Failed to resolve recipients");
                return DeliveryReport::default();
            }
        };

        if recipients.is_empty() {
            warn!(alert_id = %config.id, "Alert fired but no recipients resolved");
            return DeliveryReport::default();
        }

        let sends = recipients.iter().map(|recipient| {
            let message = &message;
            async move {
                match self.notifier.send(recipient, message).await {
                    Ok(()) => {
                        self.counter.record_delivery(recipient);
                        debug!(alert_id = %message.alert_id, recipient = %recipient, "Delivery handed off");
                        true
                    }
                    Err(e) => {
                        self.counter.record_failure(recipient);
                        warn!(
                            alert_id = %message.alert_id,
                            recipient = %recipient,
                            error = %e,
                            "Delivery failed"
                        );
                        false
                    }
                }
            }
        });

        let outcomes = join_all(sends).await;
        let delivered = outcomes.iter().filter(|ok| **ok).count();

        let report = DeliveryReport {
            attempted: outcomes.len(),
            delivered,
            failed: outcomes.len() - delivered,
        };

        info!(
            alert_id = %config.id,
            subject = %message.subject,
            attempted = report.attempted,
            delivered = report.delivered,
            failed = report.failed,
            "Alert dispatched"
        );

        report
    }
}
