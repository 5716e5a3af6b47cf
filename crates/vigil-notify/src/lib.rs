pub mod counter;
pub mod dispatcher;
pub mod manager;
pub mod message;
pub mod notifier;
pub mod providers;
pub mod queue;
pub mod recipients;

pub use counter::{AlertCounter, InMemoryAlertCounter, PrometheusAlertCounter};
pub use dispatcher::{DeliveryReport, NotificationDispatcher};
pub use manager::NotifyManager;
pub use message::{AlertMessage, MessageComposer};
pub use notifier::{Notifier, NotifyError};
pub use providers::{EmailConfig, EmailNotifier, LogNotifier, WebhookConfig, WebhookNotifier};
pub use queue::QueuedNotifier;
pub use recipients::{dedup_recipients, DirectoryResolver};
