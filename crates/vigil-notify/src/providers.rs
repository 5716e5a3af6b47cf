use crate::message::AlertMessage;
use crate::notifier::{Notifier, NotifyError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};
use vigil_types::Recipient;

// ============================================================================
// Email
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub from: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_enabled() -> bool {
    true
}

pub struct EmailNotifier {
    config: EmailConfig,
    mailer: lettre::AsyncSmtpTransport<lettre::Tokio1Executor>,
    enabled: bool,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Result<Self, NotifyError> {
        use lettre::transport::smtp::authentication::Credentials;
        use lettre::{AsyncSmtpTransport, Tokio1Executor};

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| NotifyError::Smtp(e.to_string()))?
            .port(config.smtp_port);

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            mailer: builder.build(),
            enabled: config.enabled,
            config,
        })
    }
}

/// Builds the plain-text mail for one recipient.
pub fn build_email(
    from: &str,
    recipient: &Recipient,
    message: &AlertMessage,
) -> Result<lettre::Message, NotifyError> {
    use lettre::message::header::ContentType;

    let from = from
        .parse()
        .map_err(|e: lettre::address::AddressError| NotifyError::Address(format!("{}: {}", from, e)))?;
    let to = recipient
        .address
        .parse()
        .map_err(|e: lettre::address::AddressError| {
            NotifyError::Address(format!("{}: {}", recipient.address, e))
        })?;

    lettre::Message::builder()
        .from(from)
        .to(to)
        .subject(&message.subject)
        .header(ContentType::TEXT_PLAIN)
        .body(message.body.clone())
        .map_err(|e| NotifyError::Smtp(e.to_string()))
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, recipient: &Recipient, message: &AlertMessage) -> Result<(), NotifyError> {
        use lettre::AsyncTransport;

        let email = build_email(&self.config.from, recipient, message)?;
        self.mailer
            .send(email)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        debug!(to = %recipient.address, subject = %message.subject, "Email delivered");
        Ok(())
    }

    fn name(&self) -> &str {
        "email"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

// ============================================================================
// Webhook
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default = "default_webhook_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_webhook_timeout() -> u64 {
    10
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            headers: HashMap::new(),
            timeout_secs: default_webhook_timeout(),
            enabled: default_enabled(),
        }
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    alert_id: &'a str,
    alert_name: &'a str,
    subject: &'a str,
    body: &'a str,
    sent_at: chrono::DateTime<chrono::Utc>,
}

/// POSTs the message as JSON to the recipient's URL.
pub struct WebhookNotifier {
    config: WebhookConfig,
    client: reqwest::Client,
    enabled: bool,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| NotifyError::Http(e.to_string()))?;

        Ok(Self {
            enabled: config.enabled,
            config,
            client,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, recipient: &Recipient, message: &AlertMessage) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            alert_id: &message.alert_id,
            alert_name: &message.alert_name,
            subject: &message.subject,
            body: &message.body,
            sent_at: chrono::Utc::now(),
        };

        let mut request = self.client.post(&recipient.address);
        for (key, value) in &self.config.headers {
            request = request.header(key, value);
        }

        let response = request
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Http(format!(
                "Webhook failed with status: {}",
                response.status()
            )));
        }

        debug!(url = %recipient.address, "Webhook delivered");
        Ok(())
    }

    fn name(&self) -> &str {
        "webhook"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

// ============================================================================
// Log
// ============================================================================

/// Writes deliveries to the log instead of sending them.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipient: &Recipient, message: &AlertMessage) -> Result<(), NotifyError> {
        info!(
            to = %recipient,
            alert_id = %message.alert_id,
            subject = %message.subject,
            "Alert delivery (log only)"
        );
        debug!(body = %message.body, "Alert delivery body");
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
