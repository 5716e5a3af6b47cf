use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery channel a recipient is reached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryChannel {
    Email,
    #[serde(alias = "http")]
    Webhook,
}

impl DeliveryChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryChannel::Email => "email",
            DeliveryChannel::Webhook => "webhook",
        }
    }
}

impl fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved delivery target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipient {
    pub channel: DeliveryChannel,
    /// Mail address or webhook URL
    pub address: String,
}

impl Recipient {
    pub fn email(address: impl Into<String>) -> Self {
        Self {
            channel: DeliveryChannel::Email,
            address: address.into(),
        }
    }

    pub fn webhook(url: impl Into<String>) -> Self {
        Self {
            channel: DeliveryChannel::Webhook,
            address: url.into(),
        }
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel, self.address)
    }
}
