use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tracing::warn;
use vigil_core::{RecipientResolver, RecipientSelector, Result};
use vigil_types::{DeliveryChannel, Recipient};

/// Resolves recipient selectors against a static user directory.
///
/// Email values containing `@` are used as addresses; anything else is treated
/// as a user id and looked up. Webhook values are URLs.
#[derive(Debug, Clone, Default)]
pub struct DirectoryResolver {
    directory: HashMap<String, String>,
}

impl DirectoryResolver {
    pub fn new(directory: HashMap<String, String>) -> Self {
        Self { directory }
    }

    pub fn with_user(mut self, user_id: impl Into<String>, email: impl Into<String>) -> Self {
        self.directory.insert(user_id.into(), email.into());
        self
    }

    fn resolve_email(&self, value: &str) -> Option<String> {
        if value.contains('@') {
            return Some(value.to_string());
        }

        let found = self.directory.get(value).cloned();
        if found.is_none() {
            warn!(user_id = %value, "Unknown user in recipient list, skipping");
        }
        found
    }
}

#[async_trait]
impl RecipientResolver for DirectoryResolver {
    async fn resolve(&self, selector: &RecipientSelector) -> Result<Vec<Recipient>> {
        let recipients = selector
            .values
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .filter_map(|value| match selector.channel {
                DeliveryChannel::Email => self.resolve_email(value).map(Recipient::email),
                DeliveryChannel::Webhook => Some(Recipient::webhook(value)),
            })
            .collect();

        Ok(dedup_recipients(recipients))
    }
}

/// Drops repeated recipients, keeping the first occurrence.
pub fn dedup_recipients(recipients: Vec<Recipient>) -> Vec<Recipient> {
    let mut seen = HashSet::new();
    recipients
        .into_iter()
        .filter(|r| seen.insert(r.clone()))
        .collect()
}
