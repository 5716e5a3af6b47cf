use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Last-fired timestamps per alert, used to suppress repeat firings.
#[async_trait]
pub trait FiringLedger: Send + Sync {
    async fn last_fired(&self, alert_id: &str) -> Option<DateTime<Utc>>;

    async fn record_fired(&self, alert_id: &str, at: DateTime<Utc>);
}

#[derive(Default)]
pub struct MemoryFiringLedger {
    fired: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
}

impl MemoryFiringLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FiringLedger for MemoryFiringLedger {
    async fn last_fired(&self, alert_id: &str) -> Option<DateTime<Utc>> {
        self.fired.read().await.get(alert_id).copied()
    }

    async fn record_fired(&self, alert_id: &str, at: DateTime<Utc>) {
        let mut fired = self.fired.write().await;
        let entry = fired.entry(alert_id.to_string()).or_insert(at);
        if at > *entry {
            *entry = at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_keeps_latest() {
        let ledger = MemoryFiringLedger::new();
        let now = Utc::now();
        assert!(ledger.last_fired("a").await.is_none());

        ledger.record_fired("a", now).await;
        ledger.record_fired("a", now - Duration::minutes(5)).await;
        assert_eq!(ledger.last_fired("a").await, Some(now));
    }
}
