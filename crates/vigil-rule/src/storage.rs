use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use vigil_core::AlertConfigRecord;

/// Alert definitions as authored (in-memory). Records are validated per run.
pub struct AlertStorage {
    alerts: Arc<RwLock<HashMap<String, AlertConfigRecord>>>,
}

impl AlertStorage {
    pub fn new() -> Self {
        Self {
            alerts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_records(records: impl IntoIterator<Item = AlertConfigRecord>) -> Self {
        let alerts = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            alerts: Arc::new(RwLock::new(alerts)),
        }
    }

    pub async fn save(&self, record: AlertConfigRecord) {
        let mut alerts = self.alerts.write().await;
        alerts.insert(record.id.clone(), record);
    }

    pub async fn get(&self, alert_id: &str) -> Option<AlertConfigRecord> {
        let alerts = self.alerts.read().await;
        alerts.get(alert_id).cloned()
    }

    /// All records, sorted by id.
    pub async fn list(&self) -> Vec<AlertConfigRecord> {
        let alerts = self.alerts.read().await;
        let mut records: Vec<_> = alerts.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    pub async fn list_enabled(&self) -> Vec<AlertConfigRecord> {
        self.list().await.into_iter().filter(|r| r.enabled).collect()
    }
}

impl Default for AlertStorage {
    fn default() -> Self {
        Self::new()
    }
}
