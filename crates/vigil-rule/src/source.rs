use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use vigil_core::{AlertDataSource, Result, VigilError};
use vigil_types::{EntityInfo, EventRecord, MetricPoint, MetricSeries, PeriodSpec};

/// A metric point tagged with the metric it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetric {
    pub metric: String,
    #[serde(flatten)]
    pub point: MetricPoint,
}

/// An event tagged with the feed it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEvent {
    pub feed: String,
    #[serde(flatten)]
    pub event: EventRecord,
}

/// Serialized contents of a [`MemoryDataSource`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSnapshot {
    #[serde(default)]
    pub entities: Vec<EntityInfo>,
    #[serde(default)]
    pub metrics: Vec<SnapshotMetric>,
    #[serde(default)]
    pub events: Vec<SnapshotEvent>,
}

type Key = (String, String);

/// In-memory data collaborator.
///
/// Serves snapshots in the server and doubles as the test fixture: entities can
/// be made to fail or stall to exercise per-entity error handling.
#[derive(Default)]
pub struct MemoryDataSource {
    entities: Arc<RwLock<HashMap<String, EntityInfo>>>,
    metrics: Arc<RwLock<HashMap<Key, MetricSeries>>>,
    events: Arc<RwLock<HashMap<Key, Vec<EventRecord>>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    stalled: Arc<RwLock<HashMap<String, Duration>>>,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: DataSnapshot) -> Self {
        let entities = snapshot
            .entities
            .into_iter()
            .map(|e| (e.id.clone(), e))
            .collect();

        let mut metrics: HashMap<Key, MetricSeries> = HashMap::new();
        for SnapshotMetric { metric, point } in snapshot.metrics {
            metrics
                .entry((point.entity_id.clone(), metric))
                .or_default()
                .insert(point.day, &point.field, point.value);
        }

        let mut events: HashMap<Key, Vec<EventRecord>> = HashMap::new();
        for SnapshotEvent { feed, event } in snapshot.events {
            events
                .entry((event.entity_id.clone(), feed))
                .or_default()
                .push(event);
        }

        Self {
            entities: Arc::new(RwLock::new(entities)),
            metrics: Arc::new(RwLock::new(metrics)),
            events: Arc::new(RwLock::new(events)),
            ..Default::default()
        }
    }

    pub async fn insert_entity(&self, entity: EntityInfo) {
        self.entities.write().await.insert(entity.id.clone(), entity);
    }

    pub async fn insert_series(&self, entity_id: &str, metric: &str, series: MetricSeries) {
        self.metrics
            .write()
            .await
            .insert((entity_id.to_string(), metric.to_string()), series);
    }

    pub async fn insert_event(&self, feed: &str, event: EventRecord) {
        self.events
            .write()
            .await
            .entry((event.entity_id.clone(), feed.to_string()))
            .or_default()
            .push(event);
    }

    /// Every fetch for `entity_id` fails from now on.
    pub async fn fail_entity(&self, entity_id: &str) {
        self.failing.write().await.insert(entity_id.to_string());
    }

    /// Every fetch for `entity_id` sleeps for `delay` first.
    pub async fn stall_entity(&self, entity_id: &str, delay: Duration) {
        self.stalled.write().await.insert(entity_id.to_string(), delay);
    }

    async fn check(&self, entity_id: &str) -> Result<()> {
        let delay = self.stalled.read().await.get(entity_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.read().await.contains(entity_id) {
            return Err(VigilError::fetch(entity_id, "data source unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl AlertDataSource for MemoryDataSource {
    async fn metric_series(
        &self,
        entity_id: &str,
        metric: &str,
        _period: PeriodSpec,
    ) -> Result<MetricSeries> {
        self.check(entity_id).await?;

        let metrics = self.metrics.read().await;
        Ok(metrics
            .get(&(entity_id.to_string(), metric.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn new_events(
        &self,
        entity_id: &str,
        feed: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<EventRecord>> {
        self.check(entity_id).await?;

        let events = self.events.read().await;
        let mut found: Vec<EventRecord> = events
            .get(&(entity_id.to_string(), feed.to_string()))
            .map(|list| {
                list.iter()
                    .filter(|e| e.is_new && e.first_seen > since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        found.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        found.truncate(limit);
        Ok(found)
    }

    async fn entity_info(&self, entity_id: &str) -> Result<EntityInfo> {
        self.check(entity_id).await?;

        self.entities
            .read()
            .await
            .get(entity_id)
            .cloned()
            .ok_or_else(|| VigilError::NotFound(format!("entity {}", entity_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use vigil_types::CalendarDay;

    #[tokio::test]
    async fn test_snapshot_roundtrip_through_json() {
        let json = r#"{
            "entities": [{"id": "app-1", "name": "Shop", "timezone": "Europe/Berlin"}],
            "metrics": [
                {"metric": "crashdata", "entity_id": "app-1", "day": {"year": 2026, "month": 10, "day": 19}, "field": "cr", "value": 12.0}
            ],
            "events": [
                {"feed": "crashgroups", "id": "c-1", "entity_id": "app-1",
                 "first_seen": "2026-10-19T11:58:00Z", "last_seen": "2026-10-19T11:59:00Z",
                 "is_new": true, "payload": "NullPointerException"}
            ]
        }"#;

        let snapshot: DataSnapshot = serde_json::from_str(json).unwrap();
        let source = MemoryDataSource::from_snapshot(snapshot);

        let info = source.entity_info("app-1").await.unwrap();
        assert_eq!(info.timezone.as_deref(), Some("Europe/Berlin"));

        let series = source
            .metric_series("app-1", "crashdata", PeriodSpec::default())
            .await
            .unwrap();
        assert_eq!(series.value(CalendarDay::new(2026, 10, 19), "cr"), Some(12.0));

        let since = Utc.with_ymd_and_hms(2026, 10, 19, 11, 55, 0).unwrap();
        let events = source.new_events("app-1", "crashgroups", since, 50).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].affected, 0);
    }

    #[tokio::test]
    async fn test_failing_entity() {
        let source = MemoryDataSource::new();
        source.fail_entity("bad").await;
        let err = source
            .metric_series("bad", "crashdata", PeriodSpec::default())
            .await
            .unwrap_err();
        assert!(err.is_entity_failure());
    }

    #[tokio::test]
    async fn test_unknown_entity_is_not_found() {
        let source = MemoryDataSource::new();
        assert!(matches!(
            source.entity_info("ghost").await,
            Err(VigilError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_new_events_respects_since() {
        let source = MemoryDataSource::new();
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        source
            .insert_event("crashgroups", EventRecord::new("old", "app", now - ChronoDuration::hours(1), "x"))
            .await;
        source
            .insert_event("crashgroups", EventRecord::new("new", "app", now, "y"))
            .await;

        let events = source
            .new_events("app", "crashgroups", now - ChronoDuration::minutes(5), 50)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "new");
    }
}
