use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vigil_types::{EntityInfo, EventRecord, MetricSeries, PeriodSpec};

/// Metric and event store the engine reads from.
///
/// Implementations must be safe to share across concurrent runs.
#[async_trait]
pub trait AlertDataSource: Send + Sync {
    /// Daily values of `metric` for one entity covering `period`.
    async fn metric_series(
        &self,
        entity_id: &str,
        metric: &str,
        period: PeriodSpec,
    ) -> Result<MetricSeries>;

    /// Events of `feed` first seen after `since`, newest `last_seen` first, at most `limit`.
    async fn new_events(
        &self,
        entity_id: &str,
        feed: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<EventRecord>>;

    async fn entity_info(&self, entity_id: &str) -> Result<EntityInfo>;
}
