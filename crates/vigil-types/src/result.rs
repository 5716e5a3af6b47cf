use crate::entity::EntityInfo;
use crate::event::EventRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of evaluating one entity for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub entity_id: String,
    pub matched: bool,
    /// Baseline-compare only
    pub today_value: Option<f64>,
    /// Baseline-compare only (yesterday's value)
    pub baseline_value: Option<f64>,
    pub percent_change: Option<f64>,
    /// New-event only
    pub events: Vec<EventRecord>,
    /// Only resolved for matched entities
    pub entity: Option<EntityInfo>,
}

impl EvaluationResult {
    pub fn baseline(
        entity_id: impl Into<String>,
        today_value: f64,
        baseline_value: f64,
        percent_change: f64,
        matched: bool,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            matched,
            today_value: Some(today_value),
            baseline_value: Some(baseline_value),
            percent_change: Some(percent_change),
            events: Vec::new(),
            entity: None,
        }
    }

    pub fn new_events(entity_id: impl Into<String>, events: Vec<EventRecord>) -> Self {
        Self {
            entity_id: entity_id.into(),
            matched: !events.is_empty(),
            today_value: None,
            baseline_value: None,
            percent_change: None,
            events,
            entity: None,
        }
    }

    pub fn with_entity(mut self, entity: EntityInfo) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Entity name for messages, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.entity
            .as_ref()
            .map(|e| e.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(self.entity_id.as_str())
    }
}

/// All matched results of one alert run. Never empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiredAlert {
    pub alert_id: String,
    pub alert_name: String,
    pub results: Vec<EvaluationResult>,
    pub fired_at: DateTime<Utc>,
}

impl FiredAlert {
    /// Returns `None` when no result matched; unmatched results are dropped, order is kept.
    pub fn from_results(
        alert_id: impl Into<String>,
        alert_name: impl Into<String>,
        results: impl IntoIterator<Item = EvaluationResult>,
        fired_at: DateTime<Utc>,
    ) -> Option<Self> {
        let results: Vec<_> = results.into_iter().filter(|r| r.matched).collect();
        if results.is_empty() {
            return None;
        }

        Some(Self {
            alert_id: alert_id.into(),
            alert_name: alert_name.into(),
            results,
            fired_at,
        })
    }

    pub fn match_count(&self) -> usize {
        self.results.len()
    }
}
