use crate::comparator::compare;
use crate::detector::detect;
use crate::window::TimeWindow;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};
use vigil_core::{AlertDataSource, AlertMode, BaselineSpec, NewEventSpec, Result, VigilError};
use vigil_types::EvaluationResult;

/// Per-entity evaluation for one alert mode. Built once per run from the alert's mode.
#[derive(Debug, Clone)]
pub enum EntityEvaluator {
    Baseline(BaselineEvaluator),
    NewEvent(NewEventEvaluator),
}

impl EntityEvaluator {
    pub fn new(mode: &AlertMode, window: TimeWindow, fetch_timeout: Duration) -> Self {
        match mode {
            AlertMode::BaselineCompare(spec) => EntityEvaluator::Baseline(BaselineEvaluator {
                spec: spec.clone(),
                window,
                fetch_timeout,
            }),
            AlertMode::NewEvent(spec) => EntityEvaluator::NewEvent(NewEventEvaluator {
                spec: spec.clone(),
                window,
                fetch_timeout,
            }),
        }
    }

    /// The same evaluator with its calendar read in `zone`. New-event cutoffs do not depend on a zone.
    pub fn in_zone(&self, zone: Tz) -> Self {
        match self {
            EntityEvaluator::Baseline(e) => EntityEvaluator::Baseline(BaselineEvaluator {
                window: TimeWindow::new(zone),
                ..e.clone()
            }),
            EntityEvaluator::NewEvent(e) => EntityEvaluator::NewEvent(e.clone()),
        }
    }

    /// Fetch, evaluate and package one entity.
    ///
    /// Errors are always per-entity (`Fetch` or `Timeout`); the caller skips the entity.
    pub async fn evaluate(
        &self,
        source: &dyn AlertDataSource,
        entity_id: &str,
        now: DateTime<Utc>,
    ) -> Result<EvaluationResult> {
        let result = match self {
            EntityEvaluator::Baseline(evaluator) => evaluator.evaluate(source, entity_id, now).await?,
            EntityEvaluator::NewEvent(evaluator) => evaluator.evaluate(source, entity_id, now).await?,
        };

        if !result.matched {
            return Ok(result);
        }

        attach_entity(source, result, self.fetch_timeout()).await
    }

    fn fetch_timeout(&self) -> Duration {
        match self {
            EntityEvaluator::Baseline(e) => e.fetch_timeout,
            EntityEvaluator::NewEvent(e) => e.fetch_timeout,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BaselineEvaluator {
    spec: BaselineSpec,
    window: TimeWindow,
    fetch_timeout: Duration,
}

impl BaselineEvaluator {
    async fn evaluate(
        &self,
        source: &dyn AlertDataSource,
        entity_id: &str,
        now: DateTime<Utc>,
    ) -> Result<EvaluationResult> {
        let series = bounded(
            entity_id,
            self.fetch_timeout,
            source.metric_series(entity_id, &self.spec.metric, self.spec.period),
        )
        .await?;

        let (today, yesterday) = self.window.today_and_yesterday(now);
        let today_value = series.value(today, &self.spec.field).unwrap_or(0.0);
        let baseline_value = series.value(yesterday, &self.spec.field).unwrap_or(0.0);

        let comparison = compare(
            today_value,
            baseline_value,
            self.spec.direction,
            self.spec.threshold,
        );

        debug!(
            entity_id = %entity_id,
            today = %today,
            today_value,
            baseline_value,
            percent_change = comparison.percent_change,
            matched = comparison.matched,
            "Baseline compared"
        );

        Ok(EvaluationResult::baseline(
            entity_id,
            today_value,
            baseline_value,
            comparison.percent_change,
            comparison.matched,
        ))
    }
}

#[derive(Debug, Clone)]
pub struct NewEventEvaluator {
    spec: NewEventSpec,
    window: TimeWindow,
    fetch_timeout: Duration,
}

impl NewEventEvaluator {
    async fn evaluate(
        &self,
        source: &dyn AlertDataSource,
        entity_id: &str,
        now: DateTime<Utc>,
    ) -> Result<EvaluationResult> {
        let cutoff = self.window.recent_cutoff(now, self.spec.window_secs);

        let feed = bounded(
            entity_id,
            self.fetch_timeout,
            source.new_events(entity_id, &self.spec.feed, cutoff, self.spec.limit),
        )
        .await?;

        let events = detect(feed, cutoff, self.spec.limit);

        debug!(
            entity_id = %entity_id,
            cutoff = %cutoff,
            found = events.len(),
            "New events scanned"
        );

        Ok(EvaluationResult::new_events(entity_id, events))
    }
}

/// Resolve display metadata for a matched entity. A lookup failure keeps the match.
async fn attach_entity(
    source: &dyn AlertDataSource,
    result: EvaluationResult,
    fetch_timeout: Duration,
) -> Result<EvaluationResult> {
    let entity_id = result.entity_id.clone();
    match bounded(&entity_id, fetch_timeout, source.entity_info(&entity_id)).await {
        Ok(info) => Ok(result.with_entity(info)),
        Err(e) => {
            warn!(entity_id = %entity_id, error = %e, "Entity metadata lookup failed, using id");
            Ok(result)
        }
    }
}

/// Bound a collaborator call by `after`, mapping every failure to a per-entity error.
async fn bounded<T>(
    entity_id: &str,
    after: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(after, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) if e.is_entity_failure() => Err(e),
        Ok(Err(e)) => Err(VigilError::fetch(entity_id, e)),
        Err(_) => Err(VigilError::Timeout {
            entity_id: entity_id.to_string(),
            after,
        }),
    }
}
