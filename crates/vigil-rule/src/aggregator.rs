use crate::evaluator::EntityEvaluator;
use crate::window::TimeWindow;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vigil_core::{AlertConfig, AlertDataSource, AlertMode, Clock, Result, TimezoneOracle, VigilError};
use vigil_types::{EvaluationResult, FiredAlert};

/// What happened to one entity during a run.
#[derive(Debug)]
enum EntityOutcome {
    /// Outside its trigger hour
    Skipped,
    Failed,
    Evaluated(EvaluationResult),
}

/// Per-run tallies, logged with the run outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub evaluated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub matched: usize,
}

/// Evaluates every entity of an alert and decides whether it fires.
pub struct AlertAggregator {
    source: Arc<dyn AlertDataSource>,
    timezone: Arc<dyn TimezoneOracle>,
    window: TimeWindow,
    fetch_timeout: Duration,
}

impl AlertAggregator {
    pub fn new(
        source: Arc<dyn AlertDataSource>,
        timezone: Arc<dyn TimezoneOracle>,
        window: TimeWindow,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            timezone,
            window,
            fetch_timeout,
        }
    }

    /// Run one evaluation pass for `config`.
    ///
    /// The clock is read once. Entities are evaluated concurrently and joined
    /// before anything is decided; matches keep the configured entity order.
    /// Returns `VigilError::Cancelled` if `cancel` fires first, discarding all
    /// partial results.
    pub async fn run(
        &self,
        config: &AlertConfig,
        clock: &dyn Clock,
        cancel: &CancellationToken,
    ) -> Result<Option<FiredAlert>> {
        let (fired, _) = self.run_with_stats(config, clock, cancel).await?;
        Ok(fired)
    }

    pub async fn run_with_stats(
        &self,
        config: &AlertConfig,
        clock: &dyn Clock,
        cancel: &CancellationToken,
    ) -> Result<(Option<FiredAlert>, RunStats)> {
        if cancel.is_cancelled() {
            return Err(VigilError::Cancelled);
        }

        let now = clock.now();
        let evaluator = EntityEvaluator::new(&config.mode, self.window, self.fetch_timeout);

        let evaluations = config
            .entities
            .iter()
            .map(|entity_id| self.evaluate_entity(config, &evaluator, entity_id, now));

        let outcomes = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(alert_id = %config.id, "Run cancelled, discarding entity results");
                return Err(VigilError::Cancelled);
            }
            outcomes = join_all(evaluations) => outcomes,
        };

        let mut stats = RunStats::default();
        let mut matches = Vec::new();
        for outcome in outcomes {
            match outcome {
                EntityOutcome::Skipped => stats.skipped += 1,
                EntityOutcome::Failed => stats.failed += 1,
                EntityOutcome::Evaluated(result) => {
                    stats.evaluated += 1;
                    if result.matched {
                        matches.push(result);
                    }
                }
            }
        }
        stats.matched = matches.len();

        let fired = FiredAlert::from_results(&config.id, &config.name, matches, now);

        if fired.is_some() {
            info!(
                alert_id = %config.id,
                mode = config.mode.name(),
                matched = stats.matched,
                evaluated = stats.evaluated,
                skipped = stats.skipped,
                failed = stats.failed,
                "Alert condition met"
            );
        } else {
            debug!(
                alert_id = %config.id,
                mode = config.mode.name(),
                evaluated = stats.evaluated,
                skipped = stats.skipped,
                failed = stats.failed,
                "No entity matched"
            );
        }

        Ok((fired, stats))
    }

    async fn evaluate_entity(
        &self,
        config: &AlertConfig,
        evaluator: &EntityEvaluator,
        entity_id: &str,
        now: DateTime<Utc>,
    ) -> EntityOutcome {
        let localized;
        let evaluator = match &config.mode {
            AlertMode::BaselineCompare(spec) => {
                let lookup = self.timezone.zone_of(entity_id);
                let zone = match tokio::time::timeout(self.fetch_timeout, lookup).await {
                    Ok(zone) => zone,
                    Err(_) => {
                        warn!(
                            alert_id = %config.id,
                            entity_id = %entity_id,
                            after = ?self.fetch_timeout,
                            "Time zone lookup timed out"
                        );
                        return EntityOutcome::Failed;
                    }
                };

                // The gate and the compared days share the entity's own calendar
                if !TimeWindow::new(zone).is_local_hour(now, spec.trigger_hour) {
                    debug!(alert_id = %config.id, entity_id = %entity_id, zone = ?zone, "Outside trigger hour, skipped");
                    return EntityOutcome::Skipped;
                }

                localized = evaluator.in_zone(zone);
                &localized
            }
            AlertMode::NewEvent(_) => evaluator,
        };

        match evaluator.evaluate(self.source.as_ref(), entity_id, now).await {
            Ok(result) => EntityOutcome::Evaluated(result),
            Err(e) => {
                warn!(alert_id = %config.id, entity_id = %entity_id, error = %e, "Entity evaluation failed");
                EntityOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryDataSource;
    use crate::timezone::EntityTimezoneOracle;
    use chrono::TimeZone;
    use vigil_core::{AlertConfigRecord, FixedClock, ThresholdValue};
    use vigil_types::{CalendarDay, EntityInfo, MetricSeries};

    fn clock_at(hour: u32) -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 19, hour, 30, 0).unwrap())
    }

    fn config(entities: &[&str]) -> AlertConfig {
        let mut record = AlertConfigRecord::new("a-1", "Crash spike", "baseline-compare");
        record.compare_type = Some("increased by at least".into());
        record.compare_value = Some(ThresholdValue::Number(20.0));
        record.selected_apps = entities.iter().map(|e| e.to_string()).collect();
        AlertConfig::try_from(record).unwrap()
    }

    async fn seed(source: &MemoryDataSource, entity: &str, today: f64, yesterday: f64) {
        source
            .insert_series(
                entity,
                "crashdata",
                MetricSeries::new()
                    .with(CalendarDay::new(2026, 10, 19), "cr", today)
                    .with(CalendarDay::new(2026, 10, 18), "cr", yesterday),
            )
            .await;
        source.insert_entity(EntityInfo::new(entity, entity.to_uppercase())).await;
    }

    fn aggregator(source: Arc<MemoryDataSource>) -> AlertAggregator {
        let oracle = Arc::new(EntityTimezoneOracle::new(source.clone(), chrono_tz::UTC));
        AlertAggregator::new(source, oracle, TimeWindow::utc(), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_matches_keep_entity_order() {
        let source = Arc::new(MemoryDataSource::new());
        seed(&source, "a", 30.0, 10.0).await;
        seed(&source, "b", 10.0, 10.0).await;
        seed(&source, "c", 50.0, 10.0).await;

        let (fired, stats) = aggregator(source)
            .run_with_stats(&config(&["a", "b", "c"]), &clock_at(23), &CancellationToken::new())
            .await
            .unwrap();

        let fired = fired.unwrap();
        let ids: Vec<_> = fired.results.iter().map(|r| r.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(stats, RunStats { evaluated: 3, skipped: 0, failed: 0, matched: 2 });
    }

    #[tokio::test]
    async fn test_outside_trigger_hour_skips() {
        let source = Arc::new(MemoryDataSource::new());
        seed(&source, "a", 30.0, 10.0).await;

        let (fired, stats) = aggregator(source)
            .run_with_stats(&config(&["a"]), &clock_at(12), &CancellationToken::new())
            .await
            .unwrap();

        assert!(fired.is_none());
        assert_eq!(stats.skipped, 1);
    }

    #[tokio::test]
    async fn test_entity_west_of_utc_compares_its_own_day() {
        let source = Arc::new(MemoryDataSource::new());
        source
            .insert_series(
                "la",
                "crashdata",
                MetricSeries::new()
                    .with(CalendarDay::new(2026, 10, 19), "cr", 10.0)
                    .with(CalendarDay::new(2026, 10, 18), "cr", 10.0),
            )
            .await;
        source
            .insert_entity(EntityInfo::new("la", "LA").with_timezone("America/Los_Angeles"))
            .await;

        let mut record = AlertConfigRecord::new("a-2", "Crash drop", "baseline-compare");
        record.compare_type = Some("decreased by more than".into());
        record.compare_value = Some(ThresholdValue::Number(-50.0));
        record.selected_apps = vec!["la".to_string()];
        let config = AlertConfig::try_from(record).unwrap();

        // 23:30 on 2026-10-19 in Los Angeles, already 2026-10-20 in UTC
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 20, 6, 30, 0).unwrap());
        let (fired, stats) = aggregator(source)
            .run_with_stats(&config, &clock, &CancellationToken::new())
            .await
            .unwrap();

        assert!(fired.is_none());
        assert_eq!(stats, RunStats { evaluated: 1, skipped: 0, failed: 0, matched: 0 });
    }

    #[tokio::test]
    async fn test_entity_west_of_utc_fires_on_its_own_day() {
        let source = Arc::new(MemoryDataSource::new());
        source
            .insert_series(
                "la",
                "crashdata",
                MetricSeries::new()
                    .with(CalendarDay::new(2026, 10, 19), "cr", 30.0)
                    .with(CalendarDay::new(2026, 10, 18), "cr", 10.0),
            )
            .await;
        source
            .insert_entity(EntityInfo::new("la", "LA").with_timezone("America/Los_Angeles"))
            .await;

        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 20, 6, 30, 0).unwrap());
        let fired = aggregator(source)
            .run(&config(&["la"]), &clock, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(fired.results[0].today_value, Some(30.0));
        assert_eq!(fired.results[0].baseline_value, Some(10.0));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let source = Arc::new(MemoryDataSource::new());
        seed(&source, "a", 30.0, 10.0).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = aggregator(source)
            .run(&config(&["a"]), &clock_at(23), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, VigilError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_abandons_in_flight_entities() {
        let source = Arc::new(MemoryDataSource::new());
        seed(&source, "a", 30.0, 10.0).await;
        seed(&source, "slow", 30.0, 10.0).await;
        source.stall_entity("slow", Duration::from_millis(500)).await;

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let aggregator = AlertAggregator::new(
            source.clone(),
            Arc::new(EntityTimezoneOracle::new(source, chrono_tz::UTC)),
            TimeWindow::utc(),
            Duration::from_secs(5),
        );
        let err = aggregator
            .run(&config(&["a", "slow"]), &clock_at(23), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, VigilError::Cancelled));
    }
}
