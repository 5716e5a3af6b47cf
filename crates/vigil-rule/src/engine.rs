use crate::aggregator::AlertAggregator;
use crate::execution::{AlertExecution, ExecutionStatus};
use crate::ledger::{FiringLedger, MemoryFiringLedger};
use crate::storage::AlertStorage;
use crate::window::TimeWindow;
use chrono_tz::Tz;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use vigil_core::{AlertConfig, AlertDataSource, Clock, Result, TimezoneOracle, VigilError};
use vigil_notify::NotificationDispatcher;

/// Engine tuning
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Engine calendar zone. Baseline entities use the zone their time-zone collaborator reports
    pub zone: Tz,
    /// Bound on every data collaborator call
    pub fetch_timeout: Duration,
    /// Executions kept in memory
    pub history_limit: usize,
    /// Suppress firings within this long of the previous one. `None` disables the ledger check.
    pub suppression_window: Option<chrono::Duration>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            zone: chrono_tz::UTC,
            fetch_timeout: Duration::from_secs(10),
            history_limit: 1000,
            suppression_window: None,
        }
    }
}

/// Runs alerts end to end: validate, aggregate, dispatch, record.
pub struct AlertEngine {
    storage: Arc<AlertStorage>,
    aggregator: AlertAggregator,
    dispatcher: Arc<NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    ledger: Arc<dyn FiringLedger>,
    settings: EngineSettings,

    /// Oldest first
    executions: Arc<RwLock<VecDeque<AlertExecution>>>,
}

impl AlertEngine {
    pub fn new(
        storage: Arc<AlertStorage>,
        source: Arc<dyn AlertDataSource>,
        timezone: Arc<dyn TimezoneOracle>,
        dispatcher: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
        settings: EngineSettings,
    ) -> Self {
        let aggregator = AlertAggregator::new(
            source,
            timezone,
            TimeWindow::new(settings.zone),
            settings.fetch_timeout,
        );

        Self {
            storage,
            aggregator,
            dispatcher,
            clock,
            ledger: Arc::new(MemoryFiringLedger::new()),
            settings,
            executions: Arc::new(RwLock::new(VecDeque::new())),
        }
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn FiringLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn storage(&self) -> &Arc<AlertStorage> {
        &self.storage
    }

    /// Perform one run of `alert_id`.
    ///
    /// Always completes with an execution record, which is also appended to
    /// the history. Configuration errors abort before any dispatch.
    pub async fn run_alert(&self, alert_id: &str, cancel: &CancellationToken) -> AlertExecution {
        let started_at = self.clock.now();
        let mut execution = AlertExecution {
            id: uuid::Uuid::new_v4().to_string(),
            alert_id: alert_id.to_string(),
            alert_name: None,
            started_at,
            finished_at: started_at,
            status: ExecutionStatus::Failed,
            matched: 0,
            delivery: None,
            error: None,
        };

        match self.execute(alert_id, cancel, &mut execution).await {
            Ok(status) => execution.status = status,
            Err(VigilError::Cancelled) => {
                execution.status = ExecutionStatus::Cancelled;
                execution.error = Some(VigilError::Cancelled.to_string());
            }
            Err(e) => {
                execution.status = ExecutionStatus::Failed;
                execution.error = Some(e.to_string());
            }
        }
        execution.finished_at = self.clock.now();

        match execution.status {
            ExecutionStatus::Failed => error!(
                alert_id = %alert_id,
                error = execution.error.as_deref().unwrap_or_default(),
                "Alert run failed"
            ),
            ExecutionStatus::Cancelled => warn!(alert_id = %alert_id, "Alert run cancelled"),
            status => info!(
                alert_id = %alert_id,
                status = status.as_str(),
                matched = execution.matched,
                delivered = execution.delivery.map(|d| d.delivered).unwrap_or(0),
                "Alert run completed"
            ),
        }

        self.record(execution.clone()).await;
        execution
    }

    async fn execute(
        &self,
        alert_id: &str,
        cancel: &CancellationToken,
        execution: &mut AlertExecution,
    ) -> Result<ExecutionStatus> {
        let record = self
            .storage
            .get(alert_id)
            .await
            .ok_or_else(|| VigilError::NotFound(format!("alert {}", alert_id)))?;
        execution.alert_name = Some(record.name.clone());

        let config = AlertConfig::try_from(record)?;
        if !config.enabled {
            return Ok(ExecutionStatus::Disabled);
        }

        if self.is_suppressed(&config, execution.started_at).await {
            return Ok(ExecutionStatus::Suppressed);
        }

        let (fired, stats) = self
            .aggregator
            .run_with_stats(&config, self.clock.as_ref(), cancel)
            .await?;
        execution.matched = stats.matched;

        let fired = match fired {
            Some(fired) => fired,
            None => return Ok(ExecutionStatus::Quiet),
        };

        if cancel.is_cancelled() {
            return Err(VigilError::Cancelled);
        }

        let report = self.dispatcher.dispatch(&config, &fired).await;
        self.ledger.record_fired(&config.id, fired.fired_at).await;
        execution.delivery = Some(report);

        Ok(ExecutionStatus::Fired)
    }

    async fn is_suppressed(&self, config: &AlertConfig, now: chrono::DateTime<chrono::Utc>) -> bool {
        let window = match self.settings.suppression_window {
            Some(window) => window,
            None => return false,
        };

        match self.ledger.last_fired(&config.id).await {
            Some(last) => now - last < window,
            None => false,
        }
    }

    async fn record(&self, execution: AlertExecution) {
        let mut executions = self.executions.write().await;
        executions.push_back(execution);
        while executions.len() > self.settings.history_limit {
            executions.pop_front();
        }
    }

    /// Newest first, optionally for one alert.
    pub async fn execution_history(&self, alert_id: Option<&str>, limit: usize) -> Vec<AlertExecution> {
        let executions = self.executions.read().await;
        executions
            .iter()
            .rev()
            .filter(|e| alert_id.map_or(true, |id| e.alert_id == id))
            .take(limit)
            .cloned()
            .collect()
    }
}
