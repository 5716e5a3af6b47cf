use crate::engine::AlertEngine;
use crate::execution::AlertExecution;
use anyhow::Result;
use dashmap::DashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vigil_core::alert::{MODE_BASELINE_COMPARE, MODE_NEW_EVENT};
use vigil_core::AlertConfigRecord;

/// Cron expressions (6 fields, with seconds) per alert mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSettings {
    pub baseline_cron: String,
    pub new_event_cron: String,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            baseline_cron: "0 0 * * * *".to_string(),
            new_event_cron: "0 */5 * * * *".to_string(),
        }
    }
}

impl ScheduleSettings {
    pub fn cron_for(&self, mode: &str) -> Option<&str> {
        match mode {
            MODE_BASELINE_COMPARE => Some(&self.baseline_cron),
            MODE_NEW_EVENT => Some(&self.new_event_cron),
            _ => None,
        }
    }
}

/// Marks an alert as running until dropped.
struct InFlight {
    running: Arc<DashSet<String>>,
    alert_id: String,
}

impl InFlight {
    fn acquire(running: &Arc<DashSet<String>>, alert_id: &str) -> Option<Self> {
        running.insert(alert_id.to_string()).then(|| Self {
            running: running.clone(),
            alert_id: alert_id.to_string(),
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.running.remove(&self.alert_id);
    }
}

/// Invokes the engine on a cron cadence, one job per alert.
pub struct TriggerManager {
    engine: Arc<AlertEngine>,
    schedule: ScheduleSettings,
    scheduler: Arc<RwLock<Option<JobScheduler>>>,
    running: Arc<DashSet<String>>,
    cancel: CancellationToken,
}

impl TriggerManager {
    pub fn new(engine: Arc<AlertEngine>, schedule: ScheduleSettings) -> Self {
        Self {
            engine,
            schedule,
            scheduler: Arc::new(RwLock::new(None)),
            running: Arc::new(DashSet::new()),
            cancel: CancellationToken::new(),
        }
    }

    pub async fn start(&self) -> Result<()> {
        let scheduler = JobScheduler::new().await?;
        scheduler.start().await?;

        *self.scheduler.write().await = Some(scheduler);

        info!("Trigger manager started");
        Ok(())
    }

    /// Cancel in-flight runs and shut the scheduler down.
    pub async fn stop(&self) -> Result<()> {
        self.cancel.cancel();

        if let Some(mut scheduler) = self.scheduler.write().await.take() {
            scheduler.shutdown().await?;
        }

        info!("Trigger manager stopped");
        Ok(())
    }

    /// Register every enabled alert in storage. Returns how many were scheduled.
    pub async fn register_all(&self) -> Result<usize> {
        let mut count = 0;
        for record in self.engine.storage().list_enabled().await {
            match self.register_alert(&record).await {
                Ok(()) => count += 1,
                Err(e) => warn!(alert_id = %record.id, error = %e, "Alert not scheduled"),
            }
        }
        Ok(count)
    }

    pub async fn register_alert(&self, record: &AlertConfigRecord) -> Result<()> {
        let cron = self
            .schedule
            .cron_for(&record.mode)
            .ok_or_else(|| anyhow::anyhow!("No schedule for mode '{}'", record.mode))?
            .to_string();

        let scheduler_lock = self.scheduler.read().await;
        let scheduler = scheduler_lock
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Scheduler not started"))?;

        let alert_id = record.id.clone();
        let engine = self.engine.clone();
        let running = self.running.clone();
        let cancel = self.cancel.clone();

        let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
            let alert_id = alert_id.clone();
            let engine = engine.clone();
            let running = running.clone();
            let cancel = cancel.clone();

            Box::pin(async move {
                run_guarded(&engine, &running, &cancel, &alert_id).await;
            })
        })?;

        scheduler.add(job).await?;

        info!(
            alert_id = %record.id,
            alert_name = %record.name,
            cron = %cron,
            "Alert scheduled"
        );

        Ok(())
    }

    /// Run `alert_id` now. `None` when a run of it is already in flight.
    pub async fn trigger(&self, alert_id: &str) -> Option<AlertExecution> {
        run_guarded(&self.engine, &self.running, &self.cancel, alert_id).await
    }

    pub fn is_running(&self, alert_id: &str) -> bool {
        self.running.contains(alert_id)
    }
}

async fn run_guarded(
    engine: &AlertEngine,
    running: &Arc<DashSet<String>>,
    cancel: &CancellationToken,
    alert_id: &str,
) -> Option<AlertExecution> {
    let _guard = match InFlight::acquire(running, alert_id) {
        Some(guard) => guard,
        None => {
            warn!(alert_id = %alert_id, "Previous run still in flight, skipping");
            return None;
        }
    };

    let run_cancel = cancel.child_token();
    Some(engine.run_alert(alert_id, &run_cancel).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineSettings;
    use crate::execution::ExecutionStatus;
    use crate::source::MemoryDataSource;
    use crate::storage::AlertStorage;
    use crate::timezone::EntityTimezoneOracle;
    use vigil_core::SystemClock;
    use vigil_notify::{
        DirectoryResolver, InMemoryAlertCounter, LogNotifier, MessageComposer, NotificationDispatcher,
    };

    fn manager(records: Vec<AlertConfigRecord>) -> TriggerManager {
        let source = Arc::new(MemoryDataSource::new());
        let dispatcher = Arc::new(NotificationDispatcher::new(
            Arc::new(DirectoryResolver::default()),
            Arc::new(LogNotifier),
            Arc::new(InMemoryAlertCounter::new()),
            MessageComposer::new("http://localhost"),
        ));
        let engine = AlertEngine::new(
            Arc::new(AlertStorage::with_records(records)),
            source.clone(),
            Arc::new(EntityTimezoneOracle::new(source, chrono_tz::UTC)),
            dispatcher,
            Arc::new(SystemClock),
            EngineSettings::default(),
        );
        TriggerManager::new(Arc::new(engine), ScheduleSettings::default())
    }

    #[tokio::test]
    async fn test_trigger_manager() {
        let manager = manager(vec![
            AlertConfigRecord::new("new", "New crashes", "new-event"),
            AlertConfigRecord::new("odd", "Odd", "sliding-median"),
        ]);

        manager.start().await.unwrap();
        assert_eq!(manager.register_all().await.unwrap(), 1);
        manager.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_register_before_start_fails() {
        let manager = manager(Vec::new());
        let record = AlertConfigRecord::new("new", "New crashes", "new-event");
        assert!(manager.register_alert(&record).await.is_err());
    }

    #[tokio::test]
    async fn test_in_flight_run_is_skipped() {
        let manager = manager(vec![AlertConfigRecord::new("new", "New crashes", "new-event")]);

        let guard = InFlight::acquire(&manager.running, "new").unwrap();
        assert!(manager.is_running("new"));
        assert!(manager.trigger("new").await.is_none());

        drop(guard);
        assert!(!manager.is_running("new"));
        let execution = manager.trigger("new").await.unwrap();
        assert_eq!(execution.status, ExecutionStatus::Quiet);
    }

    #[test]
    fn test_cron_for_mode() {
        let schedule = ScheduleSettings::default();
        assert_eq!(schedule.cron_for("new-event"), Some("0 */5 * * * *"));
        assert_eq!(schedule.cron_for("baseline-compare"), Some("0 0 * * * *"));
        assert_eq!(schedule.cron_for("other"), None);
    }
}
