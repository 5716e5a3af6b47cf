use crate::api::{create_router, ApiState};
use crate::signal::{shutdown_signal, ShutdownSignal};
use crate::snapshot;
use anyhow::{anyhow, Result};
use axum::Router;
use futures::future::join_all;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use vigil_config::{GlobalConfig, NotifyConfig};
use vigil_core::{AlertConfigRecord, SystemClock};
use vigil_notify::{
    DirectoryResolver, EmailNotifier, LogNotifier, MessageComposer, NotificationDispatcher,
    Notifier, NotifyManager, PrometheusAlertCounter, QueuedNotifier, WebhookNotifier,
};
use vigil_rule::{
    AlertEngine, AlertExecution, AlertStorage, EngineSettings, EntityTimezoneOracle,
    ScheduleSettings, TriggerManager,
};
use vigil_types::DeliveryChannel;

/// How long shutdown waits for queued deliveries.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// The assembled service.
pub struct VigilApp {
    global: GlobalConfig,
    engine: Arc<AlertEngine>,
    trigger: Arc<TriggerManager>,
    counter: Arc<PrometheusAlertCounter>,
    workers: Vec<JoinHandle<()>>,
}

impl VigilApp {
    /// Wire every collaborator from configuration. Must run inside a tokio runtime.
    pub async fn build(global: GlobalConfig, alerts: Vec<AlertConfigRecord>) -> Result<Self> {
        global.validate()?;

        let zone = global.engine.parse_zone()?;
        let source = Arc::new(snapshot::build_source(&global.data)?);
        let storage = Arc::new(AlertStorage::with_records(alerts));
        let timezone = Arc::new(EntityTimezoneOracle::new(source.clone(), zone));

        let (notifier, workers) = build_notifier(&global.notify).await?;
        let counter = Arc::new(PrometheusAlertCounter::new()?);
        let dispatcher = Arc::new(NotificationDispatcher::new(
            Arc::new(DirectoryResolver::new(global.notify.users.clone())),
            notifier,
            counter.clone(),
            MessageComposer::new(global.notify.host.clone())
                .with_heading(format!("{} Alert", global.system.name)),
        ));

        let settings = EngineSettings {
            zone,
            fetch_timeout: global.engine.fetch_timeout(),
            history_limit: global.engine.history_limit,
            suppression_window: global
                .engine
                .suppression_window()
                .map(chrono::Duration::from_std)
                .transpose()?,
        };

        let engine = Arc::new(AlertEngine::new(
            storage,
            source,
            timezone,
            dispatcher,
            Arc::new(SystemClock),
            settings,
        ));

        let schedule = ScheduleSettings {
            baseline_cron: global.schedule.baseline_cron.clone(),
            new_event_cron: global.schedule.new_event_cron.clone(),
        };
        let trigger = Arc::new(TriggerManager::new(engine.clone(), schedule));

        Ok(Self {
            global,
            engine,
            trigger,
            counter,
            workers,
        })
    }

    pub fn engine(&self) -> &Arc<AlertEngine> {
        &self.engine
    }

    pub fn router(&self) -> Router {
        create_router(Arc::new(ApiState {
            engine: self.engine.clone(),
            trigger: self.trigger.clone(),
            counter: self.counter.clone(),
        }))
    }

    /// Run one alert immediately, bypassing the schedule.
    pub async fn run_once(&self, alert_id: &str) -> Option<AlertExecution> {
        self.trigger.trigger(alert_id).await
    }

    /// Start the scheduler and register every enabled alert.
    pub async fn start(&self) -> Result<usize> {
        self.trigger.start().await?;
        let scheduled = self.trigger.register_all().await?;
        info!(scheduled, "Alerts scheduled");
        Ok(scheduled)
    }

    /// Serve until SIGINT or SIGTERM, then shut down.
    pub async fn run(self) -> Result<()> {
        self.start().await?;

        if self.global.api.enabled {
            let bind = &self.global.api.bind;
            let addr: SocketAddr = bind
                .parse()
                .map_err(|e| anyhow!("Invalid api bind {}: {}", bind, e))?;
            info!(%addr, "HTTP API listening");

            axum::Server::bind(&addr)
                .serve(self.router().into_make_service())
                .with_graceful_shutdown(async {
                    log_shutdown(shutdown_signal().await);
                })
                .await?;
        } else {
            log_shutdown(shutdown_signal().await);
        }

        self.shutdown().await
    }

    /// Cancel in-flight runs, stop the scheduler and drain delivery queues.
    pub async fn shutdown(self) -> Result<()> {
        self.trigger.stop().await?;

        let Self {
            engine,
            trigger,
            counter,
            workers,
            ..
        } = self;
        // Workers exit once the last queue sender, owned by the dispatcher, is gone
        drop(trigger);
        drop(engine);
        drop(counter);

        if tokio::time::timeout(DRAIN_TIMEOUT, join_all(workers)).await.is_err() {
            warn!(after = ?DRAIN_TIMEOUT, "Delivery queues not drained before shutdown");
        }

        info!("Vigil stopped");
        Ok(())
    }
}

fn log_shutdown(signal: ShutdownSignal) {
    info!(signal = ?signal, "Shutting down");
}

/// Email and webhook notifiers behind bounded queues, routed by channel.
async fn build_notifier(config: &NotifyConfig) -> Result<(Arc<dyn Notifier>, Vec<JoinHandle<()>>)> {
    let manager = NotifyManager::new();
    let mut workers = Vec::new();

    let email: Arc<dyn Notifier> = match &config.smtp {
        Some(smtp) => Arc::new(EmailNotifier::new(smtp.clone())?),
        None => {
            info!("No SMTP server configured, email deliveries are logged only");
            Arc::new(LogNotifier)
        }
    };
    let (queued, worker) = QueuedNotifier::spawn(email, config.queue_capacity);
    manager.register(DeliveryChannel::Email, Arc::new(queued)).await;
    workers.push(worker);

    let webhook = Arc::new(WebhookNotifier::new(config.webhook.clone())?);
    let (queued, worker) = QueuedNotifier::spawn(webhook, config.queue_capacity);
    manager.register(DeliveryChannel::Webhook, Arc::new(queued)).await;
    workers.push(worker);

    Ok((Arc::new(manager), workers))
}
