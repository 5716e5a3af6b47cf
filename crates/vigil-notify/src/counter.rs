use dashmap::DashMap;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::atomic::{AtomicU64, Ordering};
use vigil_types::Recipient;

/// Usage accounting for alert firings and deliveries.
///
/// One increment per fired alert plus one per successful delivery.
pub trait AlertCounter: Send + Sync {
    fn record_firing(&self, alert_id: &str);

    fn record_delivery(&self, recipient: &Recipient);

    fn record_failure(&self, _recipient: &Recipient) {}
}

/// Process-local counters, mostly for tests and the `--once` mode.
#[derive(Debug, Default)]
pub struct InMemoryAlertCounter {
    firings: AtomicU64,
    deliveries: AtomicU64,
    failures: AtomicU64,
    per_recipient: DashMap<Recipient, u64>,
}

impl InMemoryAlertCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn firings(&self) -> u64 {
        self.firings.load(Ordering::Relaxed)
    }

    pub fn deliveries(&self) -> u64 {
        self.deliveries.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Total increments: firings plus deliveries.
    pub fn total(&self) -> u64 {
        self.firings() + self.deliveries()
    }

    pub fn deliveries_to(&self, recipient: &Recipient) -> u64 {
        self.per_recipient.get(recipient).map(|c| *c).unwrap_or(0)
    }
}

impl AlertCounter for InMemoryAlertCounter {
    fn record_firing(&self, _alert_id: &str) {
        self.firings.fetch_add(1, Ordering::Relaxed);
    }

    fn record_delivery(&self, recipient: &Recipient) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
        *self.per_recipient.entry(recipient.clone()).or_insert(0) += 1;
    }

    fn record_failure(&self, _recipient: &Recipient) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// Exposes the same accounting as Prometheus counters.
pub struct PrometheusAlertCounter {
    alerts_fired_total: IntCounterVec,
    deliveries_total: IntCounterVec,
    delivery_failures_total: IntCounterVec,
    registry: Registry,
}

impl PrometheusAlertCounter {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let alerts_fired_total = IntCounterVec::new(
            Opts::new("vigil_alerts_fired_total", "Total number of fired alerts"),
            &["alert"],
        )?;
        registry.register(Box::new(alerts_fired_total.clone()))?;

        let deliveries_total = IntCounterVec::new(
            Opts::new("vigil_deliveries_total", "Total number of successful deliveries"),
            &["channel"],
        )?;
        registry.register(Box::new(deliveries_total.clone()))?;

        let delivery_failures_total = IntCounterVec::new(
            Opts::new("vigil_delivery_failures_total", "Total number of failed deliveries"),
            &["channel"],
        )?;
        registry.register(Box::new(delivery_failures_total.clone()))?;

        Ok(Self {
            alerts_fired_total,
            deliveries_total,
            delivery_failures_total,
            registry,
        })
    }

    /// Text exposition format for `/metrics`.
    pub fn gather_text(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl AlertCounter for PrometheusAlertCounter {
    fn record_firing(&self, alert_id: &str) {
        self.alerts_fired_total.with_label_values(&[alert_id]).inc();
    }

    fn record_delivery(&self, recipient: &Recipient) {
        self.deliveries_total
            .with_label_values(&[recipient.channel.as_str()])
            .inc();
    }

    fn record_failure(&self, recipient: &Recipient) {
        self.delivery_failures_total
            .with_label_values(&[recipient.channel.as_str()])
            .inc();
    }
}
