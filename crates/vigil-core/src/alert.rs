use crate::error::VigilError;
use serde::{Deserialize, Serialize};
use vigil_types::{DeliveryChannel, PeriodSpec};

pub const MODE_BASELINE_COMPARE: &str = "baseline-compare";
pub const MODE_NEW_EVENT: &str = "new-event";

/// Local hour at which baseline comparisons run for an entity
pub const DEFAULT_TRIGGER_HOUR: u32 = 23;

/// Trailing window for new-event detection (seconds)
pub const DEFAULT_EVENT_WINDOW_SECS: i64 = 300;

pub const DEFAULT_EVENT_LIMIT: usize = 50;

// ============================================================================
// Authored form
// ============================================================================

/// Threshold as authored; dashboards often store it as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThresholdValue {
    Number(f64),
    Text(String),
}

impl ThresholdValue {
    pub fn parse(&self) -> Option<f64> {
        let value = match self {
            ThresholdValue::Number(n) => *n,
            ThresholdValue::Text(s) => s.trim().trim_end_matches('%').trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// An alert definition exactly as stored or authored. Loosely typed; see [`AlertConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfigRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub data_type: String,
    /// Human-readable subtype label, e.g. "Total crashes"
    #[serde(default)]
    pub sub_type: String,
    pub mode: String,
    #[serde(default)]
    pub compare_type: Option<String>,
    #[serde(default)]
    pub compare_value: Option<ThresholdValue>,
    #[serde(default)]
    pub compare_describe: Option<String>,
    #[serde(default)]
    pub selected_apps: Vec<String>,
    #[serde(default = "default_alert_by")]
    pub alert_by: String,
    #[serde(default)]
    pub alert_values: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,

    // baseline-compare parameters
    #[serde(default = "default_metric")]
    pub metric: String,
    #[serde(default = "default_metric_field")]
    pub metric_field: String,
    #[serde(default = "default_metric_label")]
    pub metric_label: String,
    #[serde(default = "default_period_days")]
    pub period_days: u32,
    #[serde(default = "default_trigger_hour")]
    pub trigger_hour: u32,

    // new-event parameters
    #[serde(default = "default_feed")]
    pub feed: String,
    #[serde(default = "default_feed_route")]
    pub feed_route: String,
    #[serde(default = "default_event_label")]
    pub event_label: String,
    #[serde(default = "default_window_secs")]
    pub window_secs: i64,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_alert_by() -> String {
    "email".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metric() -> String {
    "crashdata".to_string()
}

fn default_metric_field() -> String {
    "cr".to_string()
}

fn default_metric_label() -> String {
    "Crash count".to_string()
}

fn default_period_days() -> u32 {
    PeriodSpec::default().days
}

fn default_trigger_hour() -> u32 {
    DEFAULT_TRIGGER_HOUR
}

fn default_feed() -> String {
    "crashgroups".to_string()
}

fn default_feed_route() -> String {
    "crashes".to_string()
}

fn default_event_label() -> String {
    "crashes".to_string()
}

fn default_window_secs() -> i64 {
    DEFAULT_EVENT_WINDOW_SECS
}

fn default_limit() -> usize {
    DEFAULT_EVENT_LIMIT
}

impl AlertConfigRecord {
    /// Minimal record with every optional parameter at its default.
    pub fn new(id: impl Into<String>, name: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            data_type: String::new(),
            sub_type: String::new(),
            mode: mode.into(),
            compare_type: None,
            compare_value: None,
            compare_describe: None,
            selected_apps: Vec::new(),
            alert_by: default_alert_by(),
            alert_values: Vec::new(),
            enabled: true,
            metric: default_metric(),
            metric_field: default_metric_field(),
            metric_label: default_metric_label(),
            period_days: default_period_days(),
            trigger_hour: default_trigger_hour(),
            feed: default_feed(),
            feed_route: default_feed_route(),
            event_label: default_event_label(),
            window_secs: default_window_secs(),
            limit: default_limit(),
        }
    }
}

// ============================================================================
// Validated form
// ============================================================================

/// Comparison direction for baseline-compare alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increased,
    Decreased,
}

impl Direction {
    /// Reads the direction out of phrases like "increased by at least".
    pub fn parse(compare_type: &str) -> Option<Self> {
        let lowered = compare_type.to_ascii_lowercase();
        if lowered.contains("increase") {
            Some(Direction::Increased)
        } else if lowered.contains("decrease") {
            Some(Direction::Decreased)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSpec {
    pub metric: String,
    pub field: String,
    pub label: String,
    pub period: PeriodSpec,
    pub direction: Direction,
    /// Percent
    pub threshold: f64,
    pub trigger_hour: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEventSpec {
    pub feed: String,
    /// Dashboard route segment used in deep links
    pub route: String,
    pub label: String,
    pub window_secs: i64,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertMode {
    BaselineCompare(BaselineSpec),
    NewEvent(NewEventSpec),
}

impl AlertMode {
    pub fn name(&self) -> &'static str {
        match self {
            AlertMode::BaselineCompare(_) => MODE_BASELINE_COMPARE,
            AlertMode::NewEvent(_) => MODE_NEW_EVENT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientSelector {
    pub channel: DeliveryChannel,
    pub values: Vec<String>,
}

/// A validated, immutable alert definition for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    pub id: String,
    pub name: String,
    pub sub_type: String,
    pub compare_describe: Option<String>,
    pub mode: AlertMode,
    /// Monitored entity ids, in evaluation order
    pub entities: Vec<String>,
    pub recipients: RecipientSelector,
    pub enabled: bool,
}

impl TryFrom<AlertConfigRecord> for AlertConfig {
    type Error = VigilError;

    fn try_from(record: AlertConfigRecord) -> Result<Self, Self::Error> {
        let id = record.id.clone();
        let fail = |reason: String| VigilError::config(format!("alert {}: {}", id, reason));

        if record.name.trim().is_empty() {
            return Err(fail("name must not be empty".to_string()));
        }

        let mode = match record.mode.as_str() {
            MODE_BASELINE_COMPARE => {
                let threshold = record
                    .compare_value
                    .as_ref()
                    .ok_or_else(|| fail("baseline-compare requires compare_value".to_string()))?
                    .parse()
                    .ok_or_else(|| fail(format!("invalid compare_value {:?}", record.compare_value)))?;

                let direction = record
                    .compare_type
                    .as_deref()
                    .and_then(Direction::parse)
                    .ok_or_else(|| fail(format!("invalid compare_type {:?}", record.compare_type)))?;

                if record.trigger_hour > 23 {
                    return Err(fail(format!("trigger_hour {} out of range", record.trigger_hour)));
                }

                AlertMode::BaselineCompare(BaselineSpec {
                    metric: record.metric,
                    field: record.metric_field,
                    label: record.metric_label,
                    period: PeriodSpec::last_days(record.period_days.max(2)),
                    direction,
                    threshold,
                    trigger_hour: record.trigger_hour,
                })
            }
            MODE_NEW_EVENT => {
                if record.window_secs <= 0 {
                    return Err(fail(format!("window_secs must be positive, got {}", record.window_secs)));
                }
                if record.limit == 0 {
                    return Err(fail("limit must be greater than 0".to_string()));
                }

                AlertMode::NewEvent(NewEventSpec {
                    feed: record.feed,
                    route: record.feed_route,
                    label: record.event_label,
                    window_secs: record.window_secs,
                    limit: record.limit,
                })
            }
            other => return Err(fail(format!("unknown mode '{}'", other))),
        };

        let channel = match record.alert_by.as_str() {
            "email" => DeliveryChannel::Email,
            "http" | "webhook" => DeliveryChannel::Webhook,
            other => return Err(fail(format!("unknown alert_by '{}'", other))),
        };

        Ok(AlertConfig {
            id: record.id,
            name: record.name,
            sub_type: record.sub_type,
            compare_describe: record.compare_describe,
            mode,
            entities: record.selected_apps,
            recipients: RecipientSelector {
                channel,
                values: record.alert_values,
            },
            enabled: record.enabled,
        })
    }
}
