use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use vigil_logging::LoggingConfig;
use vigil_notify::{EmailConfig, WebhookConfig};

/// Global configuration, read from `global.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    pub name: String,
    pub version: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            name: "Vigil".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Evaluation engine settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// IANA zone used for "today" and as the fallback entity zone
    pub zone: String,
    pub fetch_timeout_secs: u64,
    pub history_limit: usize,
    /// Unset: every scheduled run may fire
    pub suppression_window_secs: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            zone: "UTC".to_string(),
            fetch_timeout_secs: 10,
            history_limit: 1000,
            suppression_window_secs: None,
        }
    }
}

impl EngineConfig {
    pub fn parse_zone(&self) -> Result<Tz> {
        self.zone
            .parse::<Tz>()
            .map_err(|e| anyhow!("Unknown time zone '{}': {}", self.zone, e))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn suppression_window(&self) -> Option<Duration> {
        self.suppression_window_secs.map(Duration::from_secs)
    }
}

/// Cron expressions, six fields with seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub baseline_cron: String,
    pub new_event_cron: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            baseline_cron: "0 0 * * * *".to_string(),
            new_event_cron: "0 */5 * * * *".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Dashboard base URL used in deep links
    pub host: String,
    pub queue_capacity: usize,
    /// Email goes to the log when unset
    pub smtp: Option<EmailConfig>,
    pub webhook: WebhookConfig,
    /// User id to email address
    pub users: HashMap<String, String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".to_string(),
            queue_capacity: 1024,
            smtp: None,
            webhook: WebhookConfig::default(),
            users: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DataConfig {
    /// JSON snapshot loaded into the in-memory data source
    pub snapshot: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub bind: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "127.0.0.1:9464".to_string(),
        }
    }
}

impl GlobalConfig {
    pub fn validate(&self) -> Result<()> {
        self.engine.parse_zone()?;

        if self.engine.fetch_timeout_secs == 0 {
            return Err(anyhow!("engine.fetch_timeout_secs must be greater than 0"));
        }

        if self.engine.history_limit == 0 {
            return Err(anyhow!("engine.history_limit must be greater than 0"));
        }

        if self.schedule.baseline_cron.trim().is_empty() {
            return Err(anyhow!("schedule.baseline_cron cannot be empty"));
        }

        if self.schedule.new_event_cron.trim().is_empty() {
            return Err(anyhow!("schedule.new_event_cron cannot be empty"));
        }

        if self.notify.queue_capacity == 0 {
            return Err(anyhow!("notify.queue_capacity must be greater than 0"));
        }

        Ok(())
    }
}
