use anyhow::{anyhow, Context, Result};
use config::{Config, File, FileFormat};
use std::fs;
use std::path::{Path, PathBuf};
use vigil_core::AlertConfigRecord;

use crate::{AlertsFile, GlobalConfig};

/// Reads `global.toml` and `alerts.toml` from a config directory.
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new<P: AsRef<Path>>(config_dir: P) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Defaults when `global.toml` is absent.
    pub fn load_global(&self) -> Result<GlobalConfig> {
        let config_path = self.config_dir.join("global.toml");

        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let config = Config::builder()
            .add_source(File::new(
                config_path.to_str().ok_or_else(|| anyhow!("Invalid config path"))?,
                FileFormat::Toml,
            ))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// No alerts when `alerts.toml` is absent.
    pub fn load_alerts(&self) -> Result<Vec<AlertConfigRecord>> {
        let alerts_path = self.config_dir.join("alerts.toml");

        if !alerts_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&alerts_path)
            .with_context(|| format!("Failed to read {}", alerts_path.display()))?;
        let file = AlertsFile::parse(&content)?;
        file.check_ids()?;

        Ok(file.alerts)
    }

    pub fn validate(&self) -> Result<()> {
        let global = self.load_global()?;
        global.validate()?;

        self.load_alerts()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_default_global_config() {
        let temp_dir = tempdir().unwrap();
        let loader = ConfigLoader::new(temp_dir.path());

        let config = loader.load_global().unwrap();
        assert_eq!(config.system.name, "Vigil");
        assert_eq!(config.engine.zone, "UTC");
        assert!(loader.load_alerts().unwrap().is_empty());
    }

    #[test]
    fn test_load_global_config_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_content = r#"
[engine]
zone = "Europe/Berlin"
fetch_timeout_secs = 5
suppression_window_secs = 3600

[schedule]
new_event_cron = "0 * * * * *"

[notify]
host = "https://dash.example.com"

[notify.users]
u-1 = "ops@example.com"

[logging]
format = "json"
"#;

        fs::write(temp_dir.path().join("global.toml"), config_content).unwrap();

        let loader = ConfigLoader::new(temp_dir.path());
        let config = loader.load_global().unwrap();

        assert_eq!(config.engine.parse_zone().unwrap(), chrono_tz::Europe::Berlin);
        assert_eq!(config.engine.fetch_timeout_secs, 5);
        assert_eq!(config.engine.history_limit, 1000);
        assert_eq!(config.engine.suppression_window_secs, Some(3600));
        assert_eq!(config.schedule.new_event_cron, "0 * * * * *");
        assert_eq!(config.schedule.baseline_cron, "0 0 * * * *");
        assert_eq!(config.notify.host, "https://dash.example.com");
        assert_eq!(config.notify.queue_capacity, 1024);
        assert_eq!(
            config.notify.users.get("u-1").map(String::as_str),
            Some("ops@example.com")
        );
        assert_eq!(config.logging.format, vigil_logging::LogFormat::Json);
    }

    #[test]
    fn test_load_alerts_from_file() {
        let temp_dir = tempdir().unwrap();
        fs::write(
            temp_dir.path().join("alerts.toml"),
            r#"
[[alerts]]
id = "fresh"
name = "New crashes"
mode = "new-event"
selected_apps = ["app-1"]
"#,
        )
        .unwrap();

        let alerts = ConfigLoader::new(temp_dir.path()).load_alerts().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "fresh");
        assert_eq!(alerts[0].window_secs, 300);
    }

    #[test]
    fn test_validate_config() {
        let temp_dir = tempdir().unwrap();
        let loader = ConfigLoader::new(temp_dir.path());
        assert!(loader.validate().is_ok());

        fs::write(
            temp_dir.path().join("global.toml"),
            "[engine]\nzone = \"Nowhere/Special\"\n",
        )
        .unwrap();
        assert!(loader.validate().is_err());
    }
}
