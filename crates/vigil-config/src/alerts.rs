use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use vigil_core::AlertConfigRecord;

/// `alerts.toml`: a `[[alerts]]` array of authored alert records.
///
/// Records are kept in their raw form; each run validates its own record so
/// one broken alert never stops the others from loading.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AlertsFile {
    #[serde(default)]
    pub alerts: Vec<AlertConfigRecord>,
}

impl AlertsFile {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse alerts file")
    }

    /// Alert ids must be unique and non-empty.
    pub fn check_ids(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for record in &self.alerts {
            if record.id.trim().is_empty() {
                return Err(anyhow!("Alert '{}' has an empty id", record.name));
            }
            if !seen.insert(record.id.as_str()) {
                return Err(anyhow!("Duplicate alert id '{}'", record.id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_alerts() {
        let file = AlertsFile::parse(
            r#"
[[alerts]]
id = "spike"
name = "Crash spike"
mode = "baseline-compare"
compare_type = "increased by at least"
compare_value = "20%"
selected_apps = ["app-1", "app-2"]
alert_values = ["u-1"]

[[alerts]]
id = "fresh"
name = "New crashes"
mode = "new-event"
alert_by = "http"
alert_values = ["https://hooks.example.com/vigil"]
enabled = false
"#,
        )
        .unwrap();

        assert_eq!(file.alerts.len(), 2);
        assert_eq!(file.alerts[0].selected_apps, vec!["app-1", "app-2"]);
        assert!(file.alerts[0].enabled);
        assert_eq!(file.alerts[1].alert_by, "http");
        assert!(!file.alerts[1].enabled);
        assert!(file.check_ids().is_ok());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let file = AlertsFile {
            alerts: vec![
                AlertConfigRecord::new("a", "One", "new-event"),
                AlertConfigRecord::new("a", "Two", "new-event"),
            ],
        };
        assert!(file.check_ids().is_err());
    }

    #[test]
    fn test_empty_file() {
        let file = AlertsFile::parse("").unwrap();
        assert!(file.alerts.is_empty());
    }
}
