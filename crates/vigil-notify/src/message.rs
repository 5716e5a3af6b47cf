use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use vigil_core::{AlertConfig, AlertMode};
use vigil_types::{EvaluationResult, FiredAlert};

/// Above this many matches the subject stops naming entities.
pub const MAX_LISTED_ENTITIES: usize = 3;

/// Payload lines quoted per event.
pub const PAYLOAD_PREVIEW_LINES: usize = 4;

const SEVERAL_APPS: &str = "several apps";

/// One subject/body pair summarizing a fired alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub alert_id: String,
    pub alert_name: String,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Builds the single message sent to every recipient of a fired alert.
#[derive(Debug, Clone)]
pub struct MessageComposer {
    host: String,
    heading: String,
}

impl MessageComposer {
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            host: host.trim_end_matches('/').to_string(),
            heading: "Vigil Alert".to_string(),
        }
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = heading.into();
        self
    }

    pub fn compose(&self, config: &AlertConfig, fired: &FiredAlert) -> AlertMessage {
        AlertMessage {
            alert_id: config.id.clone(),
            alert_name: config.name.clone(),
            subject: self.subject(config, fired),
            body: self.body(config, fired),
            created_at: fired.fired_at,
        }
    }

    pub fn subject(&self, config: &AlertConfig, fired: &FiredAlert) -> String {
        let apps = apps_title(fired);
        match &config.mode {
            AlertMode::BaselineCompare(spec) => {
                format!("{} for {} has changed compared to yesterday", spec.label, apps)
            }
            AlertMode::NewEvent(spec) => format!("Received new {} for {}", spec.label, apps),
        }
    }

    pub fn body(&self, config: &AlertConfig, fired: &FiredAlert) -> String {
        let mut body = String::new();
        let _ = writeln!(body, "{}: {}", self.heading, config.name);
        if let Some(describe) = config.compare_describe.as_deref().filter(|d| !d.is_empty()) {
            let _ = writeln!(body, "{}", describe);
        }

        let route = match &config.mode {
            AlertMode::NewEvent(spec) => spec.route.as_str(),
            AlertMode::BaselineCompare(_) => "",
        };

        for result in &fired.results {
            body.push('\n');
            self.write_entity(&mut body, result, route);
        }

        body
    }

    fn write_entity(&self, body: &mut String, result: &EvaluationResult, route: &str) {
        let _ = writeln!(body, "{} ({})", result.display_name(), result.entity_id);

        if let Some(today) = result.today_value {
            let _ = writeln!(body, "  Today's Value: {}", format_value(today));
        }
        if let Some(yesterday) = result.baseline_value {
            let _ = writeln!(body, "  Yesterday's Value: {}", format_value(yesterday));
        }

        for event in &result.events {
            for line in event.payload_head(PAYLOAD_PREVIEW_LINES) {
                let _ = writeln!(body, "  {}", line);
            }
            let _ = writeln!(
                body,
                "  Click to view details: {}",
                self.deep_link(&result.entity_id, route, &event.id)
            );
        }
    }

    pub fn deep_link(&self, entity_id: &str, route: &str, event_id: &str) -> String {
        format!("{}/dashboard#/{}/{}/{}", self.host, entity_id, route, event_id)
    }
}

/// Comma-joined entity names, or a generic phrase when there are too many.
pub fn apps_title(fired: &FiredAlert) -> String {
    if fired.match_count() > MAX_LISTED_ENTITIES {
        return SEVERAL_APPS.to_string();
    }

    fired
        .results
        .iter()
        .map(|r| r.display_name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_value(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}
