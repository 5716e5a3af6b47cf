use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vigil_notify::DeliveryReport;

/// Record of one scheduler-invoked run. Every run produces exactly one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertExecution {
    pub id: String,
    pub alert_id: String,
    pub alert_name: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: ExecutionStatus,
    /// Matched entity count, when the run got as far as aggregation
    pub matched: usize,
    pub delivery: Option<DeliveryReport>,
    pub error: Option<String>,
}

/// Run outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// At least one entity matched and dispatch ran
    Fired,
    /// Completed with zero matches
    Quiet,
    /// Fired recently, inside the suppression window
    Suppressed,
    Disabled,
    /// Configuration error or missing alert
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Fired => "fired",
            ExecutionStatus::Quiet => "quiet",
            ExecutionStatus::Suppressed => "suppressed",
            ExecutionStatus::Disabled => "disabled",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Cancelled => "cancelled",
        }
    }
}
