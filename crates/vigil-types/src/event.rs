use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A discrete occurrence reported by the event feed (e.g. a crash group).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub entity_id: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub is_new: bool,
    /// Free text, typically a multi-line stack trace
    pub payload: String,
    /// Number of users affected
    #[serde(default)]
    pub affected: u64,
}

impl EventRecord {
    pub fn new(
        id: impl Into<String>,
        entity_id: impl Into<String>,
        first_seen: DateTime<Utc>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            entity_id: entity_id.into(),
            first_seen,
            last_seen: first_seen,
            is_new: true,
            payload: payload.into(),
            affected: 0,
        }
    }

    pub fn with_last_seen(mut self, last_seen: DateTime<Utc>) -> Self {
        self.last_seen = last_seen;
        self
    }

    pub fn with_new(mut self, is_new: bool) -> Self {
        self.is_new = is_new;
        self
    }

    /// The first `max` lines of the payload.
    pub fn payload_head(&self, max: usize) -> Vec<&str> {
        self.payload.lines().take(max).collect()
    }
}
