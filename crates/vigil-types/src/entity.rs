use serde::{Deserialize, Serialize};

/// Resolved metadata for one monitored entity ("app").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityInfo {
    pub id: String,
    pub name: String,
    /// IANA zone name, e.g. `Europe/Berlin`
    #[serde(default)]
    pub timezone: Option<String>,
}

impl EntityInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            timezone: None,
        }
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }
}
