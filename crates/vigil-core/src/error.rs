use std::time::Duration;
use thiserror::Error;

/// Unified error type for the alert engine
#[derive(Error, Debug)]
pub enum VigilError {
    /// Malformed alert definition; fatal to the run
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Fetch failed for entity {entity_id}: {reason}")]
    Fetch { entity_id: String, reason: String },

    #[error("Fetch for entity {entity_id} timed out after {after:?}")]
    Timeout { entity_id: String, after: Duration },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Recipient resolution failed: {0}")]
    Recipient(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, VigilError>;

impl VigilError {
    pub fn fetch(entity_id: impl Into<String>, reason: impl ToString) -> Self {
        VigilError::Fetch {
            entity_id: entity_id.into(),
            reason: reason.to_string(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        VigilError::Configuration(message.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, VigilError::Configuration(_))
    }

    /// Errors that only disqualify a single entity from the run.
    pub fn is_entity_failure(&self) -> bool {
        matches!(self, VigilError::Fetch { .. } | VigilError::Timeout { .. })
    }
}

impl From<anyhow::Error> for VigilError {
    fn from(err: anyhow::Error) -> Self {
        VigilError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(VigilError::config("bad mode").is_configuration());
        assert!(VigilError::fetch("app", "refused").is_entity_failure());
        assert!(VigilError::Timeout {
            entity_id: "app".into(),
            after: Duration::from_secs(1)
        }
        .is_entity_failure());
        assert!(!VigilError::Cancelled.is_entity_failure());
    }

    #[test]
    fn test_display() {
        let err = VigilError::fetch("app-1", "connection refused");
        assert_eq!(err.to_string(), "Fetch failed for entity app-1: connection refused");
    }
}
