use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A timestamped message tagged with a severity
///
/// `severity_id` is `None` once the referenced severity has been deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct Log {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub severity_id: Option<i64>,
}

impl Log {
    /// Build an unsaved entry stamped with the current UTC time
    ///
    /// The id stays nil until the store generates one.
    pub fn new(message: impl Into<String>, severity_id: i64) -> Self {
        Self {
            id: Uuid::nil(),
            timestamp: Utc::now(),
            message: message.into(),
            severity_id: Some(severity_id),
        }
    }
}

/// Log entry as returned by the HTTP API, enriched with the severity name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub severity_name: Option<String>,
}

impl LogRecord {
    pub fn from_log(log: Log, severity_name: Option<String>) -> Self {
        Self {
            id: log.id,
            timestamp: log.timestamp,
            message: log.message,
            severity_name,
        }
    }
}
