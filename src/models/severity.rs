use serde::{Deserialize, Serialize};

/// A named logging level (e.g. "Error") referenced by log entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Severity {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl Severity {
    /// Build an unsaved severity; the store assigns the id on creation
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Severity as returned by the HTTP API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl From<Severity> for SeverityRecord {
    fn from(severity: Severity) -> Self {
        Self {
            id: severity.id,
            name: severity.name,
            description: severity.description,
        }
    }
}
