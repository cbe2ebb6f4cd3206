//! Audit log of a document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub event_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_uuid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_life_cycle: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<DateTime<Utc>>,
}

/// Ordered audit entries, newest first as the server sends them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    #[serde(default)]
    pub entries: Vec<LogEntry>,
}

impl Audit {
    pub fn log_entries(&self) -> &[LogEntry] {
        &self.entries
    }
}
