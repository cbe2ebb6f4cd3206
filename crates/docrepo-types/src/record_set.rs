//! Lightweight query result: identifiers only.

use serde::{Deserialize, Serialize};

/// Ordered list of document uids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    #[serde(default)]
    pub uuids: Vec<String>,
}

impl RecordSet {
    pub fn uuids(&self) -> &[String] {
        &self.uuids
    }

    pub fn len(&self) -> usize {
        self.uuids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uuids.is_empty()
    }
}
