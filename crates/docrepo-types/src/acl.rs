//! Access control policy of a document.

use serde::{Deserialize, Serialize};

/// Access control entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub username: String,

    pub permission: String,

    #[serde(default = "granted_by_default")]
    pub granted: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

fn granted_by_default() -> bool {
    true
}

/// Named, ordered list of entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acl {
    pub name: String,

    #[serde(rename = "ace", default)]
    pub aces: Vec<Ace>,
}

/// Ordered list of ACLs, local first, inherited last
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acp {
    #[serde(rename = "acl", default)]
    pub acls: Vec<Acl>,
}

impl Acp {
    pub fn acls(&self) -> &[Acl] {
        &self.acls
    }

    /// Find an ACL by name
    pub fn acl(&self, name: &str) -> Option<&Acl> {
        self.acls.iter().find(|acl| acl.name == name)
    }
}
