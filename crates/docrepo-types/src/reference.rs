//! Document references used as operation input.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference to a single document, by uid or absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocRef(pub String);

impl DocRef {
    pub fn new(reference: impl Into<String>) -> Self {
        DocRef(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wire form of an operation input: `doc:<ref>`
    pub fn to_input(&self) -> String {
        format!("doc:{}", self.0)
    }
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DocRef {
    fn from(reference: &str) -> Self {
        DocRef::new(reference)
    }
}

impl From<String> for DocRef {
    fn from(reference: String) -> Self {
        DocRef(reference)
    }
}

/// Ordered list of document references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocRefs(pub Vec<DocRef>);

impl DocRefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_doc(&mut self, reference: impl Into<DocRef>) {
        self.0.push(reference.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wire form of an operation input: `docs:<ref>,<ref>,...`
    pub fn to_input(&self) -> String {
        let joined = self
            .0
            .iter()
            .map(DocRef::as_str)
            .collect::<Vec<_>>()
            .join(",");
        format!("docs:{}", joined)
    }
}

impl FromIterator<DocRef> for DocRefs {
    fn from_iter<I: IntoIterator<Item = DocRef>>(iter: I) -> Self {
        DocRefs(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_forms() {
        assert_eq!(DocRef::from("/folder_2/file").to_input(), "doc:/folder_2/file");

        let mut refs = DocRefs::new();
        refs.add_doc("a");
        refs.add_doc(DocRef::new("b"));
        assert_eq!(refs.to_input(), "docs:a,b");
        assert_eq!(DocRefs::new().to_input(), "docs:");
    }
}
