use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a stored document: its location under the document root.
///
/// Derived deterministically from the uploaded file name, so re-uploading the
/// same file yields the same identity for the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment of the location, used wherever the operator sees the
    /// document referenced by name.
    pub fn display_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered record of the documents successfully indexed during one
/// interactive session.
///
/// Membership doubles as the idempotence guard: an identity that is already
/// present must not trigger indexing again. `add` is the only mutator; there
/// is no removal, the record is discarded with the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIndex {
    documents: Vec<DocumentId>,
}

impl SessionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the identity has already been indexed this session.
    pub fn contains(&self, id: &DocumentId) -> bool {
        self.documents.contains(id)
    }

    /// Appends the identity unless it is already present.
    ///
    /// Returns `true` when the identity was newly recorded, `false` when the
    /// call was a no-op. Insertion order is upload order and is preserved.
    pub fn add(&mut self, id: DocumentId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.documents.push(id);
        true
    }

    /// The indexed identities, oldest first.
    pub fn documents(&self) -> &[DocumentId] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(location: &str) -> DocumentId {
        DocumentId::new(location)
    }

    #[test]
    fn starts_empty() {
        let index = SessionIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert!(index.documents().is_empty());
    }

    #[test]
    fn add_preserves_insertion_order() {
        let mut index = SessionIndex::new();
        assert!(index.add(id("documents/a.pdf")));
        assert!(index.add(id("documents/b.pdf")));
        assert!(index.add(id("documents/c.pdf")));

        let listed: Vec<&str> = index.documents().iter().map(DocumentId::as_str).collect();
        assert_eq!(
            listed,
            vec!["documents/a.pdf", "documents/b.pdf", "documents/c.pdf"]
        );
    }

    #[test]
    fn add_is_idempotent() {
        let mut index = SessionIndex::new();
        assert!(index.add(id("documents/a.pdf")));
        assert!(!index.add(id("documents/a.pdf")));

        assert_eq!(index.len(), 1);
        assert!(index.contains(&id("documents/a.pdf")));
    }

    #[test]
    fn duplicate_add_keeps_original_position() {
        let mut index = SessionIndex::new();
        index.add(id("documents/a.pdf"));
        index.add(id("documents/b.pdf"));
        index.add(id("documents/a.pdf"));

        let listed: Vec<&str> = index.documents().iter().map(DocumentId::as_str).collect();
        assert_eq!(listed, vec!["documents/a.pdf", "documents/b.pdf"]);
    }

    #[test]
    fn display_name_is_last_segment() {
        assert_eq!(id("documents/report.pdf").display_name(), "report.pdf");
        assert_eq!(id("report.pdf").display_name(), "report.pdf");
    }

    #[test]
    fn survives_serde_round_trip() {
        let mut index = SessionIndex::new();
        index.add(id("documents/a.pdf"));
        index.add(id("documents/b.pdf"));

        let json = serde_json::to_string(&index).expect("serialize");
        let restored: SessionIndex = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, index);
    }
}
