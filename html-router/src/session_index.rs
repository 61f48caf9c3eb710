use common::session::{DocumentId, SessionIndex};

use crate::SessionType;

const SESSION_INDEX_KEY: &str = "session_index";

/// The session's document index, empty for a fresh browser session.
pub fn load_index(session: &SessionType) -> SessionIndex {
    session
        .get::<SessionIndex>(SESSION_INDEX_KEY)
        .unwrap_or_default()
}

/// Write the index back; must be called after every mutation or the next
/// request sees the old state.
pub fn store_index(session: &SessionType, index: &SessionIndex) {
    session.set(SESSION_INDEX_KEY, index);
}

/// Display names for the indexed-documents panel, oldest first.
pub fn document_names(index: &SessionIndex) -> Vec<&str> {
    index
        .documents()
        .iter()
        .map(DocumentId::display_name)
        .collect()
}
