use thiserror::Error;

use crate::host::GroupId;

/// Failures that are surfaced to callers of the message surface as
/// `{success: false, error}` responses. Transient host-API errors are not
/// listed here; those are caught and logged at the smallest enclosing
/// operation and the surrounding batch continues.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("group {group_id} not found in session {session_id}")]
    GroupNotFound {
        session_id: String,
        group_id: GroupId,
    },

    #[error("no tabs found in group \"{0}\"")]
    NoTabsInGroup(String),

    #[error("no tabs could be created")]
    NothingRestored,

    #[error("failed to create new window")]
    WindowCreation,

    #[error("no active window found")]
    NoActiveWindow,
}
