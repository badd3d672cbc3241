//! Request/response surface for UI and CLI collaborators.
//!
//! Requests are tagged JSON objects (`{"action": "...", ...}`); every
//! response carries a `success` flag plus an action-specific payload or
//! an error message. Handlers never propagate errors past this boundary.

use serde::{Deserialize, Serialize};

use crate::config::AutoSaveTrigger;
use crate::host::GroupId;
use crate::session::SessionRecord;

fn default_true() -> bool {
    true
}

/// An incoming request from a UI or CLI collaborator.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    ToggleAutoSave { enabled: bool },
    #[serde(rename_all = "camelCase")]
    UpdateAutoSaveSettings {
        #[serde(default)]
        trigger: Option<AutoSaveTrigger>,
        #[serde(default)]
        interval: Option<u64>,
        #[serde(default)]
        detect_tab_close: Option<bool>,
        #[serde(default)]
        detect_tab_create: Option<bool>,
        #[serde(default)]
        detect_url_change: Option<bool>,
    },
    #[serde(rename_all = "camelCase")]
    SaveSession { session_name: String },
    #[serde(rename_all = "camelCase")]
    RestoreSession {
        session_id: String,
        #[serde(default = "default_true")]
        open_in_new_window: bool,
    },
    #[serde(rename_all = "camelCase")]
    RestoreGroup {
        session_id: String,
        // Ids arrive as numbers or numeric strings depending on the
        // transport; normalize here like the storage boundary does.
        #[serde(deserialize_with = "crate::session::lenient_id")]
        group_id: GroupId,
        #[serde(default = "default_true")]
        open_in_new_window: bool,
    },
    GetSavedSessions,
    #[serde(rename_all = "camelCase")]
    DeleteSession {
        session_id: String,
        #[serde(rename = "type")]
        kind: String,
    },
    #[serde(rename_all = "camelCase")]
    ClearAllSessions {
        #[serde(rename = "type")]
        kind: String,
    },
    #[serde(rename_all = "camelCase")]
    RenameSession {
        session_id: String,
        new_name: String,
    },
    TriggerTabSorting,
}

/// The reply to a [`Request`]. Serializes as a flat object with a
/// `success` flag and whatever payload the action produced.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Response {
    Ack {
        success: bool,
    },
    Failure {
        success: bool,
        error: String,
    },
    #[serde(rename_all = "camelCase")]
    Saved {
        success: bool,
        session_id: String,
    },
    Sessions {
        success: bool,
        sessions: Vec<SessionRecord>,
    },
    #[serde(rename_all = "camelCase")]
    Restored {
        success: bool,
        tab_count: usize,
    },
    #[serde(rename_all = "camelCase")]
    GroupRestored {
        success: bool,
        tab_count: usize,
        group_title: Option<String>,
    },
}

impl Response {
    pub fn ok() -> Self {
        Response::Ack { success: true }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Response::Failure {
            success: false,
            error: error.into(),
        }
    }

    pub fn saved(session_id: impl Into<String>) -> Self {
        Response::Saved {
            success: true,
            session_id: session_id.into(),
        }
    }

    pub fn sessions(sessions: Vec<SessionRecord>) -> Self {
        Response::Sessions {
            success: true,
            sessions,
        }
    }

    pub fn restored(tab_count: usize) -> Self {
        Response::Restored {
            success: true,
            tab_count,
        }
    }

    pub fn group_restored(tab_count: usize, group_title: Option<String>) -> Self {
        Response::GroupRestored {
            success: true,
            tab_count,
            group_title,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Response::Failure { .. })
    }
}
