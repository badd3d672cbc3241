use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

use crate::host::{GroupColor, GroupId, Tab, TabGroup, TabId, UNGROUPED, WindowId};

/// Which of the three persistent collections a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// Saved explicitly by the user.
    #[serde(alias = "saved")]
    Manual,
    /// Captured by the timer or change detection.
    Auto,
    /// Derived from a tab or window closing.
    Closed,
}

impl SessionKind {
    /// Storage key of the collection this kind lives in.
    pub fn storage_key(&self) -> &'static str {
        match self {
            Self::Manual => "savedSessions",
            Self::Auto => "autoSavedSessions",
            Self::Closed => "closedSessions",
        }
    }

    /// Maximum number of sessions retained in the collection.
    pub fn cap(&self) -> usize {
        match self {
            Self::Manual => 20,
            Self::Auto => 50,
            Self::Closed => 20,
        }
    }

    /// Prefix of session ids created with this kind.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Manual => "session_",
            Self::Auto => "auto_",
            Self::Closed => "closed_",
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Auto => write!(f, "auto"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for SessionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" | "saved" | "session" => Ok(Self::Manual),
            "auto" | "autosaved" => Ok(Self::Auto),
            "closed" => Ok(Self::Closed),
            _ => anyhow::bail!("invalid session kind '{}' (expected: manual, auto, closed)", s),
        }
    }
}

/// A tab as stored inside a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSnapshot {
    /// The host-assigned id the tab had when captured. Only meaningful
    /// while the tab is still open; kept so closed-tab recovery can match
    /// removal notifications against recent snapshots.
    #[serde(default, deserialize_with = "lenient_optional_id")]
    pub id: Option<TabId>,
    pub url: String,
    pub title: String,
    pub index: u32,
    pub active: bool,
    pub pinned: bool,
    #[serde(default, deserialize_with = "lenient_optional_id")]
    pub group_id: Option<GroupId>,
    #[serde(default)]
    pub favicon: Option<String>,
    pub source_window_id: WindowId,
}

impl TabSnapshot {
    pub fn from_tab(tab: &Tab) -> Self {
        Self {
            id: Some(tab.id),
            url: tab.url.clone(),
            title: tab.title.clone(),
            index: tab.index,
            active: tab.active,
            pinned: tab.pinned,
            group_id: tab.group_id,
            favicon: tab.favicon.clone(),
            source_window_id: tab.window_id,
        }
    }
}

/// A tab group as stored inside a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSnapshot {
    #[serde(deserialize_with = "lenient_id")]
    pub id: GroupId,
    pub title: String,
    pub color: GroupColor,
    pub collapsed: bool,
    pub source_window_id: WindowId,
}

impl GroupSnapshot {
    pub fn from_group(group: &TabGroup) -> Self {
        Self {
            id: group.id,
            title: group.title.clone(),
            color: group.color,
            collapsed: group.collapsed,
            source_window_id: group.window_id,
        }
    }
}

/// A named, timestamped snapshot of tab/group state across one or more
/// windows. Immutable once stored, except for rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub name: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    #[serde(default)]
    pub tabs: Vec<TabSnapshot>,
    #[serde(default)]
    pub groups: Vec<GroupSnapshot>,
    pub tab_count: usize,
    pub group_count: usize,
    #[serde(default)]
    pub window_count: usize,
    #[serde(default)]
    pub is_auto_saved: bool,
    #[serde(default)]
    pub is_closed_session: bool,
    #[serde(default)]
    pub save_all_windows: bool,
}

impl SessionRecord {
    /// Build a record from captured snapshots. The tab/group counts are
    /// derived from the vectors and stay equal to their lengths.
    pub fn new(
        kind: SessionKind,
        name: impl Into<String>,
        tabs: Vec<TabSnapshot>,
        groups: Vec<GroupSnapshot>,
        window_count: usize,
        save_all_windows: bool,
    ) -> Self {
        let created_at = unique_epoch_ms();
        Self {
            id: format!("{}{}", kind.id_prefix(), created_at),
            name: name.into(),
            created_at,
            tab_count: tabs.len(),
            group_count: groups.len(),
            tabs,
            groups,
            window_count,
            is_auto_saved: kind == SessionKind::Auto,
            is_closed_session: kind == SessionKind::Closed,
            save_all_windows,
        }
    }

    pub fn kind(&self) -> SessionKind {
        if self.is_closed_session {
            SessionKind::Closed
        } else if self.is_auto_saved {
            SessionKind::Auto
        } else {
            SessionKind::Manual
        }
    }
}

/// Timestamps double as id suffixes, so two records created inside the
/// same millisecond must still get distinct values.
fn unique_epoch_ms() -> i64 {
    static LAST: AtomicI64 = AtomicI64::new(0);

    let now = Utc::now().timestamp_millis();
    loop {
        let prev = LAST.load(Ordering::SeqCst);
        let next = if now > prev { now } else { prev + 1 };
        if LAST
            .compare_exchange(prev, next, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            return next;
        }
    }
}

/// Ids written by earlier versions of the extension arrive as numbers or
/// numeric strings, and ungrouped tabs as either `null` or `-1`. All of
/// them normalize to `Option<i64>` here, at the storage boundary, so the
/// rest of the engine compares ids with plain equality.
fn lenient_optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Num(i64),
        Text(String),
    }

    let raw = Option::<IdRepr>::deserialize(deserializer)?;
    let id = match raw {
        None => None,
        Some(IdRepr::Num(n)) => Some(n),
        Some(IdRepr::Text(s)) => Some(
            s.parse::<i64>()
                .map_err(|_| serde::de::Error::custom(format!("invalid id '{}'", s)))?,
        ),
    };
    Ok(id.filter(|&n| n != UNGROUPED))
}

pub(crate) fn lenient_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_optional_id(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("missing required id"))
}
