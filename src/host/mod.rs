//! Boundary traits for the host browser.
//!
//! Everything the engine does to live browser state goes through
//! [`HostBrowser`]; favicon-based color lookup goes through
//! [`FaviconColorSource`]. Both are object-safe so tests and alternative
//! front ends can substitute their own implementations.

mod types;

use anyhow::Result;
use async_trait::async_trait;

pub use types::{GroupColor, GroupId, GroupUpdate, Tab, TabGroup, TabId, UNGROUPED, WindowId};

/// URL schemes the host reserves for itself. Tabs with these URLs cannot
/// be recreated by the engine and are never cached.
const PRIVILEGED_SCHEMES: &[&str] = &["chrome://", "chrome-extension://", "edge://", "about:"];

/// Returns true for URLs the host will refuse to open on our behalf.
pub fn is_privileged_url(url: &str) -> bool {
    PRIVILEGED_SCHEMES
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

/// Access to the host browser's tab, group, and window state.
///
/// Every call is a suspension point and may fail transiently (the target
/// tab or window can disappear between a query and the follow-up call);
/// callers are expected to treat single-operation failures as no-ops.
#[async_trait]
pub trait HostBrowser: Send + Sync {
    /// All window ids currently open.
    async fn windows(&self) -> Result<Vec<WindowId>>;

    /// The last focused window, if any.
    async fn focused_window(&self) -> Result<Option<WindowId>>;

    /// Tabs in one window, ordered by index.
    async fn tabs_in_window(&self, window: WindowId) -> Result<Vec<Tab>>;

    /// Tabs across all windows.
    async fn all_tabs(&self) -> Result<Vec<Tab>>;

    /// Groups in one window.
    async fn groups_in_window(&self, window: WindowId) -> Result<Vec<TabGroup>>;

    /// Groups across all windows.
    async fn all_groups(&self) -> Result<Vec<TabGroup>>;

    /// Move a tab to a new index within its window.
    async fn move_tab(&self, tab: TabId, index: u32) -> Result<()>;

    /// Add tabs to an existing group, or create a new group when `into`
    /// is `None` (in `window` if given, otherwise the tabs' own window).
    /// Returns the id of the group the tabs ended up in.
    async fn group_tabs(
        &self,
        tabs: &[TabId],
        into: Option<GroupId>,
        window: Option<WindowId>,
    ) -> Result<GroupId>;

    /// Remove tabs from whatever group they are in.
    async fn ungroup_tabs(&self, tabs: &[TabId]) -> Result<()>;

    /// Apply a partial update to a group.
    async fn update_group(&self, group: GroupId, update: GroupUpdate) -> Result<()>;

    /// Open a new, focused browser window.
    async fn create_window(&self) -> Result<WindowId>;

    /// Whether a window id still refers to an open window.
    async fn window_exists(&self, window: WindowId) -> Result<bool>;

    /// Open a tab in the given window. The tab is created inactive.
    async fn create_tab(&self, window: WindowId, url: &str, pinned: bool) -> Result<Tab>;

    /// Close the given tabs.
    async fn remove_tabs(&self, tabs: &[TabId]) -> Result<()>;

    /// Focus a tab (and deactivate the rest of its window).
    async fn activate_tab(&self, tab: TabId) -> Result<()>;
}

/// External collaborator that samples a domain's favicon and reports the
/// closest named group color. Treated as opaque: slow or failing lookups
/// are absorbed by the caller.
#[async_trait]
pub trait FaviconColorSource: Send + Sync {
    async fn dominant_color(&self, domain: &str) -> Result<Option<GroupColor>>;
}
