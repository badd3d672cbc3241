//! Session and group restoration.
//!
//! Restores are best-effort by design: privileged URLs are filtered out,
//! individual tab or group failures are logged and skipped, and the
//! caller gets the achieved tab count. Only a session that produces no
//! tabs at all is reported as a failure.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::host::{GroupColor, GroupId, GroupUpdate, HostBrowser, TabId, WindowId, is_privileged_url};

use super::record::{GroupSnapshot, TabSnapshot};
use super::store::SessionStore;

/// Spacing between tab creations, to stay under host API rate limits.
const TAB_CREATE_SPACING: Duration = Duration::from_millis(100);

/// URLs the host opens in a fresh window on its own; removed after a
/// restore into a new window unless they are ours.
const BLANK_URLS: &[&str] = &["chrome://newtab/", "about:blank", ""];

/// Outcome of a successful (possibly partial) restore.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoreReport {
    pub tab_count: usize,
    pub group_title: Option<String>,
}

struct CreatedTab {
    id: TabId,
    origin_group: Option<GroupId>,
    was_active: bool,
}

pub struct RestoreService {
    host: Arc<dyn HostBrowser>,
    store: SessionStore,
}

impl RestoreService {
    pub fn new(host: Arc<dyn HostBrowser>, store: SessionStore) -> Self {
        Self { host, store }
    }

    /// Rebuild a stored session's tabs and groups, in a new window or
    /// the focused one.
    pub async fn restore_session(
        &self,
        session_id: &str,
        open_in_new_window: bool,
    ) -> Result<RestoreReport> {
        let (record, kind) = self
            .store
            .find(session_id)
            .await?
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;
        debug!(session_id, %kind, tabs = record.tab_count, "restoring session");

        let (window, created_window) = self.target_window(open_in_new_window).await?;

        let created = self.create_tabs(window, &record.tabs).await;
        if created.is_empty() {
            return Err(EngineError::NothingRestored.into());
        }

        for group in &record.groups {
            let members: Vec<TabId> = created
                .iter()
                .filter(|c| c.origin_group == Some(group.id))
                .map(|c| c.id)
                .collect();
            if members.is_empty() {
                debug!(group = %group.title, "no restored tabs for group");
                continue;
            }
            if let Err(e) = self.recreate_group(window, group, &members).await {
                warn!(group = %group.title, error = %e, "failed to recreate group");
            }
        }

        if let Some(active) = created.iter().find(|c| c.was_active) {
            if let Err(e) = self.host.activate_tab(active.id).await {
                warn!(tab = active.id, error = %e, "failed to reactivate tab");
            }
        }

        if created_window {
            self.remove_blank_tabs(window, &created).await;
        }

        info!(session_id, restored = created.len(), "session restored");
        Ok(RestoreReport {
            tab_count: created.len(),
            group_title: None,
        })
    }

    /// Rebuild a single group out of a stored session.
    ///
    /// When the group's metadata is missing but tabs still reference its
    /// id, a fallback descriptor is synthesized so the tabs are
    /// recovered anyway.
    pub async fn restore_group(
        &self,
        session_id: &str,
        group_id: GroupId,
        open_in_new_window: bool,
    ) -> Result<RestoreReport> {
        let (record, _) = self
            .store
            .find(session_id)
            .await?
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;

        let member_tabs: Vec<TabSnapshot> = record
            .tabs
            .iter()
            .filter(|t| t.group_id == Some(group_id))
            .cloned()
            .collect();

        let group = match record.groups.iter().find(|g| g.id == group_id) {
            Some(group) => group.clone(),
            None if member_tabs.is_empty() => {
                return Err(EngineError::GroupNotFound {
                    session_id: session_id.to_string(),
                    group_id,
                }
                .into());
            }
            None => {
                debug!(session_id, group_id, "synthesizing fallback group descriptor");
                GroupSnapshot {
                    id: group_id,
                    title: format!("Restored group ({} tabs)", member_tabs.len()),
                    color: GroupColor::Blue,
                    collapsed: false,
                    source_window_id: member_tabs[0].source_window_id,
                }
            }
        };

        if member_tabs.is_empty() {
            return Err(EngineError::NoTabsInGroup(group.title.clone()).into());
        }
        debug!(session_id, group = %group.title, tabs = member_tabs.len(), "restoring group");

        let (window, created_window) = self.target_window(open_in_new_window).await?;

        let created = self.create_tabs(window, &member_tabs).await;
        if created.is_empty() {
            return Err(EngineError::NothingRestored.into());
        }

        if created_window {
            self.remove_blank_tabs(window, &created).await;
        }

        self.recreate_group(window, &group, &created.iter().map(|c| c.id).collect::<Vec<_>>())
            .await?;

        if let Err(e) = self.host.activate_tab(created[0].id).await {
            warn!(tab = created[0].id, error = %e, "failed to activate first tab");
        }

        info!(session_id, group = %group.title, restored = created.len(), "group restored");
        Ok(RestoreReport {
            tab_count: created.len(),
            group_title: Some(group.title),
        })
    }

    async fn target_window(&self, open_in_new_window: bool) -> Result<(WindowId, bool)> {
        if open_in_new_window {
            let window = self.host.create_window().await?;
            // Fail fast if the host could not actually materialize it
            if !self.host.window_exists(window).await.unwrap_or(false) {
                return Err(EngineError::WindowCreation.into());
            }
            Ok((window, true))
        } else {
            let window = self
                .host
                .focused_window()
                .await?
                .ok_or(EngineError::NoActiveWindow)?;
            Ok((window, false))
        }
    }

    /// Create the creatable subset of the snapshots, sequentially and
    /// throttled. Per-tab failures are logged and skipped.
    async fn create_tabs(&self, window: WindowId, tabs: &[TabSnapshot]) -> Vec<CreatedTab> {
        let creatable: Vec<&TabSnapshot> = tabs
            .iter()
            .filter(|t| {
                if is_privileged_url(&t.url) {
                    debug!(url = %t.url, "skipping privileged url");
                    false
                } else {
                    true
                }
            })
            .collect();

        let mut created = Vec::with_capacity(creatable.len());
        for snapshot in creatable {
            match self.host.create_tab(window, &snapshot.url, snapshot.pinned).await {
                Ok(tab) => created.push(CreatedTab {
                    id: tab.id,
                    origin_group: snapshot.group_id,
                    was_active: snapshot.active,
                }),
                Err(e) => warn!(url = %snapshot.url, error = %e, "failed to create tab"),
            }
            sleep(TAB_CREATE_SPACING).await;
        }
        created
    }

    async fn recreate_group(
        &self,
        window: WindowId,
        group: &GroupSnapshot,
        members: &[TabId],
    ) -> Result<()> {
        let new_id = self.host.group_tabs(members, None, Some(window)).await?;
        self.host
            .update_group(
                new_id,
                GroupUpdate::new()
                    .title(group.title.clone())
                    .color(group.color)
                    .collapsed(group.collapsed),
            )
            .await?;
        debug!(group = %group.title, members = members.len(), "recreated group");
        Ok(())
    }

    /// Remove the blank tab the host auto-opens in a fresh window, once
    /// real tabs exist there.
    async fn remove_blank_tabs(&self, window: WindowId, created: &[CreatedTab]) {
        let tabs = match self.host.tabs_in_window(window).await {
            Ok(tabs) => tabs,
            Err(e) => {
                warn!(window, error = %e, "failed to query window for blank tabs");
                return;
            }
        };

        let to_remove: Vec<TabId> = tabs
            .iter()
            .filter(|t| BLANK_URLS.contains(&t.url.as_str()))
            .filter(|t| !created.iter().any(|c| c.id == t.id))
            .map(|t| t.id)
            .collect();

        if to_remove.is_empty() {
            return;
        }
        if let Err(e) = self.host.remove_tabs(&to_remove).await {
            warn!(window, error = %e, "failed to remove blank tabs");
        }
    }
}
