//! Closed-tab/window recovery.
//!
//! The host reports a removal only after the tab is gone, so the facts
//! have to be reconstructed from whichever source is still available,
//! ranked by fidelity: the most recent auto-save snapshot, then the
//! in-memory registry, then a synthesized placeholder. Something
//! recoverable is always recorded in preference to silent data loss.

use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use tracing::{debug, info};

use crate::cache::TabRegistry;
use crate::host::{TabId, WindowId};

use super::record::{GroupSnapshot, SessionKind, SessionRecord, TabSnapshot};
use super::store::SessionStore;

/// A tab recovered by one of the lookup sources, with its owning group
/// when that could be recovered too.
#[derive(Debug, Clone)]
pub struct RecoveredTab {
    pub tab: TabSnapshot,
    pub group: Option<GroupSnapshot>,
    pub source: RecoverySource,
}

/// Which source produced a recovered tab, in decreasing fidelity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySource {
    Snapshot,
    Cache,
    Placeholder,
}

pub struct ClosedTabRecorder {
    store: SessionStore,
    registry: Arc<TabRegistry>,
}

impl ClosedTabRecorder {
    pub fn new(store: SessionStore, registry: Arc<TabRegistry>) -> Self {
        Self { store, registry }
    }

    /// Persist a minimal session for what a removal destroyed. Returns
    /// the stored record, or `None` when a closing window had nothing
    /// recoverable. The registry entry for the tab id is evicted either
    /// way; the id will never be seen again.
    pub async fn record_removal(
        &self,
        tab_id: TabId,
        window_id: WindowId,
        is_window_closing: bool,
    ) -> Result<Option<SessionRecord>> {
        let result = if is_window_closing {
            self.record_closed_window(window_id).await
        } else {
            self.record_closed_tab(tab_id, window_id).await
        };
        self.registry.evict_tab(tab_id);
        result
    }

    async fn record_closed_window(&self, window_id: WindowId) -> Result<Option<SessionRecord>> {
        let Some(snapshot) = self.store.latest_auto().await? else {
            debug!(window_id, "no auto-save to recover closed window from");
            return Ok(None);
        };

        let tabs: Vec<TabSnapshot> = snapshot
            .tabs
            .iter()
            .filter(|t| t.source_window_id == window_id)
            .cloned()
            .collect();
        if tabs.is_empty() {
            debug!(window_id, "latest auto-save does not cover closed window");
            return Ok(None);
        }
        let groups: Vec<GroupSnapshot> = snapshot
            .groups
            .iter()
            .filter(|g| g.source_window_id == window_id)
            .cloned()
            .collect();

        let name = format!("Closed window {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        let record = SessionRecord::new(SessionKind::Closed, name, tabs, groups, 1, false);
        self.store.push_closed(record.clone()).await?;

        info!(session = %record.id, tabs = record.tab_count, "recorded closed window");
        Ok(Some(record))
    }

    async fn record_closed_tab(
        &self,
        tab_id: TabId,
        window_id: WindowId,
    ) -> Result<Option<SessionRecord>> {
        let snapshot = self.store.latest_auto().await?;

        let recovered = lookup_in_snapshot(snapshot.as_ref(), tab_id, window_id)
            .or_else(|| self.lookup_in_cache(tab_id))
            .unwrap_or_else(|| placeholder(tab_id, window_id));

        debug!(tab_id, source = ?recovered.source, "recovered closed tab");

        let name = match recovered.source {
            RecoverySource::Placeholder => {
                format!("Closed tab: {}", Local::now().format("%H:%M"))
            }
            _ if recovered.tab.title.is_empty() => "Closed tab: Untitled".to_string(),
            _ => format!("Closed tab: {}", recovered.tab.title),
        };

        let groups = recovered.group.into_iter().collect();
        let record = SessionRecord::new(SessionKind::Closed, name, vec![recovered.tab], groups, 0, false);
        self.store.push_closed(record.clone()).await?;

        info!(session = %record.id, "recorded closed tab");
        Ok(Some(record))
    }

    fn lookup_in_cache(&self, tab_id: TabId) -> Option<RecoveredTab> {
        let tab = self.registry.tab(tab_id)?;
        let group = tab
            .group_id
            .and_then(|g| self.registry.group(g))
            .map(|g| GroupSnapshot::from_group(&g));
        Some(RecoveredTab {
            tab: TabSnapshot::from_tab(&tab),
            group,
            source: RecoverySource::Cache,
        })
    }
}

/// Highest-fidelity source: the tab as it appeared in the most recent
/// auto-save, matched by id and source window.
fn lookup_in_snapshot(
    snapshot: Option<&SessionRecord>,
    tab_id: TabId,
    window_id: WindowId,
) -> Option<RecoveredTab> {
    let snapshot = snapshot?;
    let tab = snapshot
        .tabs
        .iter()
        .find(|t| t.id == Some(tab_id) && t.source_window_id == window_id)?
        .clone();
    let group = tab
        .group_id
        .and_then(|gid| snapshot.groups.iter().find(|g| g.id == gid))
        .cloned();
    Some(RecoveredTab {
        tab,
        group,
        source: RecoverySource::Snapshot,
    })
}

/// Last resort: a minimal stand-in so the user still sees a recoverable
/// entry instead of nothing.
fn placeholder(tab_id: TabId, window_id: WindowId) -> RecoveredTab {
    RecoveredTab {
        tab: TabSnapshot {
            id: Some(tab_id),
            url: "chrome://newtab/".to_string(),
            title: format!("Closed tab ({})", Local::now().format("%H:%M")),
            index: 0,
            active: false,
            pinned: false,
            group_id: None,
            favicon: None,
            source_window_id: window_id,
        },
        group: None,
        source: RecoverySource::Placeholder,
    }
}
