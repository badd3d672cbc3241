//! In-memory mirror of recent tab/group state.
//!
//! The host notifies tab removal only after the tab is gone from
//! query-able state, so the closed-tab recorder needs a second source of
//! recent facts. The registry is refreshed by event handlers and a
//! periodic sweep; all access is through short critical sections that
//! never span an await, which is what keeps concurrent handlers safe on
//! the single runtime.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::trace;

use crate::host::{GroupId, Tab, TabGroup, TabId, is_privileged_url};

#[derive(Default)]
struct Inner {
    tabs: HashMap<TabId, Tab>,
    groups: HashMap<GroupId, TabGroup>,
}

#[derive(Default)]
pub struct TabRegistry {
    inner: Mutex<Inner>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record or refresh a tab. Privileged/internal URLs are never
    /// cached; an update that moves a cached tab onto a privileged URL
    /// leaves the previous entry in place.
    pub fn upsert_tab(&self, tab: &Tab) {
        if is_privileged_url(&tab.url) {
            trace!(tab = tab.id, url = %tab.url, "not caching privileged url");
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        inner.tabs.insert(tab.id, tab.clone());
    }

    pub fn upsert_group(&self, group: &TabGroup) {
        let mut inner = self.inner.lock().unwrap();
        inner.groups.insert(group.id, group.clone());
    }

    /// Merge a fresh host snapshot into the cache. Existing entries are
    /// updated, not cleared: a tab missing from this sweep may still be
    /// the only record of something that just closed.
    pub fn absorb(&self, tabs: &[Tab], groups: &[TabGroup]) {
        let mut inner = self.inner.lock().unwrap();
        for tab in tabs {
            if !is_privileged_url(&tab.url) {
                inner.tabs.insert(tab.id, tab.clone());
            }
        }
        for group in groups {
            inner.groups.insert(group.id, group.clone());
        }
    }

    pub fn tab(&self, id: TabId) -> Option<Tab> {
        self.inner.lock().unwrap().tabs.get(&id).cloned()
    }

    pub fn group(&self, id: GroupId) -> Option<TabGroup> {
        self.inner.lock().unwrap().groups.get(&id).cloned()
    }

    /// Drop a tab entry. Called once a closed-tab record has been
    /// written; the id will never be valid again.
    pub fn evict_tab(&self, id: TabId) {
        self.inner.lock().unwrap().tabs.remove(&id);
    }

    /// A host group disappeared: forget it and mark its cached member
    /// tabs as ungrouped so they are recovered as individual tabs.
    pub fn detach_group(&self, id: GroupId) {
        let mut inner = self.inner.lock().unwrap();
        inner.groups.remove(&id);
        for tab in inner.tabs.values_mut() {
            if tab.group_id == Some(id) {
                tab.group_id = None;
            }
        }
    }

    pub fn tab_count(&self) -> usize {
        self.inner.lock().unwrap().tabs.len()
    }

    pub fn group_count(&self) -> usize {
        self.inner.lock().unwrap().groups.len()
    }
}
