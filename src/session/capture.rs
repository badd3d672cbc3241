//! Session capture: snapshots of live tab/group state into the bounded
//! auto-save history, plus manual saves.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::host::HostBrowser;

use super::record::{GroupSnapshot, SessionKind, SessionRecord, TabSnapshot};
use super::store::SessionStore;

/// Minimum spacing between completed automatic captures. Requests inside
/// the window are dropped, not queued, so event storms (a window's worth
/// of tabs closing at once) cannot flood storage.
const MIN_CAPTURE_GAP: Duration = Duration::from_secs(5);

/// Whether a capture covers the focused window or every window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureScope {
    CurrentWindow,
    AllWindows,
}

impl CaptureScope {
    pub fn from_all_windows(all: bool) -> Self {
        if all {
            Self::AllWindows
        } else {
            Self::CurrentWindow
        }
    }
}

pub struct CaptureService {
    host: Arc<dyn HostBrowser>,
    store: SessionStore,
    last_capture: Mutex<Option<Instant>>,
}

impl CaptureService {
    pub fn new(host: Arc<dyn HostBrowser>, store: SessionStore) -> Self {
        Self {
            host,
            store,
            last_capture: Mutex::new(None),
        }
    }

    /// Snapshot the requested scope into the auto-save history.
    ///
    /// Returns `Ok(None)` when the capture was dropped: rate limited,
    /// or nothing to snapshot. The store is only touched after a fully
    /// successful gather, so a host error mid-query can never corrupt
    /// previously stored sessions.
    pub async fn capture(&self, scope: CaptureScope) -> Result<Option<SessionRecord>> {
        if self.rate_limited() {
            debug!(?scope, "capture dropped by rate limit");
            return Ok(None);
        }

        let Some(gathered) = self.gather(scope).await? else {
            debug!(?scope, "nothing to capture");
            return Ok(None);
        };

        let name = format!("Auto-saved {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        let record = SessionRecord::new(
            SessionKind::Auto,
            name,
            gathered.tabs,
            gathered.groups,
            gathered.window_count,
            scope == CaptureScope::AllWindows,
        );

        self.store.push_auto(record.clone()).await?;
        *self.last_capture.lock().unwrap() = Some(Instant::now());

        info!(
            session = %record.id,
            tabs = record.tab_count,
            groups = record.group_count,
            "auto-saved session"
        );
        Ok(Some(record))
    }

    /// Capture after a settle delay, on a background task. Used by change
    /// detection so a navigation can finish before it is snapshotted.
    pub fn schedule(self: &Arc<Self>, delay: Duration, scope: CaptureScope) {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            sleep(delay).await;
            if let Err(e) = service.capture(scope).await {
                warn!(error = %e, "scheduled capture failed");
            }
        });
    }

    /// Snapshot the focused window as a named manual session. Not rate
    /// limited; the user asked for it.
    pub async fn save_manual(&self, name: &str) -> Result<SessionRecord> {
        let gathered = self
            .gather(CaptureScope::CurrentWindow)
            .await?
            .ok_or_else(|| anyhow::anyhow!("no tabs to save"))?;

        let record = SessionRecord::new(
            SessionKind::Manual,
            name,
            gathered.tabs,
            gathered.groups,
            1,
            false,
        );
        self.store.push_manual(record.clone()).await?;

        info!(session = %record.id, tabs = record.tab_count, "saved session");
        Ok(record)
    }

    fn rate_limited(&self) -> bool {
        let last = self.last_capture.lock().unwrap();
        matches!(*last, Some(at) if at.elapsed() < MIN_CAPTURE_GAP)
    }

    async fn gather(&self, scope: CaptureScope) -> Result<Option<Gathered>> {
        let mut tabs = Vec::new();
        let mut groups = Vec::new();
        let window_count;

        match scope {
            CaptureScope::AllWindows => {
                let windows = self.host.windows().await?;
                window_count = windows.len();
                for window in windows {
                    for tab in self.host.tabs_in_window(window).await? {
                        tabs.push(TabSnapshot::from_tab(&tab));
                    }
                    for group in self.host.groups_in_window(window).await? {
                        groups.push(GroupSnapshot::from_group(&group));
                    }
                }
            }
            CaptureScope::CurrentWindow => {
                window_count = 1;
                let Some(window) = self.host.focused_window().await? else {
                    return Ok(None);
                };
                for tab in self.host.tabs_in_window(window).await? {
                    tabs.push(TabSnapshot::from_tab(&tab));
                }
                for group in self.host.groups_in_window(window).await? {
                    groups.push(GroupSnapshot::from_group(&group));
                }
            }
        }

        if tabs.is_empty() {
            return Ok(None);
        }

        Ok(Some(Gathered {
            tabs,
            groups,
            window_count,
        }))
    }
}

struct Gathered {
    tabs: Vec<TabSnapshot>,
    groups: Vec<GroupSnapshot>,
    window_count: usize,
}
