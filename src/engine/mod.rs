//! Process-scoped engine context.
//!
//! Owns every service and all shared state, constructed once at startup
//! and handed to the host boundary. Host events are dispatched into the
//! `on_*` handlers; UI/CLI requests go through [`Engine::handle`], which
//! converts every failure into a failure response rather than letting it
//! propagate.

mod message;

pub use message::{Request, Response};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::TabRegistry;
use crate::config::{AutoSaveTrigger, Settings};
use crate::grouping::{ColorResolver, Organizer};
use crate::host::{
    FaviconColorSource, GroupId, HostBrowser, Tab, TabGroup, TabId, WindowId, is_privileged_url,
};
use crate::session::{
    CaptureScope, CaptureService, ClosedTabRecorder, RestoreService, SessionKind, SessionStore,
};
use crate::storage::KvStore;

/// How often the registry is reconciled against a full host snapshot.
const CACHE_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Settle delay before a change-triggered capture, so a burst of
/// navigation events collapses into one snapshot.
const CHANGE_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Floor for the timed-capture interval; anything shorter would be
/// swallowed by the capture rate limit anyway.
const MIN_TIMER_INTERVAL_SECS: u64 = 5;

pub struct Engine {
    host: Arc<dyn HostBrowser>,
    sync_kv: Arc<dyn KvStore>,
    registry: Arc<TabRegistry>,
    settings: Mutex<Settings>,
    store: SessionStore,
    capture: Arc<CaptureService>,
    restore: RestoreService,
    organizer: Organizer,
    recorder: ClosedTabRecorder,
    auto_save_task: Mutex<Option<JoinHandle<()>>>,
    cache_task: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    /// Build the full service graph over the given host and stores.
    /// `local_kv` holds session collections; `sync_kv` holds settings.
    pub async fn new(
        host: Arc<dyn HostBrowser>,
        local_kv: Arc<dyn KvStore>,
        sync_kv: Arc<dyn KvStore>,
        favicon: Arc<dyn FaviconColorSource>,
    ) -> Result<Arc<Self>> {
        let settings = Settings::load(sync_kv.as_ref()).await?;
        debug!(?settings, "loaded settings");

        let registry = Arc::new(TabRegistry::new());
        let store = SessionStore::new(local_kv);
        let capture = Arc::new(CaptureService::new(Arc::clone(&host), store.clone()));
        let restore = RestoreService::new(Arc::clone(&host), store.clone());
        let organizer = Organizer::new(Arc::clone(&host), ColorResolver::new(favicon));
        let recorder = ClosedTabRecorder::new(store.clone(), Arc::clone(&registry));

        Ok(Arc::new(Self {
            host,
            sync_kv,
            registry,
            settings: Mutex::new(settings),
            store,
            capture,
            restore,
            organizer,
            recorder,
            auto_save_task: Mutex::new(None),
            cache_task: Mutex::new(None),
        }))
    }

    /// Prime the registry from live host state and start the background
    /// loops (periodic cache reconciliation, timed auto-save).
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        let tabs = self.host.all_tabs().await?;
        let groups = self.host.all_groups().await?;
        self.registry.absorb(&tabs, &groups);
        info!(
            tabs = self.registry.tab_count(),
            groups = self.registry.group_count(),
            "registry primed"
        );

        let engine = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(CACHE_REFRESH_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                engine.refresh_registry().await;
            }
        });
        *self.cache_task.lock().unwrap() = Some(handle);

        self.restart_auto_save();
        Ok(())
    }

    /// Stop the background loops. In-flight captures finish on their own.
    pub fn shutdown(&self) {
        if let Some(task) = self.auto_save_task.lock().unwrap().take() {
            task.abort();
        }
        if let Some(task) = self.cache_task.lock().unwrap().take() {
            task.abort();
        }
        info!("engine shut down");
    }

    pub fn settings(&self) -> Settings {
        self.settings.lock().unwrap().clone()
    }

    /// Dispatch one request. Never returns an error: every failure is
    /// folded into a failure response so the caller always gets a reply.
    pub async fn handle(self: &Arc<Self>, request: Request) -> Response {
        match request {
            Request::ToggleAutoSave { enabled } => {
                let result = self
                    .update_settings(|s| s.auto_save_enabled = enabled)
                    .await;
                match result {
                    Ok(()) => Response::ok(),
                    Err(e) => Response::err(e.to_string()),
                }
            }
            Request::UpdateAutoSaveSettings {
                trigger,
                interval,
                detect_tab_close,
                detect_tab_create,
                detect_url_change,
            } => {
                let result = self
                    .update_settings(|s| {
                        if let Some(trigger) = trigger {
                            s.auto_save_trigger = trigger;
                        }
                        if let Some(interval) = interval {
                            s.auto_save_interval = interval;
                        }
                        if let Some(v) = detect_tab_close {
                            s.detect_tab_close = v;
                        }
                        if let Some(v) = detect_tab_create {
                            s.detect_tab_create = v;
                        }
                        if let Some(v) = detect_url_change {
                            s.detect_url_change = v;
                        }
                    })
                    .await;
                match result {
                    Ok(()) => Response::ok(),
                    Err(e) => Response::err(e.to_string()),
                }
            }
            Request::SaveSession { session_name } => {
                match self.capture.save_manual(&session_name).await {
                    Ok(record) => Response::saved(record.id),
                    Err(e) => Response::err(e.to_string()),
                }
            }
            Request::RestoreSession {
                session_id,
                open_in_new_window,
            } => match self
                .restore
                .restore_session(&session_id, open_in_new_window)
                .await
            {
                Ok(report) => Response::restored(report.tab_count),
                Err(e) => Response::err(e.to_string()),
            },
            Request::RestoreGroup {
                session_id,
                group_id,
                open_in_new_window,
            } => match self
                .restore
                .restore_group(&session_id, group_id, open_in_new_window)
                .await
            {
                Ok(report) => Response::group_restored(report.tab_count, report.group_title),
                Err(e) => Response::err(e.to_string()),
            },
            Request::GetSavedSessions => match self.store.list(SessionKind::Manual).await {
                Ok(mut sessions) => {
                    // Manual saves are stored oldest-first; present newest-first
                    sessions.reverse();
                    Response::sessions(sessions)
                }
                Err(e) => Response::err(e.to_string()),
            },
            Request::DeleteSession { session_id, kind } => {
                let result = async {
                    let kind: SessionKind = kind.parse()?;
                    self.store.delete(&session_id, kind).await
                }
                .await;
                match result {
                    Ok(()) => Response::ok(),
                    Err(e) => Response::err(e.to_string()),
                }
            }
            Request::ClearAllSessions { kind } => {
                let result = async {
                    let kind: SessionKind = kind.parse()?;
                    self.store.clear(kind).await
                }
                .await;
                match result {
                    Ok(()) => Response::ok(),
                    Err(e) => Response::err(e.to_string()),
                }
            }
            Request::RenameSession {
                session_id,
                new_name,
            } => match self.store.rename(&session_id, &new_name).await {
                Ok(()) => Response::ok(),
                Err(e) => Response::err(e.to_string()),
            },
            Request::TriggerTabSorting => match self.sort_focused_window().await {
                Ok(()) => Response::ok(),
                Err(e) => Response::err(e.to_string()),
            },
        }
    }

    /// A tab appeared. Cache it; in change-triggered mode this may also
    /// schedule a capture.
    pub fn on_tab_created(&self, tab: &Tab) {
        self.registry.upsert_tab(tab);
        if is_privileged_url(&tab.url) {
            return;
        }
        let settings = self.settings();
        if settings.detect_tab_create {
            self.maybe_schedule_change_capture(&settings);
        }
    }

    /// A tab navigated or otherwise changed. Only a host or path change
    /// counts as significant; fragment and query churn does not.
    pub fn on_tab_updated(&self, tab: &Tab) {
        let previous = self.registry.tab(tab.id);
        self.registry.upsert_tab(tab);
        if is_privileged_url(&tab.url) {
            return;
        }

        let settings = self.settings();
        if !settings.detect_url_change {
            return;
        }
        let changed = match previous {
            Some(prev) => significant_change(&prev.url, &tab.url),
            None => true,
        };
        if changed {
            self.maybe_schedule_change_capture(&settings);
        }
    }

    pub fn on_tab_moved(&self, tab: &Tab) {
        self.registry.upsert_tab(tab);
    }

    /// A tab (or its whole window) closed. Records a recovery session
    /// when close detection is on, then captures the remaining state;
    /// the registry entry is evicted either way.
    ///
    /// The closed record is written before the capture so recovery can
    /// still match the tab against the pre-removal snapshot.
    pub async fn on_tab_removed(&self, tab_id: TabId, window_id: WindowId, is_window_closing: bool) {
        let settings = self.settings();
        if settings.auto_save_enabled && settings.detect_tab_close {
            if let Err(e) = self
                .recorder
                .record_removal(tab_id, window_id, is_window_closing)
                .await
            {
                warn!(tab_id, error = %e, "failed to record removal");
            }
            match settings.auto_save_trigger {
                AutoSaveTrigger::Time => {
                    let scope = CaptureScope::from_all_windows(settings.auto_save_all_windows);
                    if let Err(e) = self.capture.capture(scope).await {
                        warn!(error = %e, "capture after removal failed");
                    }
                }
                AutoSaveTrigger::Change => self.maybe_schedule_change_capture(&settings),
            }
        } else {
            self.registry.evict_tab(tab_id);
        }
    }

    pub fn on_group_updated(&self, group: &TabGroup) {
        self.registry.upsert_group(group);
    }

    pub fn on_group_removed(&self, group_id: GroupId) {
        self.registry.detach_group(group_id);
    }

    /// (Re)arm the timed auto-save loop to match current settings. Call
    /// after any settings change; a previous loop is always torn down.
    pub fn restart_auto_save(self: &Arc<Self>) {
        let mut slot = self.auto_save_task.lock().unwrap();
        if let Some(task) = slot.take() {
            task.abort();
        }

        let settings = self.settings();
        if !settings.auto_save_enabled || settings.auto_save_trigger != AutoSaveTrigger::Time {
            debug!("timed auto-save not armed");
            return;
        }

        let secs = settings.auto_save_interval.max(MIN_TIMER_INTERVAL_SECS);
        let scope = CaptureScope::from_all_windows(settings.auto_save_all_windows);
        info!(interval_secs = secs, ?scope, "timed auto-save armed");

        let engine = Arc::clone(self);
        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(secs));
            // The first tick fires immediately; captures start one
            // interval from now.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = engine.capture.capture(scope).await {
                    warn!(error = %e, "timed capture failed");
                }
            }
        }));
    }

    async fn update_settings<F>(self: &Arc<Self>, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Settings),
    {
        let updated = {
            let mut settings = self.settings.lock().unwrap();
            apply(&mut settings);
            settings.clone()
        };
        updated.persist(self.sync_kv.as_ref()).await?;
        self.restart_auto_save();
        Ok(())
    }

    fn maybe_schedule_change_capture(&self, settings: &Settings) {
        if !settings.auto_save_enabled || settings.auto_save_trigger != AutoSaveTrigger::Change {
            return;
        }
        let scope = CaptureScope::from_all_windows(settings.auto_save_all_windows);
        self.capture.schedule(CHANGE_SETTLE_DELAY, scope);
    }

    async fn sort_focused_window(&self) -> Result<()> {
        let window = self
            .host
            .focused_window()
            .await?
            .ok_or(crate::error::EngineError::NoActiveWindow)?;
        let tabs = self.host.tabs_in_window(window).await?;
        let settings = self.settings();
        self.organizer.organize(&tabs, &settings).await
    }

    async fn refresh_registry(&self) {
        let tabs = match self.host.all_tabs().await {
            Ok(tabs) => tabs,
            Err(e) => {
                warn!(error = %e, "registry refresh: tab query failed");
                return;
            }
        };
        let groups = match self.host.all_groups().await {
            Ok(groups) => groups,
            Err(e) => {
                warn!(error = %e, "registry refresh: group query failed");
                return;
            }
        };
        self.registry.absorb(&tabs, &groups);
    }
}

/// Whether a navigation moved the tab somewhere genuinely different.
/// Compares host and path; fragment or query changes are noise.
fn significant_change(old: &str, new: &str) -> bool {
    match (Url::parse(old), Url::parse(new)) {
        (Ok(old), Ok(new)) => old.host_str() != new.host_str() || old.path() != new.path(),
        _ => old != new,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_significant_change_ignores_fragments_and_queries() {
        assert!(!significant_change(
            "https://example.com/docs?tab=1",
            "https://example.com/docs?tab=2#section"
        ));
        assert!(significant_change(
            "https://example.com/docs",
            "https://example.com/blog"
        ));
        assert!(significant_change(
            "https://example.com/docs",
            "https://other.com/docs"
        ));
    }

    #[test]
    fn test_significant_change_with_unparseable_urls() {
        assert!(!significant_change("about:blank", "about:blank"));
        assert!(significant_change("about:blank", "chrome://newtab/"));
    }
}
