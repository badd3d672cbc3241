//! Shared test doubles: an in-memory host browser and favicon color
//! sources with scripted behavior.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use tab_warden::{
    FaviconColorSource, GroupColor, GroupId, GroupUpdate, HostBrowser, Tab, TabGroup, TabId,
    WindowId,
};

#[derive(Default)]
struct BrowserState {
    tabs: Vec<Tab>,
    groups: Vec<TabGroup>,
    windows: Vec<WindowId>,
    focused: Option<WindowId>,
    next_tab_id: TabId,
    next_group_id: GroupId,
    next_window_id: WindowId,
    group_creations: usize,
    fail_create_window: bool,
}

/// In-memory stand-in for the host browser. State mutations mirror the
/// real host: grouping rewrites `group_id`, `create_window` opens a
/// blank tab the way a fresh browser window does.
pub struct MockBrowser {
    state: Mutex<BrowserState>,
}

#[allow(dead_code)]
impl MockBrowser {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BrowserState {
                windows: vec![1],
                focused: Some(1),
                next_tab_id: 1,
                next_group_id: 100,
                next_window_id: 2,
                ..Default::default()
            }),
        }
    }

    /// Add a tab to the focused window and return it.
    pub fn seed_tab(&self, url: &str, title: &str) -> Tab {
        self.seed_tab_in(1, url, title)
    }

    pub fn seed_tab_in(&self, window: WindowId, url: &str, title: &str) -> Tab {
        let mut state = self.state.lock().unwrap();
        let id = state.next_tab_id;
        state.next_tab_id += 1;
        let index = state.tabs.iter().filter(|t| t.window_id == window).count() as u32;
        let tab = Tab {
            id,
            window_id: window,
            url: url.to_string(),
            title: title.to_string(),
            index,
            active: false,
            pinned: false,
            group_id: None,
            favicon: None,
            last_accessed: None,
        };
        state.tabs.push(tab.clone());
        tab
    }

    pub fn seed_window(&self, window: WindowId) {
        let mut state = self.state.lock().unwrap();
        if !state.windows.contains(&window) {
            state.windows.push(window);
        }
    }

    pub fn seed_group(&self, window: WindowId, title: &str, members: &[TabId]) -> GroupId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_group_id;
        state.next_group_id += 1;
        state.groups.push(TabGroup {
            id,
            window_id: window,
            title: title.to_string(),
            color: GroupColor::Grey,
            collapsed: false,
        });
        for tab in state.tabs.iter_mut() {
            if members.contains(&tab.id) {
                tab.group_id = Some(id);
            }
        }
        id
    }

    /// Make subsequently created windows unverifiable.
    pub fn fail_window_creation(&self) {
        self.state.lock().unwrap().fail_create_window = true;
    }

    pub fn group_creations(&self) -> usize {
        self.state.lock().unwrap().group_creations
    }

    pub fn tab(&self, id: TabId) -> Option<Tab> {
        self.state.lock().unwrap().tabs.iter().find(|t| t.id == id).cloned()
    }

    pub fn tabs(&self) -> Vec<Tab> {
        self.state.lock().unwrap().tabs.clone()
    }

    pub fn groups(&self) -> Vec<TabGroup> {
        self.state.lock().unwrap().groups.clone()
    }

    /// Tab urls in a window, ordered by the index the engine assigned.
    pub fn ordered_urls(&self, window: WindowId) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut tabs: Vec<&Tab> = state.tabs.iter().filter(|t| t.window_id == window).collect();
        tabs.sort_by_key(|t| t.index);
        tabs.iter().map(|t| t.url.clone()).collect()
    }

    pub fn group_titled(&self, title: &str) -> Option<TabGroup> {
        self.state
            .lock()
            .unwrap()
            .groups
            .iter()
            .find(|g| g.title == title)
            .cloned()
    }

    pub fn members_of(&self, group: GroupId) -> Vec<TabId> {
        self.state
            .lock()
            .unwrap()
            .tabs
            .iter()
            .filter(|t| t.group_id == Some(group))
            .map(|t| t.id)
            .collect()
    }

    pub fn remove_tab(&self, id: TabId) {
        self.state.lock().unwrap().tabs.retain(|t| t.id != id);
    }
}

#[async_trait]
impl HostBrowser for MockBrowser {
    async fn windows(&self) -> Result<Vec<WindowId>> {
        Ok(self.state.lock().unwrap().windows.clone())
    }

    async fn focused_window(&self) -> Result<Option<WindowId>> {
        Ok(self.state.lock().unwrap().focused)
    }

    async fn tabs_in_window(&self, window: WindowId) -> Result<Vec<Tab>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .tabs
            .iter()
            .filter(|t| t.window_id == window)
            .cloned()
            .collect())
    }

    async fn all_tabs(&self) -> Result<Vec<Tab>> {
        Ok(self.state.lock().unwrap().tabs.clone())
    }

    async fn groups_in_window(&self, window: WindowId) -> Result<Vec<TabGroup>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .groups
            .iter()
            .filter(|g| g.window_id == window)
            .cloned()
            .collect())
    }

    async fn all_groups(&self) -> Result<Vec<TabGroup>> {
        Ok(self.state.lock().unwrap().groups.clone())
    }

    async fn move_tab(&self, tab: TabId, index: u32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.tabs.iter_mut().find(|t| t.id == tab) {
            Some(tab) => {
                tab.index = index;
                Ok(())
            }
            None => anyhow::bail!("no tab with id {}", tab),
        }
    }

    async fn group_tabs(
        &self,
        tabs: &[TabId],
        into: Option<GroupId>,
        window: Option<WindowId>,
    ) -> Result<GroupId> {
        let mut state = self.state.lock().unwrap();
        let group_id = match into {
            Some(existing) => {
                if !state.groups.iter().any(|g| g.id == existing) {
                    anyhow::bail!("no group with id {}", existing);
                }
                existing
            }
            None => {
                let id = state.next_group_id;
                state.next_group_id += 1;
                state.group_creations += 1;
                let window = window
                    .or(state.focused)
                    .ok_or_else(|| anyhow::anyhow!("no window for new group"))?;
                state.groups.push(TabGroup {
                    id,
                    window_id: window,
                    title: String::new(),
                    color: GroupColor::Grey,
                    collapsed: false,
                });
                id
            }
        };
        for tab in state.tabs.iter_mut() {
            if tabs.contains(&tab.id) {
                tab.group_id = Some(group_id);
            }
        }
        Ok(group_id)
    }

    async fn ungroup_tabs(&self, tabs: &[TabId]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        for tab in state.tabs.iter_mut() {
            if tabs.contains(&tab.id) {
                tab.group_id = None;
            }
        }
        Ok(())
    }

    async fn update_group(&self, group: GroupId, update: GroupUpdate) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let group = state
            .groups
            .iter_mut()
            .find(|g| g.id == group)
            .ok_or_else(|| anyhow::anyhow!("no group with id {}", group))?;
        if let Some(title) = update.title {
            group.title = title;
        }
        if let Some(color) = update.color {
            group.color = color;
        }
        if let Some(collapsed) = update.collapsed {
            group.collapsed = collapsed;
        }
        Ok(())
    }

    async fn create_window(&self) -> Result<WindowId> {
        let mut state = self.state.lock().unwrap();
        let window = state.next_window_id;
        state.next_window_id += 1;
        if state.fail_create_window {
            // Hand back an id the host never registers
            return Ok(window);
        }
        state.windows.push(window);
        // A fresh window opens with one blank tab
        let id = state.next_tab_id;
        state.next_tab_id += 1;
        state.tabs.push(Tab {
            id,
            window_id: window,
            url: "chrome://newtab/".to_string(),
            title: "New Tab".to_string(),
            index: 0,
            active: true,
            pinned: false,
            group_id: None,
            favicon: None,
            last_accessed: None,
        });
        Ok(window)
    }

    async fn window_exists(&self, window: WindowId) -> Result<bool> {
        Ok(self.state.lock().unwrap().windows.contains(&window))
    }

    async fn create_tab(&self, window: WindowId, url: &str, pinned: bool) -> Result<Tab> {
        let mut state = self.state.lock().unwrap();
        if !state.windows.contains(&window) {
            anyhow::bail!("no window with id {}", window);
        }
        let id = state.next_tab_id;
        state.next_tab_id += 1;
        let index = state.tabs.iter().filter(|t| t.window_id == window).count() as u32;
        let tab = Tab {
            id,
            window_id: window,
            url: url.to_string(),
            title: String::new(),
            index,
            active: false,
            pinned,
            group_id: None,
            favicon: None,
            last_accessed: None,
        };
        state.tabs.push(tab.clone());
        Ok(tab)
    }

    async fn remove_tabs(&self, tabs: &[TabId]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.tabs.retain(|t| !tabs.contains(&t.id));
        Ok(())
    }

    async fn activate_tab(&self, tab: TabId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let window = state
            .tabs
            .iter()
            .find(|t| t.id == tab)
            .map(|t| t.window_id)
            .ok_or_else(|| anyhow::anyhow!("no tab with id {}", tab))?;
        for t in state.tabs.iter_mut() {
            if t.window_id == window {
                t.active = t.id == tab;
            }
        }
        Ok(())
    }
}

/// Favicon source that never finds a color.
#[allow(dead_code)]
pub struct NoFavicon;

#[async_trait]
impl FaviconColorSource for NoFavicon {
    async fn dominant_color(&self, _domain: &str) -> Result<Option<GroupColor>> {
        Ok(None)
    }
}

/// Favicon source that always resolves to one color.
#[allow(dead_code)]
pub struct FixedFavicon(pub GroupColor);

#[async_trait]
impl FaviconColorSource for FixedFavicon {
    async fn dominant_color(&self, _domain: &str) -> Result<Option<GroupColor>> {
        Ok(Some(self.0))
    }
}
