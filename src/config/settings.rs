use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::warn;

use anyhow::Result;

use crate::storage::KvStore;

/// Storage keys for synchronized configuration, one key per setting.
pub mod keys {
    pub const GROUP_TABS: &str = "groupTabs";
    pub const COLLAPSE_GROUPS: &str = "collapseGroups";
    pub const SORT_ORDER: &str = "sortOrder";
    pub const CUSTOM_DOMAIN_ORDER: &str = "customDomainOrder";
    pub const AUTO_SAVE_ENABLED: &str = "autoSaveEnabled";
    pub const AUTO_SAVE_TRIGGER: &str = "autoSaveTrigger";
    pub const AUTO_SAVE_INTERVAL: &str = "autoSaveInterval";
    pub const DETECT_TAB_CLOSE: &str = "detectTabClose";
    pub const DETECT_TAB_CREATE: &str = "detectTabCreate";
    pub const DETECT_URL_CHANGE: &str = "detectUrlChange";
    pub const AUTO_SAVE_ALL_WINDOWS: &str = "autoSaveAllWindows";
    pub const NEW_TAB_OVERRIDE: &str = "newTabOverride";
}

/// How domains are ordered before tabs are moved and grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    #[default]
    Alphabetical,
    /// Most recently accessed domain first.
    Recent,
    /// Largest domain bucket first.
    TabCount,
    /// User-provided ordering, remaining domains alphabetical.
    Custom,
}

/// What drives automatic session capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoSaveTrigger {
    /// A recurring timer.
    #[default]
    Time,
    /// Tab create/remove/url-change events.
    Change,
}

/// User configuration, mirrored from the host's synchronized storage.
/// Each field lives under its own storage key; unknown or corrupt values
/// fall back to the field default at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub group_tabs: bool,
    pub collapse_groups: bool,
    pub sort_order: SortOrder,
    pub custom_domain_order: Vec<String>,
    pub auto_save_enabled: bool,
    pub auto_save_trigger: AutoSaveTrigger,
    /// Seconds between timed captures.
    pub auto_save_interval: u64,
    pub detect_tab_close: bool,
    pub detect_tab_create: bool,
    pub detect_url_change: bool,
    pub auto_save_all_windows: bool,
    pub new_tab_override: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            group_tabs: false,
            collapse_groups: false,
            sort_order: SortOrder::Alphabetical,
            custom_domain_order: Vec::new(),
            auto_save_enabled: true,
            auto_save_trigger: AutoSaveTrigger::Time,
            auto_save_interval: 60,
            detect_tab_close: true,
            detect_tab_create: true,
            detect_url_change: true,
            auto_save_all_windows: false,
            new_tab_override: true,
        }
    }
}

impl Settings {
    /// Load every setting from its storage key, falling back to the
    /// default for keys that are unset or hold an unexpected value.
    pub async fn load(kv: &dyn KvStore) -> Result<Self> {
        let d = Settings::default();
        Ok(Settings {
            group_tabs: read_key(kv, keys::GROUP_TABS).await.unwrap_or(d.group_tabs),
            collapse_groups: read_key(kv, keys::COLLAPSE_GROUPS)
                .await
                .unwrap_or(d.collapse_groups),
            sort_order: read_key(kv, keys::SORT_ORDER).await.unwrap_or(d.sort_order),
            custom_domain_order: read_key(kv, keys::CUSTOM_DOMAIN_ORDER)
                .await
                .unwrap_or(d.custom_domain_order),
            auto_save_enabled: read_key(kv, keys::AUTO_SAVE_ENABLED)
                .await
                .unwrap_or(d.auto_save_enabled),
            auto_save_trigger: read_key(kv, keys::AUTO_SAVE_TRIGGER)
                .await
                .unwrap_or(d.auto_save_trigger),
            auto_save_interval: read_key(kv, keys::AUTO_SAVE_INTERVAL)
                .await
                .unwrap_or(d.auto_save_interval),
            detect_tab_close: read_key(kv, keys::DETECT_TAB_CLOSE)
                .await
                .unwrap_or(d.detect_tab_close),
            detect_tab_create: read_key(kv, keys::DETECT_TAB_CREATE)
                .await
                .unwrap_or(d.detect_tab_create),
            detect_url_change: read_key(kv, keys::DETECT_URL_CHANGE)
                .await
                .unwrap_or(d.detect_url_change),
            auto_save_all_windows: read_key(kv, keys::AUTO_SAVE_ALL_WINDOWS)
                .await
                .unwrap_or(d.auto_save_all_windows),
            new_tab_override: read_key(kv, keys::NEW_TAB_OVERRIDE)
                .await
                .unwrap_or(d.new_tab_override),
        })
    }

    /// Write every setting back under its storage key.
    pub async fn persist(&self, kv: &dyn KvStore) -> Result<()> {
        kv.set(keys::GROUP_TABS, serde_json::json!(self.group_tabs))
            .await?;
        kv.set(keys::COLLAPSE_GROUPS, serde_json::json!(self.collapse_groups))
            .await?;
        kv.set(keys::SORT_ORDER, serde_json::to_value(self.sort_order)?)
            .await?;
        kv.set(
            keys::CUSTOM_DOMAIN_ORDER,
            serde_json::to_value(&self.custom_domain_order)?,
        )
        .await?;
        kv.set(
            keys::AUTO_SAVE_ENABLED,
            serde_json::json!(self.auto_save_enabled),
        )
        .await?;
        kv.set(
            keys::AUTO_SAVE_TRIGGER,
            serde_json::to_value(self.auto_save_trigger)?,
        )
        .await?;
        kv.set(
            keys::AUTO_SAVE_INTERVAL,
            serde_json::json!(self.auto_save_interval),
        )
        .await?;
        kv.set(
            keys::DETECT_TAB_CLOSE,
            serde_json::json!(self.detect_tab_close),
        )
        .await?;
        kv.set(
            keys::DETECT_TAB_CREATE,
            serde_json::json!(self.detect_tab_create),
        )
        .await?;
        kv.set(
            keys::DETECT_URL_CHANGE,
            serde_json::json!(self.detect_url_change),
        )
        .await?;
        kv.set(
            keys::AUTO_SAVE_ALL_WINDOWS,
            serde_json::json!(self.auto_save_all_windows),
        )
        .await?;
        kv.set(
            keys::NEW_TAB_OVERRIDE,
            serde_json::json!(self.new_tab_override),
        )
        .await?;
        Ok(())
    }
}

async fn read_key<T: DeserializeOwned>(kv: &dyn KvStore, key: &str) -> Option<T> {
    match kv.get(key).await {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(key, error = %e, "ignoring unexpected setting value");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(key, error = %e, "failed to read setting");
            None
        }
    }
}
