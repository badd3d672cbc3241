use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier for a tab, assigned by the host browser. Ephemeral: valid
/// only until the tab is closed.
pub type TabId = i64;

/// Identifier for a tab group, assigned by the host browser.
pub type GroupId = i64;

/// Identifier for a browser window.
pub type WindowId = i64;

/// Sentinel the host uses for a tab that belongs to no group.
pub const UNGROUPED: GroupId = -1;

/// Point-in-time copy of a browser tab. The host owns the live object;
/// everything here may be stale the moment it is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    pub window_id: WindowId,
    pub url: String,
    pub title: String,
    pub index: u32,
    pub active: bool,
    pub pinned: bool,
    pub group_id: Option<GroupId>,
    pub favicon: Option<String>,
    /// Epoch milliseconds of the last time the tab was focused, if the
    /// host reports it.
    pub last_accessed: Option<i64>,
}

/// Point-in-time copy of a tab group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabGroup {
    pub id: GroupId,
    pub window_id: WindowId,
    pub title: String,
    pub color: GroupColor,
    pub collapsed: bool,
}

/// The nine named colors the host accepts for tab groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupColor {
    Blue,
    Cyan,
    Green,
    #[default]
    Grey,
    Orange,
    Pink,
    Purple,
    Red,
    Yellow,
}

impl std::fmt::Display for GroupColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Blue => "blue",
            Self::Cyan => "cyan",
            Self::Green => "green",
            Self::Grey => "grey",
            Self::Orange => "orange",
            Self::Pink => "pink",
            Self::Purple => "purple",
            Self::Red => "red",
            Self::Yellow => "yellow",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for GroupColor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blue" => Ok(Self::Blue),
            "cyan" => Ok(Self::Cyan),
            "green" => Ok(Self::Green),
            "grey" | "gray" => Ok(Self::Grey),
            "orange" => Ok(Self::Orange),
            "pink" => Ok(Self::Pink),
            "purple" => Ok(Self::Purple),
            "red" => Ok(Self::Red),
            "yellow" => Ok(Self::Yellow),
            _ => anyhow::bail!("invalid group color '{}'", s),
        }
    }
}

/// Partial update applied to a host tab group. Unset fields are left
/// untouched by the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupUpdate {
    pub title: Option<String>,
    pub color: Option<GroupColor>,
    pub collapsed: Option<bool>,
}

impl GroupUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn color(mut self, color: GroupColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = Some(collapsed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_color_round_trip() {
        for name in [
            "blue", "cyan", "green", "grey", "orange", "pink", "purple", "red", "yellow",
        ] {
            let color: GroupColor = name.parse().expect("valid color");
            assert_eq!(color.to_string(), name);
        }
    }

    #[test]
    fn test_group_color_serde_is_lowercase() {
        let json = serde_json::to_string(&GroupColor::Purple).unwrap();
        assert_eq!(json, "\"purple\"");
        let back: GroupColor = serde_json::from_str("\"yellow\"").unwrap();
        assert_eq!(back, GroupColor::Yellow);
    }

    #[test]
    fn test_invalid_color_rejected() {
        assert!("magenta".parse::<GroupColor>().is_err());
    }

    #[test]
    fn test_group_update_builder() {
        let update = GroupUpdate::new().title("work").collapsed(true);
        assert_eq!(update.title.as_deref(), Some("work"));
        assert_eq!(update.collapsed, Some(true));
        assert_eq!(update.color, None);
    }
}
