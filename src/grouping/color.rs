//! Group color selection.
//!
//! Group creation must be visually instant, so color resolution is
//! two-phase: [`default_color`] answers synchronously from a static
//! table, and [`ColorResolver::extract`] later asks the favicon
//! collaborator for a better match, bounded by a timeout. Extraction
//! failures are absorbed; the default always stands.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;

use crate::host::{FaviconColorSource, GroupColor};

/// How long phase two waits for the favicon collaborator before the
/// default color becomes final.
const EXTRACT_TIMEOUT: Duration = Duration::from_secs(3);

/// Well-known domains and the color their brand is closest to. Keys are
/// matched against the lowercased domain, both cleaned ("github") and
/// registrable ("github.com") forms.
const DEFAULT_COLORS: &[(&str, GroupColor)] = &[
    ("google", GroupColor::Blue),
    ("google.com", GroupColor::Blue),
    ("gmail", GroupColor::Red),
    ("youtube", GroupColor::Red),
    ("youtube.com", GroupColor::Red),
    ("facebook", GroupColor::Blue),
    ("facebook.com", GroupColor::Blue),
    ("twitter", GroupColor::Blue),
    ("instagram", GroupColor::Purple),
    ("linkedin", GroupColor::Blue),
    ("tiktok", GroupColor::Red),
    ("discord", GroupColor::Purple),
    ("telegram", GroupColor::Blue),
    ("whatsapp", GroupColor::Green),
    ("github", GroupColor::Grey),
    ("github.com", GroupColor::Grey),
    ("stackoverflow", GroupColor::Orange),
    ("replit", GroupColor::Orange),
    ("vercel", GroupColor::Grey),
    ("netlify", GroupColor::Cyan),
    ("heroku", GroupColor::Purple),
    ("naver", GroupColor::Green),
    ("naver.com", GroupColor::Green),
    ("daum", GroupColor::Orange),
    ("kakao", GroupColor::Yellow),
    ("coupang", GroupColor::Red),
    ("toss", GroupColor::Blue),
    ("amazon", GroupColor::Orange),
    ("amazon.com", GroupColor::Orange),
    ("ebay", GroupColor::Yellow),
    ("aliexpress", GroupColor::Orange),
    ("shopify", GroupColor::Green),
    ("etsy", GroupColor::Orange),
    ("netflix", GroupColor::Red),
    ("netflix.com", GroupColor::Red),
    ("spotify", GroupColor::Green),
    ("apple", GroupColor::Grey),
    ("microsoft", GroupColor::Blue),
    ("steampowered", GroupColor::Blue),
    ("twitch", GroupColor::Purple),
    ("cnn", GroupColor::Red),
    ("bbc", GroupColor::Red),
    ("reuters", GroupColor::Orange),
    ("nytimes", GroupColor::Grey),
    ("theguardian", GroupColor::Blue),
    ("medium", GroupColor::Grey),
    ("reddit", GroupColor::Orange),
    ("reddit.com", GroupColor::Orange),
    ("paypal", GroupColor::Blue),
    ("stripe", GroupColor::Purple),
    ("slack", GroupColor::Purple),
    ("zoom", GroupColor::Blue),
    ("notion", GroupColor::Grey),
    ("trello", GroupColor::Blue),
    ("asana", GroupColor::Red),
    ("dropbox", GroupColor::Blue),
    ("icloud", GroupColor::Blue),
];

/// Substring heuristics applied when no table entry matches, in order.
const KEYWORD_COLORS: &[(&str, GroupColor)] = &[
    ("google", GroupColor::Blue),
    ("youtube", GroupColor::Red),
    ("facebook", GroupColor::Blue),
    ("instagram", GroupColor::Purple),
    ("github", GroupColor::Grey),
    ("naver", GroupColor::Green),
    ("kakao", GroupColor::Yellow),
    ("amazon", GroupColor::Orange),
    ("netflix", GroupColor::Red),
    ("spotify", GroupColor::Green),
    ("reddit", GroupColor::Orange),
    ("shop", GroupColor::Orange),
    ("store", GroupColor::Orange),
    ("blog", GroupColor::Grey),
    ("news", GroupColor::Grey),
    ("video", GroupColor::Red),
    ("tv", GroupColor::Red),
    ("music", GroupColor::Green),
    ("sound", GroupColor::Green),
    ("game", GroupColor::Blue),
    ("pay", GroupColor::Blue),
    ("bank", GroupColor::Blue),
];

/// Phase one: the color a group gets the instant it is created. Total,
/// synchronous, grey when nothing matches.
pub fn default_color(domain: &str) -> GroupColor {
    let domain = domain.to_lowercase();

    if let Some((_, color)) = DEFAULT_COLORS.iter().find(|(name, _)| *name == domain) {
        return *color;
    }

    for (keyword, color) in KEYWORD_COLORS {
        if domain.contains(keyword) {
            return *color;
        }
    }

    GroupColor::Grey
}

/// Phase two of color resolution: best-effort favicon sampling.
#[derive(Clone)]
pub struct ColorResolver {
    favicon: Arc<dyn FaviconColorSource>,
}

impl ColorResolver {
    pub fn new(favicon: Arc<dyn FaviconColorSource>) -> Self {
        Self { favicon }
    }

    /// Ask the favicon collaborator for the domain's dominant color.
    ///
    /// Returns `None` on timeout, lookup error, or missing pixel data;
    /// none of those are surfaced further.
    pub async fn extract(&self, domain: &str) -> Option<GroupColor> {
        match timeout(EXTRACT_TIMEOUT, self.favicon.dominant_color(domain)).await {
            Ok(Ok(color)) => color,
            Ok(Err(e)) => {
                debug!(domain, error = %e, "favicon color lookup failed");
                None
            }
            Err(_) => {
                debug!(domain, "favicon color lookup timed out");
                None
            }
        }
    }
}
