//! Domain classification.
//!
//! [`clean_domain`] derives the key tabs are grouped and sorted by;
//! [`full_domain`] keeps the registrable suffix and is what favicon
//! lookups use. Both are total functions over arbitrary input and both
//! work off compile-time dictionaries, never network data.

use url::{Host, Url};

/// Second-level labels that combine with a country code into a two-part
/// public suffix ("co.kr", "com.au", ...).
const MULTI_PART_SECOND: &[&str] = &["co", "com", "org", "net", "edu", "gov", "mil", "ac", "ad"];

/// Country codes that appear as the final label of a two-part suffix.
const MULTI_PART_COUNTRY: &[&str] = &[
    "kr", "uk", "jp", "au", "nz", "za", "in", "th", "sg", "my", "ph", "vn", "tw", "hk", "cn", "br",
    "mx", "ar", "cl", "pe", "ve", "ec", "bo", "py", "uy",
];

/// Single-part top-level domains recognized by [`clean_domain`]. Hostnames
/// ending in a label outside this table are treated as internal names and
/// returned whole.
const SINGLE_PART_TLDS: &[&str] = &[
    "com", "org", "net", "edu", "gov", "mil", "int", "io", "ai", "tech", "dev", "app", "info",
    "biz", "name", "mobi", "pro", "asia", "tv", "me", "us", "im", "so", "kr", "jp", "cn", "de",
    "fr", "uk", "ca", "au", "in", "br", "ru", "it", "es", "mx", "nl", "se", "no", "dk", "fi", "pl",
    "tr", "gr", "pt", "cz", "hu", "ro", "ch", "at", "be", "ie", "is",
];

/// Fallback key for input no hostname can be parsed from.
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// The canonical grouping key for a URL.
///
/// The hostname is parsed, lowercased, and stripped of a leading `www.`;
/// then the public suffix is removed and the remaining registrable label
/// is returned:
///
/// - `https://mail.google.com/inbox` → `google`
/// - `https://news.example.co.kr` → `example`
/// - `https://google.com` → `google.com` (two labels, kept whole)
/// - `http://localhost:3000` → `localhost`
/// - garbage input → `unknown`
pub fn clean_domain(url: &str) -> String {
    let Some(host) = hostname(url) else {
        return UNKNOWN_DOMAIN.to_string();
    };

    let host = match host {
        Hostname::Domain(name) => name,
        // IP literals carry no registrable structure
        Hostname::Ip(text) => return text,
    };

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host;
    }

    let last = labels[labels.len() - 1];
    let second = labels[labels.len() - 2];

    if MULTI_PART_SECOND.contains(&second) && MULTI_PART_COUNTRY.contains(&last) {
        return labels[labels.len() - 3].to_string();
    }

    if SINGLE_PART_TLDS.contains(&last) {
        return labels[labels.len() - 2].to_string();
    }

    // Unrecognized final label: likely an internal hostname
    host
}

/// The registrable domain of a URL, keeping the public suffix.
///
/// Mirrors the host's notion of a site: the last two labels, or the last
/// three when the second-to-last label is short enough to be part of a
/// compound suffix (`news.bbc.co.uk` → `bbc.co.uk`).
pub fn full_domain(url: &str) -> String {
    let Some(host) = hostname(url) else {
        return UNKNOWN_DOMAIN.to_string();
    };

    let host = match host {
        Hostname::Domain(name) => name,
        Hostname::Ip(text) => return text,
    };

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host;
    }

    let take = if labels[labels.len() - 2].len() <= 3 {
        3
    } else {
        2
    };
    labels[labels.len() - take..].join(".")
}

enum Hostname {
    Domain(String),
    Ip(String),
}

fn hostname(url: &str) -> Option<Hostname> {
    let parsed = Url::parse(url.trim()).ok()?;
    match parsed.host()? {
        Host::Domain(name) => {
            let name = name.to_lowercase();
            let name = name.strip_prefix("www.").unwrap_or(&name).to_string();
            if name.is_empty() {
                None
            } else {
                Some(Hostname::Domain(name))
            }
        }
        Host::Ipv4(addr) => Some(Hostname::Ip(addr.to_string())),
        Host::Ipv6(addr) => Some(Hostname::Ip(addr.to_string())),
    }
}
