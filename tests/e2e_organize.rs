//! End-to-end organize flow against the mock host.

mod common;

use std::sync::Arc;

use common::{FixedFavicon, MockBrowser, NoFavicon};
use tab_warden::{ColorResolver, GroupColor, Organizer, Settings, SortOrder};

fn organizer(host: &Arc<MockBrowser>) -> Organizer {
    let host_dyn: Arc<dyn tab_warden::HostBrowser> = host.clone();
    Organizer::new(host_dyn, ColorResolver::new(Arc::new(NoFavicon)))
}

fn grouping_settings() -> Settings {
    Settings {
        group_tabs: true,
        ..Settings::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_alphabetical_sort_and_grouping() {
    let host = Arc::new(MockBrowser::new());
    host.seed_tab("https://zeta.com/a", "Zeta A");
    host.seed_tab("https://alpha.com/a", "Alpha A");
    host.seed_tab("https://zeta.com/b", "Zeta B");
    host.seed_tab("https://alpha.com/b", "Alpha B");

    let tabs = host.tabs();
    organizer(&host).organize(&tabs, &grouping_settings()).await.unwrap();

    // All alpha.com tabs come before all zeta.com tabs
    let urls = host.ordered_urls(1);
    assert_eq!(
        urls,
        vec![
            "https://alpha.com/a",
            "https://alpha.com/b",
            "https://zeta.com/a",
            "https://zeta.com/b",
        ]
    );

    // Both domains formed groups titled with the cleaned domain
    let alpha = host.group_titled("alpha.com").expect("alpha.com group");
    let zeta = host.group_titled("zeta.com").expect("zeta.com group");
    assert_eq!(host.members_of(alpha.id).len(), 2);
    assert_eq!(host.members_of(zeta.id).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_organize_is_idempotent_on_group_membership() {
    let host = Arc::new(MockBrowser::new());
    host.seed_tab("https://github.com/a", "A");
    host.seed_tab("https://github.com/b", "B");
    host.seed_tab("https://docs.google.com", "C");
    host.seed_tab("https://mail.google.com", "D");

    let organizer = organizer(&host);
    let settings = grouping_settings();

    let tabs = host.tabs();
    organizer.organize(&tabs, &settings).await.unwrap();
    let after_first = host.group_creations();
    assert_eq!(after_first, 2);

    // Second run with the resulting state creates nothing new
    let tabs = host.tabs();
    organizer.organize(&tabs, &settings).await.unwrap();
    assert_eq!(host.group_creations(), after_first);
}

#[tokio::test(start_paused = true)]
async fn test_singleton_domains_stay_ungrouped() {
    let host = Arc::new(MockBrowser::new());
    let solo = host.seed_tab("https://lonely.example.org", "Solo");
    host.seed_tab("https://github.com/a", "A");
    host.seed_tab("https://github.com/b", "B");

    let tabs = host.tabs();
    organizer(&host).organize(&tabs, &grouping_settings()).await.unwrap();

    assert_eq!(host.tab(solo.id).unwrap().group_id, None);
    assert_eq!(host.groups().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_grouping_disabled_only_sorts() {
    let host = Arc::new(MockBrowser::new());
    host.seed_tab("https://zeta.com/a", "Z");
    host.seed_tab("https://alpha.com/a", "A");
    host.seed_tab("https://zeta.com/b", "Z2");

    let tabs = host.tabs();
    organizer(&host)
        .organize(&tabs, &Settings::default())
        .await
        .unwrap();

    assert!(host.groups().is_empty());
    let urls = host.ordered_urls(1);
    assert_eq!(urls[0], "https://alpha.com/a");
}

#[tokio::test(start_paused = true)]
async fn test_existing_group_is_reused_and_strays_adopted() {
    let host = Arc::new(MockBrowser::new());
    let a = host.seed_tab("https://github.com/a", "A");
    let b = host.seed_tab("https://github.com/b", "B");
    let existing = host.seed_group(1, "github.com", &[a.id]);

    let tabs = host.tabs();
    organizer(&host).organize(&tabs, &grouping_settings()).await.unwrap();

    assert_eq!(host.group_creations(), 0);
    let members = host.members_of(existing);
    assert!(members.contains(&a.id) && members.contains(&b.id));
}

#[tokio::test(start_paused = true)]
async fn test_existing_group_match_is_case_insensitive() {
    let host = Arc::new(MockBrowser::new());
    let a = host.seed_tab("https://github.com/a", "A");
    let b = host.seed_tab("https://github.com/b", "B");
    let existing = host.seed_group(1, "GitHub.com", &[a.id]);

    let tabs = host.tabs();
    organizer(&host).organize(&tabs, &grouping_settings()).await.unwrap();

    assert_eq!(host.group_creations(), 0);
    assert_eq!(host.members_of(existing).len(), 2);
    assert!(host.members_of(existing).contains(&b.id));
}

#[tokio::test(start_paused = true)]
async fn test_tab_count_sort_order() {
    let host = Arc::new(MockBrowser::new());
    host.seed_tab("https://alpha.com/only", "A");
    host.seed_tab("https://zeta.com/a", "Z1");
    host.seed_tab("https://zeta.com/b", "Z2");

    let settings = Settings {
        sort_order: SortOrder::TabCount,
        ..Settings::default()
    };
    let tabs = host.tabs();
    organizer(&host).organize(&tabs, &settings).await.unwrap();

    let urls = host.ordered_urls(1);
    assert_eq!(urls[0], "https://zeta.com/a");
    assert_eq!(urls[2], "https://alpha.com/only");
}

#[tokio::test(start_paused = true)]
async fn test_new_group_gets_known_default_color() {
    let host = Arc::new(MockBrowser::new());
    host.seed_tab("https://netflix.com/a", "A");
    host.seed_tab("https://netflix.com/b", "B");

    let tabs = host.tabs();
    organizer(&host).organize(&tabs, &grouping_settings()).await.unwrap();

    // netflix is in the default color table
    let group = host.group_titled("netflix.com").unwrap();
    assert_eq!(group.color, GroupColor::Red);
}

#[tokio::test(start_paused = true)]
async fn test_favicon_color_overrides_default() {
    let host = Arc::new(MockBrowser::new());
    host.seed_tab("https://obscure-site.dev/a", "A");
    host.seed_tab("https://obscure-site.dev/b", "B");

    let host_dyn: Arc<dyn tab_warden::HostBrowser> = host.clone();
    let organizer = Organizer::new(
        host_dyn,
        ColorResolver::new(Arc::new(FixedFavicon(GroupColor::Pink))),
    );

    let tabs = host.tabs();
    organizer.organize(&tabs, &grouping_settings()).await.unwrap();

    let group = host.group_titled("obscure-site.dev").unwrap();
    assert_eq!(group.color, GroupColor::Pink);
}

#[tokio::test(start_paused = true)]
async fn test_collapse_setting_applies_to_new_groups() {
    let host = Arc::new(MockBrowser::new());
    host.seed_tab("https://github.com/a", "A");
    host.seed_tab("https://github.com/b", "B");

    let settings = Settings {
        group_tabs: true,
        collapse_groups: true,
        ..Settings::default()
    };
    let tabs = host.tabs();
    organizer(&host).organize(&tabs, &settings).await.unwrap();

    assert!(host.group_titled("github.com").unwrap().collapsed);
}
