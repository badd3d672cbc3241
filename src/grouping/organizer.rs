//! Tab ordering and group assignment.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{Settings, SortOrder};
use crate::host::{GroupUpdate, HostBrowser, Tab, TabGroup, TabId};

use super::color::{ColorResolver, default_color};
use super::domain::{clean_domain, full_domain};

/// Pause between group mutations. Not a correctness requirement; it keeps
/// the host's tab-strip animations from racing our follow-up calls.
const GROUP_MUTATION_DELAY: Duration = Duration::from_millis(50);

/// Partition tabs into per-domain buckets, preserving the pre-existing
/// relative order within each domain.
pub fn bucket_by_domain(tabs: &[Tab]) -> HashMap<String, Vec<Tab>> {
    let mut buckets: HashMap<String, Vec<Tab>> = HashMap::new();
    for tab in tabs {
        buckets
            .entry(clean_domain(&tab.url))
            .or_default()
            .push(tab.clone());
    }
    buckets
}

/// Compute the order domains are laid out in. Pure; ties always break
/// toward the alphabetical order so the result is deterministic.
pub fn sort_domains(
    buckets: &HashMap<String, Vec<Tab>>,
    order: SortOrder,
    custom: &[String],
) -> Vec<String> {
    let mut domains: Vec<String> = buckets.keys().cloned().collect();
    domains.sort();

    match order {
        SortOrder::Alphabetical => {}
        SortOrder::Recent => {
            domains.sort_by_key(|d| {
                let newest = buckets[d]
                    .iter()
                    .filter_map(|t| t.last_accessed)
                    .max()
                    .unwrap_or(0);
                Reverse(newest)
            });
        }
        SortOrder::TabCount => {
            domains.sort_by_key(|d| Reverse(buckets[d].len()));
        }
        SortOrder::Custom => {
            if !custom.is_empty() {
                domains.sort_by_key(|d| {
                    (
                        custom.iter().position(|c| c == d).unwrap_or(usize::MAX),
                        d.clone(),
                    )
                });
            }
        }
    }

    domains
}

/// Applies domain ordering and grouping to live host state.
pub struct Organizer {
    host: Arc<dyn HostBrowser>,
    colors: ColorResolver,
}

impl Organizer {
    pub fn new(host: Arc<dyn HostBrowser>, colors: ColorResolver) -> Self {
        Self { host, colors }
    }

    /// Sort the given tabs into contiguous per-domain runs, then group
    /// each multi-tab domain. Failures on one domain are logged and the
    /// rest proceed; running twice with unchanged input changes nothing.
    pub async fn organize(&self, tabs: &[Tab], settings: &Settings) -> Result<()> {
        if tabs.is_empty() {
            return Ok(());
        }

        let buckets = bucket_by_domain(tabs);
        let order = sort_domains(&buckets, settings.sort_order, &settings.custom_domain_order);
        debug!(?order, sort_order = ?settings.sort_order, "computed domain order");

        let mut index: u32 = 0;
        for domain in &order {
            for tab in &buckets[domain] {
                if let Err(e) = self.host.move_tab(tab.id, index).await {
                    warn!(tab = tab.id, error = %e, "failed to move tab");
                }
                index += 1;
            }
        }

        if !settings.group_tabs {
            return Ok(());
        }

        for domain in &order {
            let bucket = &buckets[domain];
            // Grouping a single tab is pointless
            if bucket.len() < 2 {
                continue;
            }

            if let Err(e) = self.group_domain(domain, bucket, settings).await {
                warn!(domain, error = %e, "failed to group domain, continuing");
            }

            sleep(GROUP_MUTATION_DELAY).await;
        }

        Ok(())
    }

    async fn group_domain(&self, domain: &str, bucket: &[Tab], settings: &Settings) -> Result<()> {
        match self.find_existing_group(domain).await? {
            Some(group) => {
                let strays: Vec<TabId> = bucket
                    .iter()
                    .filter(|t| t.group_id != Some(group.id))
                    .map(|t| t.id)
                    .collect();
                if strays.is_empty() {
                    return Ok(());
                }

                // Membership in another group conflicts with the add;
                // clear it first.
                let conflicting: Vec<TabId> = bucket
                    .iter()
                    .filter(|t| t.group_id.is_some() && t.group_id != Some(group.id))
                    .map(|t| t.id)
                    .collect();
                if !conflicting.is_empty() {
                    self.host.ungroup_tabs(&conflicting).await?;
                }

                self.host.group_tabs(&strays, Some(group.id), None).await?;
                debug!(domain, group = group.id, added = strays.len(), "reused existing group");
            }
            None => {
                let tab_ids: Vec<TabId> = bucket.iter().map(|t| t.id).collect();
                let group_id = self.host.group_tabs(&tab_ids, None, None).await?;

                let fallback = default_color(domain);
                self.host
                    .update_group(
                        group_id,
                        GroupUpdate::new()
                            .title(domain)
                            .collapsed(settings.collapse_groups)
                            .color(fallback),
                    )
                    .await?;
                info!(domain, group = group_id, tabs = tab_ids.len(), "created group");

                // Favicons live on the registrable domain, not the key
                let favicon_domain = full_domain(&bucket[0].url);
                if let Some(extracted) = self.colors.extract(&favicon_domain).await {
                    if extracted != fallback {
                        if let Err(e) = self
                            .host
                            .update_group(group_id, GroupUpdate::new().color(extracted))
                            .await
                        {
                            debug!(domain, error = %e, "color upgrade failed");
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn find_existing_group(&self, domain: &str) -> Result<Option<TabGroup>> {
        let groups = self.host.all_groups().await?;
        Ok(groups
            .into_iter()
            .find(|g| g.title.eq_ignore_ascii_case(domain)))
    }
}
