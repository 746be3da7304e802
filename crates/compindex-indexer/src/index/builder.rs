//! Index builder from a complete component collection.

use super::{IndexSnapshot, IndexStats, SNAPSHOT_FORMAT_VERSION};
use crate::extract::Component;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Builds a snapshot from components, always from scratch.
pub struct IndexBuilder;

impl IndexBuilder {
    /// Build a snapshot stamped with the current time.
    pub fn build(components: Vec<Component>) -> IndexSnapshot {
        Self::build_at(components, Utc::now())
    }

    /// Build a snapshot with an explicit timestamp.
    pub fn build_at(components: Vec<Component>, generated_at: DateTime<Utc>) -> IndexSnapshot {
        // One record per path; a later record replaces an earlier one
        let mut by_path: BTreeMap<String, Component> = BTreeMap::new();
        for component in components {
            by_path.insert(component.file_path.clone(), component);
        }
        let mut components: Vec<Component> = by_path.into_values().collect();

        let selector_index = group(
            components
                .iter()
                .map(|c| (c.selector.clone(), c.file_path.clone())),
        );
        let style_index = group(components.iter().filter_map(|c| {
            c.style_root
                .as_ref()
                .map(|root| (root.clone(), c.file_path.clone()))
        }));
        let parent_index = group(components.iter().flat_map(|parent| {
            parent
                .child_selectors
                .iter()
                .map(|child| (child.clone(), parent.selector.clone()))
        }));

        for component in &mut components {
            component.parent_selectors = parent_index
                .get(&component.selector)
                .cloned()
                .unwrap_or_default();
        }

        let mut routes: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for component in &components {
            let Some(route_path) = &component.route_path else {
                continue;
            };
            let previous = routes
                .entry(component.app.clone())
                .or_default()
                .insert(route_path.clone(), component.file_path.clone());
            if let Some(previous) = previous {
                warn!(
                    app = %component.app,
                    route = %route_path,
                    replaced = %previous,
                    by = %component.file_path,
                    "Route claimed by more than one component"
                );
            }
        }

        let stats = IndexStats::compute(&components);
        debug!(
            components = stats.total,
            selectors = selector_index.len(),
            style_roots = style_index.len(),
            "Index built"
        );

        IndexSnapshot {
            version: SNAPSHOT_FORMAT_VERSION.to_string(),
            generated_at,
            stats,
            components,
            routes,
            selector_index,
            style_index,
            parent_index,
        }
    }
}

/// Group pairs into sorted, deduplicated buckets.
fn group(pairs: impl Iterator<Item = (String, String)>) -> BTreeMap<String, Vec<String>> {
    let mut buckets: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (key, value) in pairs {
        buckets.entry(key).or_default().insert(value);
    }
    buckets
        .into_iter()
        .map(|(key, values)| (key, values.into_iter().collect()))
        .collect()
}
