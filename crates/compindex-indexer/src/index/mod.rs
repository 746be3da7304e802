//! Index snapshot representing every component in the project.
//!
//! The component collection is authoritative; every other map in the
//! snapshot is derived from it by [`IndexBuilder`].

mod builder;

pub use builder::IndexBuilder;

use crate::extract::Component;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot format version written to and expected from disk.
pub const SNAPSHOT_FORMAT_VERSION: &str = "1.0.0";

/// The complete persisted index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSnapshot {
    /// Format version for compatibility
    pub version: String,

    /// When this snapshot was built
    pub generated_at: DateTime<Utc>,

    /// Summary statistics
    pub stats: IndexStats,

    /// Every component, sorted by file path
    pub components: Vec<Component>,

    /// app → route path → file path
    pub routes: BTreeMap<String, BTreeMap<String, String>>,

    /// selector → file paths
    pub selector_index: BTreeMap<String, Vec<String>>,

    /// style root → file paths
    pub style_index: BTreeMap<String, Vec<String>>,

    /// child selector → parent selectors
    pub parent_index: BTreeMap<String, Vec<String>>,
}

impl IndexSnapshot {
    /// Component by project-relative path.
    pub fn component(&self, file_path: &str) -> Option<&Component> {
        self.components
            .binary_search_by(|c| c.file_path.as_str().cmp(file_path))
            .ok()
            .map(|i| &self.components[i])
    }

    /// Equal in everything but the build timestamp.
    pub fn same_content(&self, other: &Self) -> bool {
        self.version == other.version
            && self.stats == other.stats
            && self.components == other.components
            && self.routes == other.routes
            && self.selector_index == other.selector_index
            && self.style_index == other.style_index
            && self.parent_index == other.parent_index
    }
}

/// Summary statistics over the component collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub total: usize,
    pub by_version: BTreeMap<String, usize>,
    pub by_layer: BTreeMap<String, usize>,
    pub with_routes: usize,
    pub with_style_root: usize,
    pub with_stylesheet: usize,
    pub with_store: usize,
}

impl IndexStats {
    /// Compute statistics for a component collection.
    pub fn compute(components: &[Component]) -> Self {
        let mut stats = Self {
            total: components.len(),
            ..Default::default()
        };

        for component in components {
            *stats.by_version.entry(component.version.clone()).or_default() += 1;
            *stats.by_layer.entry(component.layer.clone()).or_default() += 1;
            stats.with_routes += usize::from(component.route_path.is_some());
            stats.with_style_root += usize::from(component.style_root.is_some());
            stats.with_stylesheet += usize::from(component.style_path.is_some());
            stats.with_store += usize::from(component.store_path.is_some());
        }

        stats
    }
}
