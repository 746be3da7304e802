//! Route table extraction from routing-declaration files.
//!
//! Paths and component references are matched independently and paired by
//! position: the i-th `path:` goes with the i-th `component:`. Files that
//! interleave several route arrays can therefore mis-pair entries.

use regex::Regex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::{debug, info};

static ROUTE_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"path:\s*['"]([^'"]*)['"]"#).expect("valid regex"));

static ROUTE_COMPONENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"component:\s*(\w+)").expect("valid regex"));

/// Wildcard route that never maps to a component.
const WILDCARD_PATH: &str = "**";

/// One declared route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub path: String,
    pub component: Option<String>,
}

/// Extract route entries from routing-file source text.
pub fn extract_routes(content: &str) -> Vec<RouteEntry> {
    let components: Vec<&str> = ROUTE_COMPONENT_RE
        .captures_iter(content)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    ROUTE_PATH_RE
        .captures_iter(content)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .enumerate()
        .filter(|(_, path)| !path.is_empty() && *path != WILDCARD_PATH)
        .map(|(i, path)| RouteEntry {
            path: path.to_string(),
            component: components.get(i).map(|c| c.to_string()),
        })
        .collect()
}

/// Component class name → route path lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: BTreeMap<String, String>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from routing files, read in the given order.
    ///
    /// Unreadable files are skipped.
    pub fn from_files(files: &[PathBuf]) -> Self {
        let mut table = Self::new();
        for file in files {
            match std::fs::read_to_string(file) {
                Ok(content) => table.extend(extract_routes(&content)),
                Err(e) => debug!(path = ?file, error = %e, "Failed to read routing file"),
            }
        }
        info!(
            files = files.len(),
            mappings = table.len(),
            "Route table built"
        );
        table
    }

    /// Add entries; the first mapping for a component name wins.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = RouteEntry>) {
        for entry in entries {
            if let Some(component) = entry.component {
                self.routes.entry(component).or_insert(entry.path);
            }
        }
    }

    /// Route path for a component class.
    pub fn lookup(&self, class_name: Option<&str>) -> Option<&str> {
        class_name
            .and_then(|name| self.routes.get(name))
            .map(String::as_str)
    }

    /// Number of mapped components.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no component is mapped.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
