//! Path-based classification through ordered rule tables.

use crate::config::LayerRule;
use crate::scanner::ScopeRoot;

/// Label used when no rule matches.
pub const UNKNOWN: &str = "unknown";

/// Structural layer of a component: the first rule whose substrings all occur wins.
pub fn classify_layer(rel_path: &str, rules: &[LayerRule]) -> String {
    let path = rel_path.replace('\\', "/").to_lowercase();

    rules
        .iter()
        .find(|rule| {
            !rule.all_of.is_empty()
                && rule
                    .all_of
                    .iter()
                    .all(|needle| path.contains(&needle.to_lowercase()))
        })
        .map(|rule| rule.layer.clone())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// App group of a component inside `root`.
///
/// Each app rule names an anchor directory; the directory right after it is
/// the app. A root without app rules groups by its first directory; a root
/// whose rules all miss yields `unknown`.
pub fn classify_app(rel_path: &str, root: &ScopeRoot) -> String {
    let Some(inner) = root.relative(rel_path) else {
        return UNKNOWN.to_string();
    };

    let segments: Vec<&str> = inner.split('/').collect();
    let Some((_file, dirs)) = segments.split_last() else {
        return UNKNOWN.to_string();
    };

    if !root.app_rules.is_empty() {
        return root
            .app_rules
            .iter()
            .find_map(|rule| {
                let pos = dirs.iter().position(|dir| *dir == rule.segment)?;
                dirs.get(pos + 1).map(|app| format!("{}{}", rule.prefix, app))
            })
            .unwrap_or_else(|| UNKNOWN.to_string());
    }

    dirs.first()
        .map(|dir| dir.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}
