//! Facts pulled from component markup by independent pattern matchers.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Maximum number of visible text fragments kept per component.
pub const MAX_TEXT_FRAGMENTS: usize = 15;

const MIN_TEXT_LEN: usize = 3;
const MAX_TEXT_LEN: usize = 50;

static CLASS_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"class="([a-z][a-z0-9-]*(?:__[a-z0-9-]+)?)"#).expect("valid regex")
});

/// Project-prefixed tags, or any tag with at least three hyphenated segments.
static CUSTOM_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<((?:app-|bravo-|platform-)[a-z0-9-]+|[a-z]+-[a-z]+-[a-z0-9-]+)[^>]*>")
        .expect("valid regex")
});

static VISIBLE_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r">\s*([A-Z][A-Za-z0-9 ,.'&/()-]{2,50})\s*<").expect("valid regex")
});

/// Layout and display helpers that never name a style block.
const UTILITY_CLASSES: &[&str] = &[
    "flex", "grid", "hidden", "block", "inline", "relative", "absolute", "fixed", "sticky",
    "static", "container", "row", "col", "wrap", "overflow", "d-flex", "d-grid", "d-block",
    "d-none", "d-inline", "w-full", "h-full", "m-auto", "p-0", "text-center",
];

/// Hyphenated elements that are framework structure or third-party widgets.
///
/// Standard HTML elements never contain a hyphen, so only these need listing.
const NON_COMPONENT_TAGS: &[&str] = &[
    "ng-container",
    "ng-template",
    "ng-content",
    "router-outlet",
    "mat-icon",
    "mat-spinner",
    "mat-tab",
    "mat-tab-group",
    "p-table",
    "p-column",
    "p-dropdown",
    "p-dialog",
    "as-split",
    "as-split-area",
];

/// Block name of the first non-utility `class="..."` value.
pub fn style_root(markup: &str) -> Option<String> {
    CLASS_ATTR_RE
        .captures_iter(markup)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().split("__").next().unwrap_or_default())
        .find(|block| !block.is_empty() && !UTILITY_CLASSES.contains(block))
        .map(String::from)
}

/// Component tags used in the markup, sorted and deduplicated.
///
/// Two-segment tags outside the project prefixes are third-party widgets.
pub fn child_selectors(markup: &str) -> Vec<String> {
    CUSTOM_TAG_RE
        .captures_iter(markup)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .filter(|tag| !tag.starts_with("ng-") && !NON_COMPONENT_TAGS.contains(tag))
        .map(String::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Visible static text between tags, sorted, deduplicated and capped.
pub fn text_content(markup: &str) -> Vec<String> {
    VISIBLE_TEXT_RE
        .captures_iter(markup)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim()))
        .filter(|text| {
            (MIN_TEXT_LEN..=MAX_TEXT_LEN).contains(&text.len())
                && !text.starts_with("{{")
                && !text.starts_with("*ng")
        })
        .map(String::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .take(MAX_TEXT_FRAGMENTS)
        .collect()
}
