//! Component extraction from source text.
//!
//! Extraction is best-effort pattern matching over the source file and its
//! markup. A file without a `selector:` declaration is simply not a
//! component; unreadable files are treated the same way.

mod classify;
mod markup;

pub use classify::{classify_app, classify_layer, UNKNOWN};
pub use markup::{child_selectors, style_root, text_content, MAX_TEXT_FRAGMENTS};

use crate::config::LayerRule;
use crate::routes::RouteTable;
use crate::scanner::ScanScope;
use crate::IndexerError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, LazyLock};
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, info};

static SELECTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"selector:\s*['"]([^'"]+)['"]"#).expect("valid regex"));

static TEMPLATE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"templateUrl:\s*['"]([^'"]+)['"]"#).expect("valid regex"));

static INLINE_TEMPLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)template:\s*`([^`]*)`").expect("valid regex"));

static CLASS_EXTENDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"export\s+class\s+(\w+)\s+extends\s+(\w+)").expect("valid regex"));

static CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"export\s+class\s+(\w+)").expect("valid regex"));

/// Markup reference recorded for inline templates.
pub const INLINE_TEMPLATE: &str = "(inline)";

/// Metadata extracted from one component source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Declared selector
    pub selector: String,

    /// Implementation class name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    /// Project-relative path, `/`-separated
    pub file_path: String,

    /// Generation of the owning root
    pub version: String,

    /// App group
    pub app: String,

    /// Structural layer
    pub layer: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_root: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_path: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_selectors: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub text_content: Vec<String>,

    /// Selectors of components whose markup uses this one (set by the index builder)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_selectors: Vec<String>,
}

/// Read-only inputs shared by every extraction in a run.
#[derive(Debug, Clone)]
pub struct ExtractContext {
    pub scope: ScanScope,
    pub routes: RouteTable,
    pub layer_rules: Vec<LayerRule>,
}

impl ExtractContext {
    pub fn new(scope: ScanScope, routes: RouteTable, layer_rules: Vec<LayerRule>) -> Self {
        Self {
            scope,
            routes,
            layer_rules,
        }
    }
}

/// Resolved component markup.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Markup {
    content: String,
    reference: String,
}

/// Extract a component from a project-relative source path.
///
/// Returns `None` for files that are not components, including files that
/// cannot be read or decoded.
pub fn extract(rel_path: &str, ctx: &ExtractContext) -> Option<Component> {
    let abs_path = ctx.scope.absolute(rel_path);

    let source = match std::fs::read_to_string(&abs_path) {
        Ok(source) => source,
        Err(e) => {
            debug!(path = %rel_path, error = %e, "Failed to read component source");
            return None;
        }
    };

    let selector = SELECTOR_RE.captures(&source)?.get(1)?.as_str().to_string();
    let (class_name, base_class) = class_info(&source);

    let root = ctx.scope.owning_root(rel_path);
    let conventions = ctx.scope.conventions();
    let markup = resolve_markup(&abs_path, &source, ctx);
    let markup_text = markup.as_ref().map(|m| m.content.as_str()).unwrap_or_default();

    let sibling_name = |suffix: &str| {
        conventions
            .sibling(&abs_path, suffix)
            .filter(|path| path.is_file())
            .and_then(|path| path.file_name()?.to_str().map(String::from))
    };

    let route_path = ctx
        .routes
        .lookup(class_name.as_deref())
        .map(String::from);

    Some(Component {
        selector,
        file_path: rel_path.to_string(),
        version: root
            .map(|r| r.generation.clone())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        app: root
            .map(|r| classify_app(rel_path, r))
            .unwrap_or_else(|| UNKNOWN.to_string()),
        layer: classify_layer(rel_path, &ctx.layer_rules),
        style_root: style_root(markup_text),
        template_path: markup.as_ref().map(|m| m.reference.clone()),
        style_path: sibling_name(&conventions.style_suffix),
        store_path: sibling_name(&conventions.store_suffix),
        base_class,
        route_path,
        child_selectors: child_selectors(markup_text),
        text_content: text_content(markup_text),
        parent_selectors: Vec::new(),
        class_name,
    })
}

/// Implementation class name and optional base class.
fn class_info(source: &str) -> (Option<String>, Option<String>) {
    if let Some(caps) = CLASS_EXTENDS_RE.captures(source) {
        return (
            caps.get(1).map(|m| m.as_str().to_string()),
            caps.get(2).map(|m| m.as_str().to_string()),
        );
    }
    let class_name = CLASS_RE
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());
    (class_name, None)
}

/// Markup by priority: `templateUrl`, same-stem sibling, inline template.
fn resolve_markup(abs_path: &Path, source: &str, ctx: &ExtractContext) -> Option<Markup> {
    if let Some(url) = TEMPLATE_URL_RE.captures(source).and_then(|caps| caps.get(1)) {
        let url = url.as_str();
        let template_path = abs_path.parent().map(|dir| dir.join(url));
        if let Some(content) = template_path.as_deref().and_then(read_lossy) {
            return Some(Markup {
                content,
                reference: url.to_string(),
            });
        }
    }

    let conventions = ctx.scope.conventions();
    if let Some(sibling) = conventions.sibling(abs_path, &conventions.markup_suffix) {
        if let Some(content) = read_lossy(&sibling) {
            let reference = sibling
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            return Some(Markup { content, reference });
        }
    }

    INLINE_TEMPLATE_RE
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| Markup {
            content: m.as_str().to_string(),
            reference: INLINE_TEMPLATE.to_string(),
        })
}

fn read_lossy(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    std::fs::read(path)
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

/// Result of extracting a batch of files.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub components: Vec<Component>,
    /// Files that produced no component
    pub skipped: usize,
}

/// Extract every path on a bounded pool of blocking workers.
///
/// Returns only once every worker has finished.
pub async fn extract_all(
    ctx: Arc<ExtractContext>,
    paths: Vec<String>,
    parallelism: usize,
) -> Result<Extraction, IndexerError> {
    let start = Instant::now();
    let total = paths.len();
    let batch_size = total.div_ceil(parallelism.max(1)).max(1);

    let mut workers = JoinSet::new();
    for batch in paths.chunks(batch_size) {
        let batch = batch.to_vec();
        let ctx = Arc::clone(&ctx);
        workers.spawn_blocking(move || {
            batch
                .iter()
                .map(|path| extract(path, &ctx))
                .collect::<Vec<_>>()
        });
    }

    let mut extraction = Extraction::default();
    while let Some(result) = workers.join_next().await {
        let results = result.map_err(|e| IndexerError::Worker(e.to_string()))?;
        for component in results {
            match component {
                Some(component) => extraction.components.push(component),
                None => extraction.skipped += 1,
            }
        }
    }

    info!(
        files = total,
        components = extraction.components.len(),
        skipped = extraction.skipped,
        duration_ms = start.elapsed().as_millis(),
        "Extraction complete"
    );

    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IndexConfig, RootConfig};
    use crate::routes::RouteEntry;
    use std::fs;
    use tempfile::tempdir;

    fn context(base: &Path, routes: RouteTable) -> ExtractContext {
        fs::create_dir_all(base.join("web")).unwrap();
        let config = IndexConfig {
            roots: vec![RootConfig {
                path: "web".to_string(),
                generation: "v2".to_string(),
                app_rules: Vec::new(),
                route_globs: Vec::new(),
            }],
            ..Default::default()
        };
        let scope = ScanScope::new(base, &config, None).unwrap();
        ExtractContext::new(scope, routes, config.layer_rules)
    }

    fn write(base: &Path, rel: &str, content: &str) {
        let path = base.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_scenario_style_root_and_children() {
        let temp_dir = tempdir().unwrap();
        let ctx = context(temp_dir.path(), RouteTable::new());
        write(
            temp_dir.path(),
            "web/shop/foo.component.ts",
            "@Component({ selector: 'app-foo', templateUrl: './foo.component.html' })\nexport class FooComponent {}",
        );
        write(
            temp_dir.path(),
            "web/shop/foo.component.html",
            r#"<div class="foo-card"><app-bar></app-bar><h2>Order Summary</h2></div>"#,
        );

        let component = extract("web/shop/foo.component.ts", &ctx).unwrap();

        assert_eq!(component.selector, "app-foo");
        assert_eq!(component.style_root.as_deref(), Some("foo-card"));
        assert_eq!(component.child_selectors, vec!["app-bar"]);
        assert_eq!(component.text_content, vec!["Order Summary"]);
        assert_eq!(component.template_path.as_deref(), Some("./foo.component.html"));
        assert_eq!(component.class_name.as_deref(), Some("FooComponent"));
        assert_eq!(component.version, "v2");
        assert_eq!(component.app, "shop");
        assert_eq!(component.file_path, "web/shop/foo.component.ts");
    }

    #[test]
    fn test_no_selector_is_not_a_component() {
        let temp_dir = tempdir().unwrap();
        let ctx = context(temp_dir.path(), RouteTable::new());
        write(
            temp_dir.path(),
            "web/plain.component.ts",
            "export class NotDecorated {}",
        );

        assert!(extract("web/plain.component.ts", &ctx).is_none());
        assert!(extract("web/missing.component.ts", &ctx).is_none());
    }

    #[test]
    fn test_undecodable_source_is_skipped() {
        let temp_dir = tempdir().unwrap();
        let ctx = context(temp_dir.path(), RouteTable::new());
        let path = temp_dir.path().join("web/bad.component.ts");
        fs::write(&path, [0xff, 0xfe, b's', b'e', b'l']).unwrap();

        assert!(extract("web/bad.component.ts", &ctx).is_none());
    }

    #[test]
    fn test_markup_priority() {
        let temp_dir = tempdir().unwrap();
        let ctx = context(temp_dir.path(), RouteTable::new());

        // Missing templateUrl target falls back to the sibling file
        write(
            temp_dir.path(),
            "web/a/a.component.ts",
            "selector: 'app-a', templateUrl: './gone.html', template: `<b class=\"inline-x\"></b>`",
        );
        write(temp_dir.path(), "web/a/a.component.html", r#"<i class="sibling-x"></i>"#);
        let a = extract("web/a/a.component.ts", &ctx).unwrap();
        assert_eq!(a.template_path.as_deref(), Some("a.component.html"));
        assert_eq!(a.style_root.as_deref(), Some("sibling-x"));

        // No file at all falls back to the inline template
        write(
            temp_dir.path(),
            "web/b/b.component.ts",
            "selector: \"app-b\",\n template: `\n <b class=\"inline-x\"></b>\n`",
        );
        let b = extract("web/b/b.component.ts", &ctx).unwrap();
        assert_eq!(b.template_path.as_deref(), Some(INLINE_TEMPLATE));
        assert_eq!(b.style_root.as_deref(), Some("inline-x"));

        // Nothing resolvable leaves markup fields empty
        write(temp_dir.path(), "web/c/c.component.ts", "selector: 'app-c'");
        let c = extract("web/c/c.component.ts", &ctx).unwrap();
        assert_eq!(c.template_path, None);
        assert!(c.child_selectors.is_empty());
    }

    #[test]
    fn test_siblings_class_info_and_route() {
        let temp_dir = tempdir().unwrap();
        let mut routes = RouteTable::new();
        routes.extend([RouteEntry {
            path: "settings".to_string(),
            component: Some("SettingsPage".to_string()),
        }]);
        let ctx = context(temp_dir.path(), routes);

        write(
            temp_dir.path(),
            "web/s/settings.component.ts",
            "selector: 'app-settings'\nexport class SettingsPage extends BasePage {}",
        );
        write(temp_dir.path(), "web/s/settings.component.scss", "");
        write(temp_dir.path(), "web/s/settings.store.ts", "");

        let component = extract("web/s/settings.component.ts", &ctx).unwrap();
        assert_eq!(component.class_name.as_deref(), Some("SettingsPage"));
        assert_eq!(component.base_class.as_deref(), Some("BasePage"));
        assert_eq!(component.route_path.as_deref(), Some("settings"));
        assert_eq!(component.style_path.as_deref(), Some("settings.component.scss"));
        assert_eq!(component.store_path.as_deref(), Some("settings.store.ts"));
    }

    #[test]
    fn test_optional_fields_omitted_when_serialized() {
        let temp_dir = tempdir().unwrap();
        let ctx = context(temp_dir.path(), RouteTable::new());
        write(temp_dir.path(), "web/x/x.component.ts", "selector: 'app-x'");

        let component = extract("web/x/x.component.ts", &ctx).unwrap();
        let json = serde_json::to_value(&component).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();

        assert_eq!(keys.len(), 5, "keys: {keys:?}");
        assert!(json.get("filePath").is_some());
        assert!(json.get("childSelectors").is_none());
    }

    #[tokio::test]
    async fn test_extract_all_collects_every_result() {
        let temp_dir = tempdir().unwrap();
        let ctx = Arc::new(context(temp_dir.path(), RouteTable::new()));

        let mut paths = Vec::new();
        for i in 0..25 {
            let rel = format!("web/m{i}/c{i}.component.ts");
            let body = if i % 5 == 0 {
                "export class NoSelector {}".to_string()
            } else {
                format!("selector: 'app-c{i}'")
            };
            write(temp_dir.path(), &rel, &body);
            paths.push(rel);
        }

        let extraction = extract_all(ctx, paths, 4).await.unwrap();
        assert_eq!(extraction.components.len(), 20);
        assert_eq!(extraction.skipped, 5);
    }

    #[tokio::test]
    async fn test_extract_all_empty() {
        let temp_dir = tempdir().unwrap();
        let ctx = Arc::new(context(temp_dir.path(), RouteTable::new()));

        let extraction = extract_all(ctx, Vec::new(), 4).await.unwrap();
        assert!(extraction.components.is_empty());
        assert_eq!(extraction.skipped, 0);
    }
}
