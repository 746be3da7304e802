//! Component file discovery.
//!
//! Full scans walk every configured root; incremental runs ask version
//! control for the change set instead. Both paths pass candidates through
//! the same [`ScanScope`] predicate so they agree on what is indexable.

mod git;
mod walker;

pub use git::{discover_changed, ChangeSet, GitCli, VersionControl};
pub use walker::Walker;

use crate::config::{AppRule, FileConventions, IndexConfig};
use crate::IndexerError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// A scan root resolved against the project.
#[derive(Debug, Clone)]
pub struct ScopeRoot {
    /// Path relative to the project root, `/`-separated, no trailing slash
    pub path: String,
    /// Generation label
    pub generation: String,
    /// Ordered app grouping rules
    pub app_rules: Vec<AppRule>,
    route_globs: GlobSet,
}

impl ScopeRoot {
    /// Path of `rel_path` below this root, if it lies inside it.
    pub fn relative<'a>(&self, rel_path: &'a str) -> Option<&'a str> {
        rel_path
            .strip_prefix(self.path.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
    }

    /// Whether a root-relative path names a routing-declaration file.
    pub fn is_route_file(&self, root_relative: &str) -> bool {
        self.route_globs.is_match(root_relative)
    }
}

/// Everything that decides whether a project-relative path is indexable.
#[derive(Debug, Clone)]
pub struct ScanScope {
    project_root: PathBuf,
    roots: Vec<ScopeRoot>,
    skip_dirs: BTreeSet<String>,
    conventions: FileConventions,
    include_hidden: bool,
}

impl ScanScope {
    /// Resolve the configured roots against `project_root`.
    ///
    /// Fails when the project root is missing or when none of the selected
    /// roots exists on disk.
    pub fn new(
        project_root: &Path,
        config: &IndexConfig,
        only_generation: Option<&str>,
    ) -> Result<Self, IndexerError> {
        let project_root = project_root
            .canonicalize()
            .map_err(|_| IndexerError::NotFound(project_root.to_path_buf()))?;

        let mut roots = Vec::new();
        for root in &config.roots {
            if only_generation.is_some_and(|generation| generation != root.generation) {
                continue;
            }
            let mut builder = GlobSetBuilder::new();
            for pattern in &root.route_globs {
                builder.add(Glob::new(pattern)?);
            }
            roots.push(ScopeRoot {
                path: normalize_path(&root.path).trim_end_matches('/').to_string(),
                generation: root.generation.clone(),
                app_rules: root.app_rules.clone(),
                route_globs: builder.build()?,
            });
        }

        let scope = Self {
            project_root,
            roots,
            skip_dirs: config.skip_dirs.clone(),
            conventions: config.conventions.clone(),
            include_hidden: config.include_hidden,
        };

        let existing = scope
            .roots
            .iter()
            .filter(|root| scope.absolute(&root.path).is_dir())
            .count();
        if existing == 0 {
            let missing = scope
                .roots
                .first()
                .map(|root| scope.absolute(&root.path))
                .unwrap_or_else(|| scope.project_root.clone());
            return Err(IndexerError::NotFound(missing));
        }

        Ok(scope)
    }

    /// Canonical project root.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Selected scan roots.
    pub fn roots(&self) -> &[ScopeRoot] {
        &self.roots
    }

    /// File naming conventions.
    pub fn conventions(&self) -> &FileConventions {
        &self.conventions
    }

    /// Absolute path of a project-relative path.
    pub fn absolute(&self, rel_path: &str) -> PathBuf {
        self.project_root.join(rel_path)
    }

    /// Project-relative, `/`-separated form of an absolute path.
    pub fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.project_root).ok()?;
        let parts: Vec<&str> = rel
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(parts.join("/"))
    }

    /// First root containing `rel_path`.
    pub fn owning_root(&self, rel_path: &str) -> Option<&ScopeRoot> {
        self.roots
            .iter()
            .find(|root| root.relative(rel_path).is_some())
    }

    /// Whether any path segment is skip-listed or hidden.
    pub fn is_excluded(&self, rel_path: &str) -> bool {
        rel_path.split('/').any(|segment| {
            self.skip_dirs.contains(segment)
                || (!self.include_hidden && segment.starts_with('.') && segment.len() > 1)
        })
    }

    /// Whether `rel_path` is a component source file inside the scan scope.
    pub fn admits(&self, rel_path: &str) -> bool {
        rel_path.ends_with(&self.conventions.component_suffix)
            && self.owning_root(rel_path).is_some()
            && !self.is_excluded(rel_path)
    }
}

/// Files found by a full walk of the scan scope.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredFiles {
    /// Component source files, project-relative, sorted
    pub components: Vec<String>,
    /// Routing-declaration files, absolute, sorted
    pub route_files: Vec<PathBuf>,
}

/// Walk every selected root and collect component and routing files.
pub fn discover_all(scope: &ScanScope) -> Result<DiscoveredFiles, IndexerError> {
    let start = Instant::now();
    let mut discovered = DiscoveredFiles::default();

    for root in scope.roots() {
        let root_dir = scope.absolute(&root.path);
        if !root_dir.is_dir() {
            warn!(root = %root.path, "Scan root does not exist, skipping");
            continue;
        }

        let walker = Walker::new(&root_dir, scope.include_hidden, &scope.skip_dirs);
        for path in walker.walk()? {
            let Some(rel) = scope.relative(&path) else {
                continue;
            };
            if scope.admits(&rel) {
                discovered.components.push(rel);
            } else if root
                .relative(&rel)
                .is_some_and(|inner| root.is_route_file(inner))
                && !scope.is_excluded(&rel)
            {
                discovered.route_files.push(path);
            }
        }

        debug!(root = %root.path, generation = %root.generation, "Root walked");
    }

    discovered.components.sort();
    discovered.components.dedup();
    discovered.route_files.sort();
    discovered.route_files.dedup();

    info!(
        components = discovered.components.len(),
        route_files = discovered.route_files.len(),
        duration_ms = start.elapsed().as_millis(),
        "Discovery complete"
    );

    Ok(discovered)
}

/// Normalize separators to `/`.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}
