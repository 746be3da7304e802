//! Configuration for the component indexer.

use crate::IndexerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Name of the per-project configuration file.
pub const PROJECT_CONFIG_FILE: &str = ".compindex.yaml";

/// Indexer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Scan roots, relative to the project root
    #[serde(default = "default_roots")]
    pub roots: Vec<RootConfig>,

    /// Directory names that exclude a whole subtree
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: BTreeSet<String>,

    /// File naming conventions for components and their assets
    #[serde(default)]
    pub conventions: FileConventions,

    /// Ordered layer classification rules, first match wins
    #[serde(default = "default_layer_rules")]
    pub layer_rules: Vec<LayerRule>,

    /// Index files inside hidden directories
    #[serde(default)]
    pub include_hidden: bool,

    /// Number of extraction workers (0 = available CPUs)
    #[serde(default)]
    pub parallelism: usize,

    /// Timeout for each version-control query
    #[serde(default = "default_git_timeout_secs")]
    pub git_timeout_secs: u64,

    /// Snapshot output path, relative to the project root
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

/// A directory tree holding one generation of components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootConfig {
    /// Path relative to the project root, `/`-separated
    pub path: String,

    /// Generation label recorded as the component `version`
    pub generation: String,

    /// Ordered app grouping rules, first match wins
    #[serde(default)]
    pub app_rules: Vec<AppRule>,

    /// Globs (relative to this root) selecting routing-declaration files
    #[serde(default)]
    pub route_globs: Vec<String>,
}

/// Derives the app group from the path segment following `segment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRule {
    pub segment: String,
    #[serde(default)]
    pub prefix: String,
}

/// Assigns `layer` when every substring in `all_of` occurs in the lowercased path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerRule {
    pub all_of: Vec<String>,
    pub layer: String,
}

/// File-name suffixes tying a component source file to its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConventions {
    #[serde(default = "default_component_suffix")]
    pub component_suffix: String,
    #[serde(default = "default_markup_suffix")]
    pub markup_suffix: String,
    #[serde(default = "default_style_suffix")]
    pub style_suffix: String,
    #[serde(default = "default_store_suffix")]
    pub store_suffix: String,
}

impl FileConventions {
    /// Suffixes of auxiliary files whose changes invalidate their owning component.
    pub fn asset_suffixes(&self) -> [&str; 3] {
        [
            self.markup_suffix.as_str(),
            self.style_suffix.as_str(),
            self.store_suffix.as_str(),
        ]
    }

    /// Map an asset path to the component source path that owns it.
    pub fn owner_of(&self, asset_path: &str) -> Option<String> {
        self.asset_suffixes().into_iter().find_map(|suffix| {
            asset_path
                .strip_suffix(suffix)
                .map(|stem| format!("{stem}{}", self.component_suffix))
        })
    }

    /// Path of a component's sibling file with the given suffix.
    pub fn sibling(&self, component_path: &Path, suffix: &str) -> Option<PathBuf> {
        let name = component_path.file_name()?.to_str()?;
        let stem = name.strip_suffix(&self.component_suffix)?;
        Some(component_path.with_file_name(format!("{stem}{suffix}")))
    }
}

impl Default for FileConventions {
    fn default() -> Self {
        Self {
            component_suffix: default_component_suffix(),
            markup_suffix: default_markup_suffix(),
            style_suffix: default_style_suffix(),
            store_suffix: default_store_suffix(),
        }
    }
}

fn default_component_suffix() -> String {
    ".component.ts".to_string()
}

fn default_markup_suffix() -> String {
    ".component.html".to_string()
}

fn default_style_suffix() -> String {
    ".component.scss".to_string()
}

fn default_store_suffix() -> String {
    ".store.ts".to_string()
}

fn default_roots() -> Vec<RootConfig> {
    vec![
        RootConfig {
            path: "src/WebV2".to_string(),
            generation: "v2".to_string(),
            app_rules: vec![
                AppRule {
                    segment: "apps".to_string(),
                    prefix: String::new(),
                },
                AppRule {
                    segment: "libs".to_string(),
                    prefix: "lib:".to_string(),
                },
            ],
            route_globs: vec![
                "apps/**/routes.ts".to_string(),
                "apps/**/*.routes.ts".to_string(),
            ],
        },
        RootConfig {
            path: "src/Web".to_string(),
            generation: "v1".to_string(),
            app_rules: Vec::new(),
            route_globs: vec!["**/*routing*.ts".to_string(), "**/*routes*.ts".to_string()],
        },
    ]
}

fn default_skip_dirs() -> BTreeSet<String> {
    [
        "node_modules",
        "dist",
        ".angular",
        ".nx",
        "e2e",
        "__tests__",
        "test",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_layer_rules() -> Vec<LayerRule> {
    let rule = |all_of: &[&str], layer: &str| LayerRule {
        all_of: all_of.iter().map(|s| s.to_string()).collect(),
        layer: layer.to_string(),
    };

    vec![
        rule(&["libs/platform-core/"], "platform"),
        rule(&["libs/bravo-common/"], "common"),
        rule(&["libs/bravo-domain/", "/_shared/"], "domain-shared"),
        rule(&["libs/bravo-domain/"], "domain"),
        rule(&["/apps/", "/routes/"], "page"),
        rule(&["/apps/"], "app"),
        rule(&["bravocomponents/"], "common"),
        rule(&["libs/"], "common"),
        rule(&["/shared/"], "shared"),
        rule(&["/pages/"], "page"),
        rule(&["/containers/"], "page"),
    ]
}

fn default_git_timeout_secs() -> u64 {
    30
}

fn default_output() -> PathBuf {
    PathBuf::from("docs/component-index.json")
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            roots: default_roots(),
            skip_dirs: default_skip_dirs(),
            conventions: FileConventions::default(),
            layer_rules: default_layer_rules(),
            include_hidden: false,
            parallelism: 0,
            git_timeout_secs: default_git_timeout_secs(),
            output: default_output(),
        }
    }
}

impl IndexConfig {
    /// Load configuration, falling back to defaults.
    ///
    /// An explicit path must load; otherwise `<project>/.compindex.yaml` and then
    /// the user config directory are tried, and unreadable files are skipped.
    pub fn load(project_root: &Path, explicit: Option<&Path>) -> Result<Self, IndexerError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let candidates = [
            Some(project_root.join(PROJECT_CONFIG_FILE)),
            dirs::config_dir().map(|dir| dir.join("compindex").join("config.yaml")),
        ];

        for path in candidates.into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            match Self::load_from(&path) {
                Ok(config) => {
                    tracing::debug!(path = ?path, "Loaded config");
                    return Ok(config);
                }
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "Failed to load config file");
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, IndexerError> {
        if !path.exists() {
            return Err(IndexerError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a meaningful index.
    pub fn validate(&self) -> Result<(), IndexerError> {
        if self.roots.is_empty() {
            return Err(IndexerError::Config("at least one root is required".into()));
        }
        if self.conventions.component_suffix.is_empty() {
            return Err(IndexerError::Config("component_suffix must not be empty".into()));
        }
        for root in &self.roots {
            if root.generation.is_empty() {
                return Err(IndexerError::Config(format!(
                    "root '{}' has an empty generation label",
                    root.path
                )));
            }
        }
        Ok(())
    }

    /// Effective worker count.
    pub fn worker_count(&self) -> usize {
        if self.parallelism > 0 {
            self.parallelism
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        }
    }
}
