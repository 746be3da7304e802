//! Run orchestration: full scans and incremental merges.
//!
//! An incremental run loads the previous snapshot, asks version control
//! what changed, drops stale records, re-extracts only the changed files
//! and rebuilds every derived index. Without a usable snapshot it degrades
//! to a full scan. The snapshot on disk is replaced only at the end of a
//! successful run.

use crate::config::IndexConfig;
use crate::extract::{extract_all, ExtractContext};
use crate::index::{IndexBuilder, IndexSnapshot};
use crate::routes::RouteTable;
use crate::scanner::{discover_all, discover_changed, GitCli, ScanScope, VersionControl};
use crate::storage::SnapshotStore;
use crate::IndexerError;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How to find the files to index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanMode {
    /// Walk every configured root
    Full,
    /// Re-index only what changed since `base_ref`
    Incremental { base_ref: String },
}

/// Per-run options.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Project root; scan roots and relative outputs resolve against it
    pub project_root: PathBuf,
    /// Snapshot location; defaults to the configured output
    pub output: Option<PathBuf>,
    pub mode: ScanMode,
    /// Restrict scanning to roots with this generation label
    pub only_generation: Option<String>,
}

impl IndexOptions {
    /// Full scan of `project_root` with the configured output.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            output: None,
            mode: ScanMode::Full,
            only_generation: None,
        }
    }
}

/// What kind of rebuild produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Full,
    Incremental {
        /// Components extracted from changed or added files
        reindexed: usize,
        /// Components present before and gone now
        deleted: usize,
    },
}

/// Result of a run that wrote a snapshot.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub snapshot: IndexSnapshot,
    pub kind: RunKind,
    /// Files that yielded no component
    pub skipped: usize,
    pub output: PathBuf,
    pub duration: Duration,
}

/// Outcome of [`Indexer::run`].
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Nothing changed; the snapshot was left untouched
    UpToDate { output: PathBuf },
    /// A new snapshot was written
    Rebuilt(Box<RunReport>),
}

/// Drives one indexing run.
pub struct Indexer {
    config: IndexConfig,
    options: IndexOptions,
    vcs: Arc<dyn VersionControl>,
}

impl Indexer {
    /// Create an indexer that queries git in the project root.
    pub fn new(config: IndexConfig, options: IndexOptions) -> Self {
        let vcs = Arc::new(GitCli::new(
            &options.project_root,
            Duration::from_secs(config.git_timeout_secs),
        ));
        Self {
            config,
            options,
            vcs,
        }
    }

    /// Replace the version-control backend.
    pub fn with_version_control(mut self, vcs: Arc<dyn VersionControl>) -> Self {
        self.vcs = vcs;
        self
    }

    /// Absolute snapshot location.
    pub fn output_path(&self) -> PathBuf {
        let output = self.options.output.as_ref().unwrap_or(&self.config.output);
        if output.is_absolute() {
            output.clone()
        } else {
            self.options.project_root.join(output)
        }
    }

    /// Run the configured scan and persist the result.
    pub async fn run(&self) -> Result<RunOutcome, IndexerError> {
        let start = Instant::now();
        let scope = ScanScope::new(
            &self.options.project_root,
            &self.config,
            self.options.only_generation.as_deref(),
        )?;
        let store = SnapshotStore::new(self.output_path());

        match &self.options.mode {
            ScanMode::Full => self.full_scan(scope, &store, start).await,
            ScanMode::Incremental { base_ref } => match store.load().await {
                Some(previous) => {
                    self.incremental_scan(scope, &store, previous, base_ref, start)
                        .await
                }
                None => {
                    info!(path = ?store.path(), "No usable snapshot, falling back to full scan");
                    self.full_scan(scope, &store, start).await
                }
            },
        }
    }

    async fn full_scan(
        &self,
        scope: ScanScope,
        store: &SnapshotStore,
        start: Instant,
    ) -> Result<RunOutcome, IndexerError> {
        let (components, route_files) = discover(&scope).await?;
        let routes = RouteTable::from_files(&route_files);
        let ctx = Arc::new(ExtractContext::new(
            scope,
            routes,
            self.config.layer_rules.clone(),
        ));

        let extraction = extract_all(ctx, components, self.config.worker_count()).await?;
        if extraction.components.is_empty() {
            warn!("No components found under the configured roots");
        }

        let snapshot = IndexBuilder::build(extraction.components);
        store.save(&snapshot).await?;

        info!(
            components = snapshot.stats.total,
            skipped = extraction.skipped,
            duration_ms = start.elapsed().as_millis(),
            "Full index complete"
        );

        Ok(RunOutcome::Rebuilt(Box::new(RunReport {
            snapshot,
            kind: RunKind::Full,
            skipped: extraction.skipped,
            output: store.path().to_path_buf(),
            duration: start.elapsed(),
        })))
    }

    async fn incremental_scan(
        &self,
        scope: ScanScope,
        store: &SnapshotStore,
        previous: IndexSnapshot,
        base_ref: &str,
        start: Instant,
    ) -> Result<RunOutcome, IndexerError> {
        // Route declarations are cheap to re-read and can move any component
        let (_, route_files) = discover(&scope).await?;
        let routes = RouteTable::from_files(&route_files);

        let mut changes = discover_changed(self.vcs.as_ref(), &scope, base_ref).await;

        for component in &previous.components {
            if !scope.admits(&component.file_path) {
                debug!(path = %component.file_path, "Component left the scan scope");
                changes.deleted.insert(component.file_path.clone());
                continue;
            }
            if changes.changed.contains(&component.file_path)
                || changes.deleted.contains(&component.file_path)
            {
                continue;
            }
            let current = routes.lookup(component.class_name.as_deref());
            if current != component.route_path.as_deref() {
                debug!(path = %component.file_path, "Route mapping changed");
                changes.changed.insert(component.file_path.clone());
            }
        }

        if changes.is_empty() {
            info!(base_ref = %base_ref, "No component changes detected");
            return Ok(RunOutcome::UpToDate {
                output: store.path().to_path_buf(),
            });
        }

        let previous_paths: BTreeSet<String> = previous
            .components
            .iter()
            .map(|c| c.file_path.clone())
            .collect();

        let mut components = previous.components;
        components.retain(|c| {
            !changes.changed.contains(&c.file_path) && !changes.deleted.contains(&c.file_path)
        });

        let to_extract: Vec<String> = changes
            .changed
            .iter()
            .filter(|path| scope.absolute(path).is_file())
            .cloned()
            .collect();

        let ctx = Arc::new(ExtractContext::new(
            scope,
            routes,
            self.config.layer_rules.clone(),
        ));
        let extraction = extract_all(ctx, to_extract, self.config.worker_count()).await?;
        let reindexed = extraction.components.len();
        components.extend(extraction.components);

        let snapshot = IndexBuilder::build(components);
        let deleted = previous_paths
            .iter()
            .filter(|path| snapshot.component(path).is_none())
            .count();
        store.save(&snapshot).await?;

        info!(
            reindexed,
            deleted,
            total = snapshot.stats.total,
            duration_ms = start.elapsed().as_millis(),
            "Incremental index complete"
        );

        Ok(RunOutcome::Rebuilt(Box::new(RunReport {
            snapshot,
            kind: RunKind::Incremental { reindexed, deleted },
            skipped: extraction.skipped,
            output: store.path().to_path_buf(),
            duration: start.elapsed(),
        })))
    }
}

/// Walk the scope off the async runtime.
async fn discover(scope: &ScanScope) -> Result<(Vec<String>, Vec<PathBuf>), IndexerError> {
    let scope = scope.clone();
    let discovered = tokio::task::spawn_blocking(move || discover_all(&scope))
        .await
        .map_err(|e| IndexerError::Worker(e.to_string()))??;
    Ok((discovered.components, discovered.route_files))
}
