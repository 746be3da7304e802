//! Version-control change detection for incremental runs.

use super::{normalize_path, ScanScope};
use crate::IndexerError;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Read-only queries against the project's version control.
///
/// Paths are returned relative to the project root. Patterns are git
/// pathspec globs such as `*.component.ts`.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Tracked files added, modified or copied relative to `base_ref`.
    async fn changed_files(
        &self,
        base_ref: &str,
        patterns: &[String],
    ) -> Result<Vec<String>, IndexerError>;

    /// Untracked files not excluded by ignore rules.
    async fn untracked_files(&self, patterns: &[String]) -> Result<Vec<String>, IndexerError>;

    /// Tracked files deleted relative to `base_ref`.
    async fn deleted_files(
        &self,
        base_ref: &str,
        patterns: &[String],
    ) -> Result<Vec<String>, IndexerError>;
}

/// Git adapter that shells out to the `git` CLI.
pub struct GitCli {
    workdir: PathBuf,
    timeout: Duration,
}

impl GitCli {
    /// Create an adapter running git in `workdir`.
    pub fn new(workdir: &Path, timeout: Duration) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
            timeout,
        }
    }

    async fn run(&self, args: &[&str], patterns: &[String]) -> Result<Vec<String>, IndexerError> {
        let mut command = Command::new("git");
        command
            .args(args)
            .arg("--")
            .args(patterns)
            .current_dir(&self.workdir)
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                IndexerError::VersionControl(format!(
                    "git {} timed out after {:?}",
                    args.join(" "),
                    self.timeout
                ))
            })?
            .map_err(|e| IndexerError::VersionControl(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(IndexerError::VersionControl(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }

        // `-z` output: NUL-terminated, never quoted or escaped
        Ok(output
            .stdout
            .split(|byte| *byte == 0)
            .filter(|path| !path.is_empty())
            .map(|path| String::from_utf8_lossy(path).into_owned())
            .collect())
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn changed_files(
        &self,
        base_ref: &str,
        patterns: &[String],
    ) -> Result<Vec<String>, IndexerError> {
        self.run(
            &[
                "diff",
                "--name-only",
                "-z",
                "--no-renames",
                "--relative",
                "--diff-filter=AMC",
                base_ref,
            ],
            patterns,
        )
        .await
    }

    async fn untracked_files(&self, patterns: &[String]) -> Result<Vec<String>, IndexerError> {
        self.run(&["ls-files", "-z", "--others", "--exclude-standard"], patterns)
            .await
    }

    async fn deleted_files(
        &self,
        base_ref: &str,
        patterns: &[String],
    ) -> Result<Vec<String>, IndexerError> {
        self.run(
            &[
                "diff",
                "--name-only",
                "-z",
                "--no-renames",
                "--relative",
                "--diff-filter=D",
                base_ref,
            ],
            patterns,
        )
        .await
    }
}

/// Component paths affected since a base revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Added, modified or asset-touched component paths
    pub changed: BTreeSet<String>,
    /// Deleted component paths
    pub deleted: BTreeSet<String>,
}

impl ChangeSet {
    /// No changes at all.
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.deleted.is_empty()
    }
}

/// Ask version control which component files changed since `base_ref`.
///
/// Any query failure yields an empty change set.
pub async fn discover_changed(
    vcs: &dyn VersionControl,
    scope: &ScanScope,
    base_ref: &str,
) -> ChangeSet {
    match query_changes(vcs, scope, base_ref).await {
        Ok(changes) => {
            info!(
                changed = changes.changed.len(),
                deleted = changes.deleted.len(),
                base_ref = %base_ref,
                "Change set resolved"
            );
            changes
        }
        Err(e) => {
            warn!(error = %e, "Version control query failed, assuming no changes");
            ChangeSet::default()
        }
    }
}

async fn query_changes(
    vcs: &dyn VersionControl,
    scope: &ScanScope,
    base_ref: &str,
) -> Result<ChangeSet, IndexerError> {
    let conventions = scope.conventions();
    let component_patterns = vec![format!("*{}", conventions.component_suffix)];
    let asset_patterns: Vec<String> = conventions
        .asset_suffixes()
        .iter()
        .map(|suffix| format!("*{suffix}"))
        .collect();

    let mut changes = ChangeSet::default();

    let modified = vcs.changed_files(base_ref, &component_patterns).await?;
    let untracked = vcs.untracked_files(&component_patterns).await?;
    changes
        .changed
        .extend(modified.iter().chain(&untracked).map(|p| normalize_path(p)));

    let deleted = vcs.deleted_files(base_ref, &component_patterns).await?;
    changes.deleted.extend(deleted.iter().map(|p| normalize_path(p)));

    // Markup, style and store edits invalidate the owning component
    let mut assets = vcs.changed_files(base_ref, &asset_patterns).await?;
    assets.extend(vcs.untracked_files(&asset_patterns).await?);
    assets.extend(vcs.deleted_files(base_ref, &asset_patterns).await?);
    for asset in &assets {
        if let Some(owner) = conventions.owner_of(&normalize_path(asset)) {
            debug!(asset = %asset, owner = %owner, "Asset change mapped to component");
            changes.changed.insert(owner);
        }
    }

    changes.changed.retain(|path| scope.admits(path));
    changes.deleted.retain(|path| scope.admits(path));

    Ok(changes)
}
