//! Snapshot persistence.
//!
//! Loading never fails: anything that does not yield a current-format
//! snapshot is reported as absent and the caller rebuilds from scratch.

use crate::index::{IndexSnapshot, SNAPSHOT_FORMAT_VERSION};
use crate::IndexerError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Reads and atomically replaces the snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Create a store for the snapshot at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, or `None` if it is missing, unreadable or stale.
    pub async fn load(&self) -> Option<IndexSnapshot> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) => {
                debug!(path = ?self.path, error = %e, "No readable snapshot");
                return None;
            }
        };

        let snapshot: IndexSnapshot = match serde_json::from_str(&json) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Snapshot is corrupt, ignoring");
                return None;
            }
        };

        if snapshot.version != SNAPSHOT_FORMAT_VERSION {
            warn!(
                path = ?self.path,
                found = %snapshot.version,
                expected = SNAPSHOT_FORMAT_VERSION,
                "Snapshot format version mismatch, ignoring"
            );
            return None;
        }

        debug!(
            path = ?self.path,
            components = snapshot.components.len(),
            "Loaded snapshot"
        );
        Some(snapshot)
    }

    /// Write the snapshot through a temp file and rename it into place.
    pub async fn save(&self, snapshot: &IndexSnapshot) -> Result<(), IndexerError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }

        let json = serde_json::to_string_pretty(snapshot)?;

        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| IndexerError::Config(format!("invalid output path {:?}", self.path)))?;
        let temp_path = self.path.with_file_name(format!(".{file_name}.tmp"));

        tokio::fs::write(&temp_path, &json).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        info!(
            path = ?self.path,
            size = json.len(),
            components = snapshot.components.len(),
            "Saved snapshot"
        );

        Ok(())
    }
}
