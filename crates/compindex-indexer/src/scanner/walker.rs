//! File system walker with gitignore support.

use crate::IndexerError;
use ignore::{DirEntry, WalkBuilder, WalkState};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use tracing::debug;

/// File system walker that respects .gitignore rules and prunes skip directories.
pub struct Walker {
    root: PathBuf,
    include_hidden: bool,
    skip_dirs: Arc<BTreeSet<String>>,
}

impl Walker {
    /// Create a new walker for the given root directory.
    pub fn new(root: &Path, include_hidden: bool, skip_dirs: &BTreeSet<String>) -> Self {
        Self {
            root: root.to_path_buf(),
            include_hidden,
            skip_dirs: Arc::new(skip_dirs.clone()),
        }
    }

    /// Walk the directory tree and return all discovered file paths, sorted.
    pub fn walk(&self) -> Result<Vec<PathBuf>, IndexerError> {
        if !self.root.is_dir() {
            return Err(IndexerError::NotFound(self.root.clone()));
        }

        let (tx, rx) = mpsc::channel();
        let skip_dirs = Arc::clone(&self.skip_dirs);

        let walker = WalkBuilder::new(&self.root)
            .follow_links(false)
            .hidden(!self.include_hidden)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .parents(true)
            .filter_entry(move |entry| !is_skipped_dir(entry, &skip_dirs))
            .build_parallel();

        walker.run(|| {
            let tx = tx.clone();
            Box::new(move |result| {
                match result {
                    Ok(entry) => {
                        if entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                            let _ = tx.send(entry.into_path());
                        }
                    }
                    Err(e) => {
                        // Unreadable entries never fail the walk
                        debug!(error = %e, "Walk error");
                    }
                }
                WalkState::Continue
            })
        });

        drop(tx);

        let mut entries: Vec<PathBuf> = rx.into_iter().collect();

        // Sort by path for deterministic ordering
        entries.sort();

        Ok(entries)
    }
}

fn is_skipped_dir(entry: &DirEntry, skip_dirs: &BTreeSet<String>) -> bool {
    entry.depth() > 0
        && entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false)
        && entry
            .file_name()
            .to_str()
            .map(|name| skip_dirs.contains(name))
            .unwrap_or(false)
}
