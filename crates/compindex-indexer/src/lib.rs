//! compindex Indexer
//!
//! This crate provides the indexing engine for compindex, including:
//! - Gitignore-aware discovery of component files under configured roots
//! - Version-control change detection for incremental runs
//! - Best-effort textual extraction of component metadata
//! - Route table construction from routing-declaration files
//! - Index building (reverse indexes, parent graph, route tree)
//! - Atomic snapshot persistence

mod config;
mod error;
pub mod extract;
pub mod incremental;
pub mod index;
pub mod routes;
pub mod scanner;
pub mod storage;

pub use config::{AppRule, FileConventions, IndexConfig, LayerRule, RootConfig};
pub use error::IndexerError;
pub use extract::{extract, Component, ExtractContext};
pub use incremental::{IndexOptions, Indexer, RunKind, RunOutcome, RunReport, ScanMode};
pub use index::{IndexBuilder, IndexSnapshot, IndexStats};
pub use routes::{RouteEntry, RouteTable};
pub use scanner::{ChangeSet, GitCli, ScanScope, VersionControl};
pub use storage::SnapshotStore;
