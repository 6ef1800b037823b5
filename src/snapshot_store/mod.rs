//! Historical storage of platform snapshots.

mod schema;
mod sqlite_snapshot_store;

pub use schema::SNAPSHOT_VERSIONED_SCHEMAS;
pub use sqlite_snapshot_store::SqliteSnapshotStore;

use anyhow::Result;
use serde::Serialize;

use crate::harvest::PlatformSnapshot;

/// Counts of what one `save` call wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveSummary {
    pub platforms: usize,
    pub tracks: usize,
}

/// A persisted snapshot with its row id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredSnapshot {
    pub id: i64,
    #[serde(flatten)]
    pub snapshot: PlatformSnapshot,
}

pub trait SnapshotStore: Send + Sync {
    /// Appends every snapshot with its tracks in a single transaction.
    fn save(&self, snapshots: &[PlatformSnapshot]) -> Result<SaveSummary>;

    /// Newest snapshot of each platform, ordered by platform.
    fn latest_per_platform(&self) -> Result<Vec<StoredSnapshot>>;

    /// Up to `limit` snapshots of `platform`, newest first.
    fn history(&self, platform: &str, limit: usize) -> Result<Vec<StoredSnapshot>>;

    /// Removes a snapshot and its tracks. False when no such snapshot exists.
    fn delete_snapshot(&self, id: i64) -> Result<bool>;
}
