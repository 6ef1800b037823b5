use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, types::Type, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use super::schema::SNAPSHOT_VERSIONED_SCHEMAS;
use super::{SaveSummary, SnapshotStore, StoredSnapshot};
use crate::harvest::{PlatformSnapshot, TrackRecord};
use crate::sqlite_persistence::open_versioned;

const SNAPSHOT_COLUMNS: &str =
    "id, platform, display_name, homepage, description, retrieved_at";

#[derive(Clone)]
pub struct SqliteSnapshotStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSnapshotStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let mut conn = Connection::open(path)
            .with_context(|| format!("Failed to open snapshot database {:?}", path))?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        let version = open_versioned(&mut conn, SNAPSHOT_VERSIONED_SCHEMAS)
            .context("Failed to initialise snapshot database")?;
        info!(
            "Snapshot database {:?} ready (schema version {})",
            path, version
        );

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Ensures the schema exists and is current. Safe to call repeatedly.
    pub fn init(&self) -> Result<()> {
        let mut conn = self.lock()?;
        open_versioned(&mut conn, SNAPSHOT_VERSIONED_SCHEMAS)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Snapshot database lock poisoned"))
    }

    fn format_datetime(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_datetime(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))
    }

    fn query_snapshots(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<StoredSnapshot>> {
        let mut stmt = conn.prepare(sql)?;
        let headers = stmt
            .query_map(params, |row| {
                let retrieved_at: String = row.get("retrieved_at")?;
                Ok(StoredSnapshot {
                    id: row.get("id")?,
                    snapshot: PlatformSnapshot {
                        platform: row.get("platform")?,
                        display_name: row.get("display_name")?,
                        homepage: row.get("homepage")?,
                        description: row.get("description")?,
                        retrieved_at: Self::parse_datetime(&retrieved_at)?,
                        tracks: Vec::new(),
                    },
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        headers
            .into_iter()
            .map(|mut stored| {
                stored.snapshot.tracks = Self::load_tracks(conn, stored.id)?;
                Ok(stored)
            })
            .collect()
    }

    fn load_tracks(conn: &Connection, snapshot_id: i64) -> Result<Vec<TrackRecord>> {
        let mut stmt = conn.prepare_cached(
            "SELECT position, title, artist, source_url FROM tracks
             WHERE snapshot_id = ?1 ORDER BY position ASC, id ASC",
        )?;
        let tracks = stmt
            .query_map(params![snapshot_id], |row| {
                Ok(TrackRecord {
                    position: row.get(0)?,
                    title: row.get(1)?,
                    artist: row.get(2)?,
                    source_url: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tracks)
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn save(&self, snapshots: &[PlatformSnapshot]) -> Result<SaveSummary> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut summary = SaveSummary::default();
        {
            let mut insert_snapshot = tx.prepare_cached(
                "INSERT INTO platform_snapshots
                 (platform, display_name, homepage, description, retrieved_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            let mut insert_track = tx.prepare_cached(
                "INSERT INTO tracks (snapshot_id, position, title, artist, source_url)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;

            for snapshot in snapshots {
                insert_snapshot.execute(params![
                    snapshot.platform,
                    snapshot.display_name,
                    snapshot.homepage,
                    snapshot.description,
                    Self::format_datetime(&snapshot.retrieved_at),
                ])?;
                let snapshot_id = tx.last_insert_rowid();
                for track in &snapshot.tracks {
                    insert_track.execute(params![
                        snapshot_id,
                        track.position,
                        track.title,
                        track.artist,
                        track.source_url,
                    ])?;
                }
                summary.platforms += 1;
                summary.tracks += snapshot.tracks.len();
            }
        }
        tx.commit().context("Failed to commit snapshot batch")?;

        debug!(
            "Stored {} snapshots with {} tracks",
            summary.platforms, summary.tracks
        );
        Ok(summary)
    }

    fn latest_per_platform(&self) -> Result<Vec<StoredSnapshot>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM platform_snapshots s
             WHERE s.id = (
                 SELECT latest.id FROM platform_snapshots latest
                 WHERE latest.platform = s.platform
                 ORDER BY latest.retrieved_at DESC, latest.id DESC
                 LIMIT 1
             )
             ORDER BY s.platform ASC"
        );
        Self::query_snapshots(&conn, &sql, [])
    }

    fn history(&self, platform: &str, limit: usize) -> Result<Vec<StoredSnapshot>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM platform_snapshots
             WHERE platform = ?1
             ORDER BY retrieved_at DESC, id DESC
             LIMIT ?2"
        );
        Self::query_snapshots(&conn, &sql, params![platform, limit as i64])
    }

    fn delete_snapshot(&self, id: i64) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM platform_snapshots WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}
