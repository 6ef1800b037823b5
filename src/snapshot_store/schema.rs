//! Snapshot database schema.

use anyhow::Result;
use rusqlite::Connection;

use crate::sqlite_persistence::{
    create_index, Column, ForeignKey, ForeignKeyAction, Index, SqlType, Table, VersionedSchema,
};

const PLATFORM_SNAPSHOTS_TABLE_V1: Table = Table {
    name: "platform_snapshots",
    columns: &[
        Column::new("id", SqlType::Integer).primary_key(),
        Column::new("platform", SqlType::Text).not_null(),
        Column::new("display_name", SqlType::Text).not_null(),
        Column::new("homepage", SqlType::Text).not_null(),
        Column::new("description", SqlType::Text).not_null(),
        // RFC 3339, UTC, microseconds: sorts lexically in time order.
        Column::new("retrieved_at", SqlType::Text).not_null(),
    ],
    indices: &[Index {
        name: "idx_platform_snapshots_platform_retrieved",
        columns: "platform, retrieved_at DESC",
    }],
};

const SNAPSHOT_FK: ForeignKey = ForeignKey {
    table: "platform_snapshots",
    column: "id",
    on_delete: ForeignKeyAction::Cascade,
};

const TRACKS_TABLE_V1: Table = Table {
    name: "tracks",
    columns: &[
        Column::new("id", SqlType::Integer).primary_key(),
        Column::new("snapshot_id", SqlType::Integer)
            .not_null()
            .references(&SNAPSHOT_FK),
        Column::new("position", SqlType::Integer).not_null(),
        Column::new("title", SqlType::Text).not_null(),
        Column::new("artist", SqlType::Text),
        Column::new("source_url", SqlType::Text),
    ],
    indices: &[],
};

const TRACKS_SNAPSHOT_INDEX: Index = Index {
    name: "idx_tracks_snapshot_id",
    columns: "snapshot_id",
};

/// Version 2 adds the lookup index from tracks to their snapshot.
const TRACKS_TABLE_V2: Table = Table {
    indices: &[TRACKS_SNAPSHOT_INDEX],
    ..TRACKS_TABLE_V1
};

fn migrate_v1_to_v2(conn: &Connection) -> Result<()> {
    create_index(conn, TRACKS_TABLE_V2.name, &TRACKS_SNAPSHOT_INDEX)
}

pub const SNAPSHOT_VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 1,
        tables: &[PLATFORM_SNAPSHOTS_TABLE_V1, TRACKS_TABLE_V1],
        migration: None,
    },
    VersionedSchema {
        version: 2,
        tables: &[PLATFORM_SNAPSHOTS_TABLE_V1, TRACKS_TABLE_V2],
        migration: Some(migrate_v1_to_v2),
    },
];
