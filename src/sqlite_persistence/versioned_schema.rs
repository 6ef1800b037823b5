//! Declarative SQLite schemas with a version stamp in `PRAGMA user_version`.
//!
//! A database is created at the latest schema, or validated against the
//! schema matching its stored version and then migrated forward.

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use tracing::info;

/// Offset added to schema versions in `user_version`, so a database created
/// by some other tool (version 0, or a small number) is never mistaken for ours.
pub const BASE_DB_VERSION: usize = 99999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
}

impl SqlType {
    fn as_sql(self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
        }
    }

    fn parse(declared: &str) -> Option<Self> {
        match declared.to_uppercase().as_str() {
            "TEXT" => Some(SqlType::Text),
            "INTEGER" => Some(SqlType::Integer),
            "REAL" => Some(SqlType::Real),
            _ => None,
        }
    }
}

#[allow(unused)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyAction {
    NoAction,
    Cascade,
    SetNull,
}

impl ForeignKeyAction {
    fn as_sql(self) -> &'static str {
        match self {
            ForeignKeyAction::NoAction => "NO ACTION",
            ForeignKeyAction::Cascade => "CASCADE",
            ForeignKeyAction::SetNull => "SET NULL",
        }
    }
}

#[derive(Debug)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
    pub on_delete: ForeignKeyAction,
}

#[derive(Debug)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub primary_key: bool,
    pub not_null: bool,
    pub references: Option<&'static ForeignKey>,
}

impl Column {
    pub const fn new(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            sql_type,
            primary_key: false,
            not_null: false,
            references: None,
        }
    }

    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub const fn references(mut self, foreign_key: &'static ForeignKey) -> Self {
        self.references = Some(foreign_key);
        self
    }

    fn definition(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type.as_sql());
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(fk) = self.references {
            sql.push_str(&format!(
                " REFERENCES {}({}) ON DELETE {}",
                fk.table,
                fk.column,
                fk.on_delete.as_sql()
            ));
        }
        sql
    }
}

/// A named index over a column list, e.g. `"platform, retrieved_at DESC"`.
#[derive(Debug)]
pub struct Index {
    pub name: &'static str,
    pub columns: &'static str,
}

#[derive(Debug)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub indices: &'static [Index],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let columns: Vec<String> = self.columns.iter().map(Column::definition).collect();
        conn.execute(
            &format!("CREATE TABLE {} ({})", self.name, columns.join(", ")),
            [],
        )
        .with_context(|| format!("Failed to create table {}", self.name))?;
        for index in self.indices {
            create_index(conn, self.name, index)?;
        }
        Ok(())
    }

    fn validate(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", self.name))?;
        let actual: Vec<(String, String, bool, bool)> = stmt
            .query_map([], |row| {
                Ok((
                    row.get(1)?,
                    row.get(2)?,
                    row.get::<_, i32>(3)? == 1,
                    row.get::<_, i32>(5)? > 0,
                ))
            })?
            .collect::<rusqlite::Result<_>>()?;

        if actual.is_empty() {
            bail!("Table {} does not exist", self.name);
        }
        if actual.len() != self.columns.len() {
            bail!(
                "Table {} has {} columns, expected {}",
                self.name,
                actual.len(),
                self.columns.len()
            );
        }
        for ((name, declared, not_null, primary_key), expected) in actual.iter().zip(self.columns) {
            if name != expected.name {
                bail!(
                    "Table {} column name mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    name
                );
            }
            if SqlType::parse(declared) != Some(expected.sql_type) {
                bail!(
                    "Table {} column {} type mismatch: expected {}, got {}",
                    self.name,
                    name,
                    expected.sql_type.as_sql(),
                    declared
                );
            }
            if *not_null != expected.not_null || *primary_key != expected.primary_key {
                bail!("Table {} column {} constraint mismatch", self.name, name);
            }
        }

        for index in self.indices {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ?1 AND tbl_name = ?2)",
                [index.name, self.name],
                |row| row.get(0),
            )?;
            if !exists {
                bail!("Table {} is missing index '{}'", self.name, index.name);
            }
        }

        let mut fk_stmt = conn.prepare(&format!("PRAGMA foreign_key_list({})", self.name))?;
        let foreign_keys: Vec<(String, String, String, String)> = fk_stmt
            .query_map([], |row| Ok((row.get(3)?, row.get(2)?, row.get(4)?, row.get(6)?)))?
            .collect::<rusqlite::Result<_>>()?;
        for column in self.columns {
            let Some(expected) = column.references else {
                continue;
            };
            let found = foreign_keys.iter().any(|(from, table, to, on_delete)| {
                from == column.name
                    && table == expected.table
                    && to == expected.column
                    && on_delete == expected.on_delete.as_sql()
            });
            if !found {
                bail!(
                    "Table {} column {} is missing foreign key REFERENCES {}({}) ON DELETE {}",
                    self.name,
                    column.name,
                    expected.table,
                    expected.column,
                    expected.on_delete.as_sql()
                );
            }
        }
        Ok(())
    }
}

pub fn create_index(conn: &Connection, table: &str, index: &Index) -> Result<()> {
    conn.execute(
        &format!(
            "CREATE INDEX IF NOT EXISTS {} ON {}({})",
            index.name, table, index.columns
        ),
        [],
    )
    .with_context(|| format!("Failed to create index {}", index.name))?;
    Ok(())
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    /// Brings a database at the previous version up to this one.
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.create(conn)?;
        }
        set_version(conn, self.version)
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        self.tables.iter().try_for_each(|table| table.validate(conn))
    }
}

fn set_version(conn: &Connection, version: usize) -> Result<()> {
    conn.execute(
        &format!("PRAGMA user_version = {}", BASE_DB_VERSION + version),
        [],
    )?;
    Ok(())
}

/// Schema version stored in the database, `None` for an uninitialised one.
pub fn stored_version(conn: &Connection) -> Result<Option<usize>> {
    let raw: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if raw == 0 {
        return Ok(None);
    }
    let version = raw - BASE_DB_VERSION as i64;
    if version < 1 {
        bail!("Database version {} is not a known schema version", raw);
    }
    Ok(Some(version as usize))
}

/// Creates, or validates and migrates, the database behind `conn`.
///
/// `schemas` must be ordered by version, the last entry being current.
/// Returns the version the database is at afterwards.
pub fn open_versioned(conn: &mut Connection, schemas: &[VersionedSchema]) -> Result<usize> {
    let Some(latest) = schemas.last() else {
        bail!("No schema versions defined");
    };

    let Some(db_version) = stored_version(conn)? else {
        info!("Initialising database at schema version {}", latest.version);
        let tx = conn.transaction()?;
        latest.create(&tx)?;
        tx.commit()?;
        return Ok(latest.version);
    };

    let current = schemas
        .iter()
        .find(|s| s.version == db_version)
        .with_context(|| format!("Unknown database version {}", db_version))?;
    current
        .validate(conn)
        .with_context(|| format!("Schema validation failed for version {}", db_version))?;

    if db_version < latest.version {
        let tx = conn.transaction()?;
        for schema in schemas.iter().filter(|s| s.version > db_version) {
            info!("Migrating database to version {}", schema.version);
            if let Some(migrate) = schema.migration {
                migrate(&tx)
                    .with_context(|| format!("Migration to version {} failed", schema.version))?;
            }
        }
        set_version(&tx, latest.version)?;
        tx.commit()?;
    }
    Ok(latest.version)
}
