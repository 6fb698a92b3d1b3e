//! SQLite-backed catalog store.
//!
//! `SqliteCatalogStore` owns one write connection and a round-robin pool of
//! read-only connections. Callers never touch the connections directly: they
//! get a [`SqliteGateway`] inside [`SqliteCatalogStore::read`] or
//! [`SqliteCatalogStore::write`], and a write scope is a single
//! `BEGIN IMMEDIATE` transaction that commits when the closure succeeds and
//! rolls back otherwise.

use super::error::CatalogResult;
use super::models::*;
use super::schema::{
    table_for, ALBUMS_TABLE, ARTISTS_TABLE, CATALOG_VERSIONED_SCHEMAS, GENRES_TABLE,
    PLAYLISTS_TABLE, SONGS_TABLE,
};
use super::trait_def::{CatalogGateway, Repository};
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::{params, types::ToSql, Connection, Row};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

/// SQLite-backed catalog store.
#[derive(Clone)]
pub struct SqliteCatalogStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    write_conn: Arc<Mutex<Connection>>,
    read_index: Arc<AtomicUsize>,
}

fn migrate_if_needed(conn: &Connection) -> Result<()> {
    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    let latest_version = CATALOG_VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &CATALOG_VERSIONED_SCHEMAS[latest_version];

    // Check if this is a brand new database (no tables exist)
    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if table_count == 0 {
        info!("Creating catalog db schema at version {}", latest_version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    if db_version < BASE_DB_VERSION as i64 {
        bail!(
            "Catalog db has tables but no schema version (user_version = {})",
            db_version
        );
    }
    let current_version = (db_version - BASE_DB_VERSION as i64) as usize;
    if current_version != latest_version {
        bail!(
            "Catalog db is at schema version {}, expected {}",
            current_version,
            latest_version
        );
    }

    latest_schema
        .validate(conn)
        .context("Catalog db schema validation failed")?;
    Ok(())
}

impl SqliteCatalogStore {
    /// Open (or create) the catalog database at `db_path`.
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file
    /// * `read_pool_size` - Number of read-only connections for concurrent reads
    pub fn new<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open catalog database {:?}", db_path_ref))?;

        migrate_if_needed(&write_conn)?;

        write_conn.pragma_update(None, "journal_mode", "WAL")?;
        write_conn.pragma_update(None, "foreign_keys", "ON")?;

        let mut read_pool = Vec::with_capacity(read_pool_size);
        for _ in 0..read_pool_size {
            let read_conn = Connection::open_with_flags(
                db_path_ref,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            read_conn.pragma_update(None, "journal_mode", "WAL")?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        let store = SqliteCatalogStore {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_pool,
            read_index: Arc::new(AtomicUsize::new(0)),
        };

        let counts = store.counts()?;
        info!(
            "Opened catalog {:?}: {}",
            db_path_ref,
            counts
                .iter()
                .map(|(kind, count)| format!("{} {}s", count, kind.label()))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(store)
    }

    /// A private in-memory catalog. Reads go through the write connection.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrate_if_needed(&conn)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(SqliteCatalogStore {
            write_conn: Arc::new(Mutex::new(conn)),
            read_pool: Vec::new(),
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        if self.read_pool.is_empty() {
            return self.write_conn.clone();
        }
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    /// Run `f` against a read connection.
    pub fn read<R, F>(&self, f: F) -> CatalogResult<R>
    where
        F: FnOnce(&SqliteGateway<'_>) -> CatalogResult<R>,
    {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&SqliteGateway::new(&conn))
    }

    /// Run `f` inside a write transaction on the write connection.
    ///
    /// The transaction commits if `f` returns `Ok` and rolls back otherwise,
    /// so a failed operation leaves no partial change behind.
    pub fn write<R, F>(&self, f: F) -> CatalogResult<R>
    where
        F: FnOnce(&SqliteGateway<'_>) -> CatalogResult<R>,
    {
        // A panicked scope poisons the lock and may leave its transaction open
        let conn = self
            .write_conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !conn.is_autocommit() {
            warn!("Rolling back transaction left open by an earlier write scope");
            conn.execute("ROLLBACK", [])?;
        }
        conn.execute("BEGIN IMMEDIATE", [])?;

        let result = f(&SqliteGateway::new(&conn));

        match result {
            Ok(value) => {
                if let Err(e) = conn.execute("COMMIT", []) {
                    if !conn.is_autocommit() {
                        let _ = conn.execute("ROLLBACK", []);
                    }
                    return Err(anyhow::Error::from(e)
                        .context("Failed to commit catalog write")
                        .into());
                }
                Ok(value)
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }

    /// Number of stored entities of `kind`.
    pub fn count(&self, kind: EntityKind) -> Result<usize> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap_or_else(PoisonError::into_inner);
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table_for(kind)),
            [],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn counts(&self) -> Result<Vec<(EntityKind, usize)>> {
        EntityKind::ALL
            .iter()
            .map(|kind| Ok((*kind, self.count(*kind)?)))
            .collect()
    }
}

// =============================================================================
// Gateway
// =============================================================================

/// Catalog gateway bound to one connection for the duration of a scope.
pub struct SqliteGateway<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteGateway<'c> {
    fn new(conn: &'c Connection) -> Self {
        SqliteGateway { conn }
    }

    fn query_entities<T: SqlEntity>(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt
            .query_map(params, |row| T::from_row(row))?
            .collect::<rusqlite::Result<Vec<T>>>()
            .with_context(|| format!("Failed to read {} rows", T::KIND.label()))?;
        Ok(rows)
    }
}

/// How an entity maps onto its table.
///
/// Rows are always selected as `id` followed by [`SqlEntity::COLUMNS`].
pub trait SqlEntity: Entity {
    const TABLE: &'static str;

    /// Columns after `id`, in binding order.
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Values for [`SqlEntity::COLUMNS`], in the same order.
    fn bind_values(&self) -> Vec<&dyn ToSql>;

    fn select_sql() -> String {
        format!("SELECT id, {} FROM {}", Self::COLUMNS.join(", "), Self::TABLE)
    }
}

impl SqlEntity for Artist {
    const TABLE: &'static str = ARTISTS_TABLE.name;
    const COLUMNS: &'static [&'static str] = &["name"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Artist {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }

    fn bind_values(&self) -> Vec<&dyn ToSql> {
        vec![&self.name as &dyn ToSql]
    }
}

impl SqlEntity for Album {
    const TABLE: &'static str = ALBUMS_TABLE.name;
    const COLUMNS: &'static [&'static str] = &["name", "artist_id"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Album {
            id: row.get(0)?,
            name: row.get(1)?,
            artist_id: row.get(2)?,
        })
    }

    fn bind_values(&self) -> Vec<&dyn ToSql> {
        vec![&self.name as &dyn ToSql, &self.artist_id as &dyn ToSql]
    }
}

impl SqlEntity for Genre {
    const TABLE: &'static str = GENRES_TABLE.name;
    const COLUMNS: &'static [&'static str] = &["name"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Genre {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }

    fn bind_values(&self) -> Vec<&dyn ToSql> {
        vec![&self.name as &dyn ToSql]
    }
}

impl SqlEntity for Playlist {
    const TABLE: &'static str = PLAYLISTS_TABLE.name;
    const COLUMNS: &'static [&'static str] = &["name"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Playlist {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }

    fn bind_values(&self) -> Vec<&dyn ToSql> {
        vec![&self.name as &dyn ToSql]
    }
}

impl SqlEntity for Song {
    const TABLE: &'static str = SONGS_TABLE.name;
    const COLUMNS: &'static [&'static str] =
        &["name", "album_id", "artist_id", "genre_id", "playlist_id"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Song {
            id: row.get(0)?,
            name: row.get(1)?,
            album_id: row.get(2)?,
            artist_id: row.get(3)?,
            genre_id: row.get(4)?,
            playlist_id: row.get(5)?,
        })
    }

    fn bind_values(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.name as &dyn ToSql,
            &self.album_id as &dyn ToSql,
            &self.artist_id as &dyn ToSql,
            &self.genre_id as &dyn ToSql,
            &self.playlist_id as &dyn ToSql,
        ]
    }
}

impl<T: SqlEntity> Repository<T> for SqliteGateway<'_> {
    fn get(&self, id: EntityId) -> Result<Option<T>> {
        let sql = format!("{} WHERE id = ?1", T::select_sql());
        Ok(self.query_entities::<T>(&sql, params![id])?.pop())
    }

    fn list(&self) -> Result<Vec<T>> {
        let sql = format!("{} ORDER BY id", T::select_sql());
        self.query_entities(&sql, params![])
    }

    fn add(&self, entity: T) -> Result<T> {
        let placeholders = (1..=T::COLUMNS.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            T::TABLE,
            T::COLUMNS.join(", "),
            placeholders
        );
        self.conn
            .prepare_cached(&sql)?
            .execute(entity.bind_values().as_slice())
            .with_context(|| format!("Failed to insert {}", T::KIND.label()))?;

        let id = self.conn.last_insert_rowid();
        Repository::<T>::get(self, id)?
            .with_context(|| format!("{} {} missing right after insert", T::KIND, id))
    }

    fn update(&self, entity: &T) -> Result<()> {
        let assignments = T::COLUMNS
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} = ?{}", column, i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            T::TABLE,
            assignments,
            T::COLUMNS.len() + 1
        );

        let id = entity.id();
        let mut values = entity.bind_values();
        values.push(&id);

        let changed = self
            .conn
            .prepare_cached(&sql)?
            .execute(values.as_slice())
            .with_context(|| format!("Failed to update {} {}", T::KIND, id))?;
        if changed == 0 {
            bail!("{} {} does not exist", T::KIND, id);
        }
        Ok(())
    }

    fn delete(&self, entity: &T) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", T::TABLE);
        self.conn
            .prepare_cached(&sql)?
            .execute(params![entity.id()])
            .with_context(|| format!("Failed to delete {} {}", T::KIND, entity.id()))?;
        Ok(())
    }
}

impl CatalogGateway for SqliteGateway<'_> {
    fn songs_referencing(&self, reference: SongReference, id: EntityId) -> Result<Vec<Song>> {
        let sql = format!(
            "{} WHERE {} = ?1 ORDER BY id",
            Song::select_sql(),
            reference.column()
        );
        self.query_entities(&sql, params![id])
    }

    fn albums_by_artist(&self, artist_id: EntityId) -> Result<Vec<Album>> {
        let sql = format!("{} WHERE artist_id = ?1 ORDER BY id", Album::select_sql());
        self.query_entities(&sql, params![artist_id])
    }

    fn clear_song_references(&self, reference: SongReference, id: EntityId) -> Result<usize> {
        let column = reference.column();
        let sql = format!(
            "UPDATE {} SET {} = NULL WHERE {} = ?1",
            Song::TABLE,
            column,
            column
        );
        let cleared = self
            .conn
            .prepare_cached(&sql)?
            .execute(params![id])
            .with_context(|| format!("Failed to clear songs.{} = {}", column, id))?;
        Ok(cleared)
    }

    fn clear_album_artist(&self, artist_id: EntityId) -> Result<usize> {
        let cleared = self
            .conn
            .prepare_cached("UPDATE albums SET artist_id = NULL WHERE artist_id = ?1")?
            .execute(params![artist_id])
            .with_context(|| format!("Failed to clear albums.artist_id = {}", artist_id))?;
        Ok(cleared)
    }
}
