//! SQLite schema definitions for the music catalog database.
//!
//! Relationships live only on the dependent row: `albums.artist_id` and the
//! four nullable foreign keys of `songs`. Every foreign key column is indexed
//! so derived collections and delete cascades are index lookups.

use super::models::EntityKind;
use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

// =============================================================================
// Foreign Keys
// =============================================================================

const ARTIST_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const ALBUM_FK: ForeignKey = ForeignKey {
    foreign_table: "albums",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const GENRE_FK: ForeignKey = ForeignKey {
    foreign_table: "genres",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const PLAYLIST_FK: ForeignKey = ForeignKey {
    foreign_table: "playlists",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

// =============================================================================
// Tables
// =============================================================================

pub(crate) const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
};

pub(crate) const ALBUMS_TABLE: Table = Table {
    name: "albums",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("artist_id", &SqlType::Integer, foreign_key = Some(&ARTIST_FK)),
    ],
    indices: &[("idx_albums_artist", "artist_id")],
};

pub(crate) const GENRES_TABLE: Table = Table {
    name: "genres",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
};

pub(crate) const PLAYLISTS_TABLE: Table = Table {
    name: "playlists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
};

pub(crate) const SONGS_TABLE: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("album_id", &SqlType::Integer, foreign_key = Some(&ALBUM_FK)),
        sqlite_column!("artist_id", &SqlType::Integer, foreign_key = Some(&ARTIST_FK)),
        sqlite_column!("genre_id", &SqlType::Integer, foreign_key = Some(&GENRE_FK)),
        sqlite_column!(
            "playlist_id",
            &SqlType::Integer,
            foreign_key = Some(&PLAYLIST_FK)
        ),
    ],
    indices: &[
        ("idx_songs_album", "album_id"),
        ("idx_songs_artist", "artist_id"),
        ("idx_songs_genre", "genre_id"),
        ("idx_songs_playlist", "playlist_id"),
    ],
};

/// Table holding entities of `kind`.
pub(crate) fn table_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Artist => ARTISTS_TABLE.name,
        EntityKind::Album => ALBUMS_TABLE.name,
        EntityKind::Genre => GENRES_TABLE.name,
        EntityKind::Playlist => PLAYLISTS_TABLE.name,
        EntityKind::Song => SONGS_TABLE.name,
    }
}

// =============================================================================
// Versioned Schema Definition
// =============================================================================

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        ARTISTS_TABLE,
        ALBUMS_TABLE,
        GENRES_TABLE,
        PLAYLISTS_TABLE,
        SONGS_TABLE,
    ],
}];
