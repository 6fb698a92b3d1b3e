//! Catalog entity models.
//!
//! Every relationship is stored once, as a nullable foreign key on the
//! dependent row. Collections such as "songs of an album" are derived by
//! querying that key, never stored on the owning side.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity key assigned by the store on creation.
pub type EntityId = i64;

// =============================================================================
// Entity Kinds
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Artist,
    Album,
    Genre,
    Playlist,
    Song,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Artist,
        EntityKind::Album,
        EntityKind::Genre,
        EntityKind::Playlist,
        EntityKind::Song,
    ];

    /// Lowercase label, used in metrics and log lines.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Artist => "artist",
            EntityKind::Album => "album",
            EntityKind::Genre => "genre",
            EntityKind::Playlist => "playlist",
            EntityKind::Song => "song",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Artist => "Artist",
            EntityKind::Album => "Album",
            EntityKind::Genre => "Genre",
            EntityKind::Playlist => "Playlist",
            EntityKind::Song => "Song",
        };
        f.write_str(name)
    }
}

/// Foreign key columns on a song.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SongReference {
    Album,
    Artist,
    Genre,
    Playlist,
}

impl SongReference {
    pub fn column(&self) -> &'static str {
        match self {
            SongReference::Album => "album_id",
            SongReference::Artist => "artist_id",
            SongReference::Genre => "genre_id",
            SongReference::Playlist => "playlist_id",
        }
    }

    /// The song reference pointing at entities of `kind`, if songs can
    /// reference that kind at all.
    pub fn for_kind(kind: EntityKind) -> Option<Self> {
        match kind {
            EntityKind::Album => Some(SongReference::Album),
            EntityKind::Artist => Some(SongReference::Artist),
            EntityKind::Genre => Some(SongReference::Genre),
            EntityKind::Playlist => Some(SongReference::Playlist),
            EntityKind::Song => None,
        }
    }

    pub fn get(&self, song: &Song) -> Option<EntityId> {
        match self {
            SongReference::Album => song.album_id,
            SongReference::Artist => song.artist_id,
            SongReference::Genre => song.genre_id,
            SongReference::Playlist => song.playlist_id,
        }
    }

    pub fn set(&self, song: &mut Song, value: Option<EntityId>) {
        match self {
            SongReference::Album => song.album_id = value,
            SongReference::Artist => song.artist_id = value,
            SongReference::Genre => song.genre_id = value,
            SongReference::Playlist => song.playlist_id = value,
        }
    }
}

// =============================================================================
// Entity Trait
// =============================================================================

/// Common contract of the five catalog entities.
pub trait Entity: Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> EntityId;

    fn name(&self) -> &str;

    /// A fresh entity carrying only a name. The id is a placeholder until the
    /// store assigns one.
    fn with_name(name: String) -> Self;

    fn set_name(&mut self, name: String);
}

// =============================================================================
// Core Entities
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: EntityId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: EntityId,
    pub name: String,
    pub artist_id: Option<EntityId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: EntityId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: EntityId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: EntityId,
    pub name: String,
    pub album_id: Option<EntityId>,
    pub artist_id: Option<EntityId>,
    pub genre_id: Option<EntityId>,
    pub playlist_id: Option<EntityId>,
}

/// Id carried by entities that have not been inserted yet.
pub const UNASSIGNED_ID: EntityId = 0;

impl Entity for Artist {
    const KIND: EntityKind = EntityKind::Artist;

    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn with_name(name: String) -> Self {
        Artist {
            id: UNASSIGNED_ID,
            name,
        }
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

impl Entity for Album {
    const KIND: EntityKind = EntityKind::Album;

    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn with_name(name: String) -> Self {
        Album {
            id: UNASSIGNED_ID,
            name,
            artist_id: None,
        }
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

impl Entity for Genre {
    const KIND: EntityKind = EntityKind::Genre;

    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn with_name(name: String) -> Self {
        Genre {
            id: UNASSIGNED_ID,
            name,
        }
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

impl Entity for Playlist {
    const KIND: EntityKind = EntityKind::Playlist;

    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn with_name(name: String) -> Self {
        Playlist {
            id: UNASSIGNED_ID,
            name,
        }
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

impl Entity for Song {
    const KIND: EntityKind = EntityKind::Song;

    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn with_name(name: String) -> Self {
        Song {
            id: UNASSIGNED_ID,
            name,
            album_id: None,
            artist_id: None,
            genre_id: None,
            playlist_id: None,
        }
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}
