//! Persistence gateway traits.
//!
//! A gateway is only ever handed out inside a read or write scope of the
//! store, so every call made through it belongs to the same unit of work.

use super::error::{CatalogError, CatalogResult};
use super::models::{Album, Artist, Entity, EntityId, Genre, Playlist, Song, SongReference};
use anyhow::Result;

/// Point lookup, listing and persistence for one entity type.
pub trait Repository<T: Entity> {
    fn get(&self, id: EntityId) -> Result<Option<T>>;

    /// All rows, ordered by id.
    fn list(&self) -> Result<Vec<T>>;

    /// Insert `entity`, ignoring its id, and return it with the id the store
    /// assigned.
    fn add(&self, entity: T) -> Result<T>;

    fn update(&self, entity: &T) -> Result<()>;

    fn delete(&self, entity: &T) -> Result<()>;
}

/// The five repositories plus the derived-collection queries.
pub trait CatalogGateway:
    Repository<Artist> + Repository<Album> + Repository<Genre> + Repository<Playlist> + Repository<Song>
{
    /// Songs whose `reference` column equals `id`, ordered by id.
    fn songs_referencing(&self, reference: SongReference, id: EntityId) -> Result<Vec<Song>>;

    /// Albums whose artist is `artist_id`, ordered by id.
    fn albums_by_artist(&self, artist_id: EntityId) -> Result<Vec<Album>>;

    /// Set the `reference` column to null on every song pointing at `id`.
    /// Returns the number of songs changed.
    fn clear_song_references(&self, reference: SongReference, id: EntityId) -> Result<usize>;

    /// Set `artist_id` to null on every album of `artist_id`.
    /// Returns the number of albums changed.
    fn clear_album_artist(&self, artist_id: EntityId) -> Result<usize>;
}

/// Fetch an entity that must exist.
pub fn require<T, G>(gateway: &G, id: EntityId) -> CatalogResult<T>
where
    T: Entity,
    G: Repository<T> + ?Sized,
{
    gateway
        .get(id)?
        .ok_or_else(|| CatalogError::not_found(T::KIND, id))
}
