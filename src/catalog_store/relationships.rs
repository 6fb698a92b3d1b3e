//! Association and cascade rules between catalog entities.
//!
//! Every function here runs against a gateway handed out by a single write
//! scope. Lookups happen in path order and the first miss returns
//! [`NotFound`](super::error::CatalogError::NotFound) before anything is written, so the scope rolls
//! back with the store unchanged.

use super::error::CatalogResult;
use super::models::{Album, Artist, Entity, EntityId, EntityKind, Genre, Playlist, Song, SongReference};
use super::trait_def::{require, CatalogGateway, Repository};
use tracing::debug;

/// Point `reference` of `song` at `target_id` and persist it.
/// Writes nothing if the song already points there.
fn set_song_reference<G>(
    gateway: &G,
    mut song: Song,
    reference: SongReference,
    target_id: EntityId,
) -> CatalogResult<Song>
where
    G: CatalogGateway + ?Sized,
{
    if reference.get(&song) == Some(target_id) {
        return Ok(song);
    }
    reference.set(&mut song, Some(target_id));
    Repository::<Song>::update(gateway, &song)?;
    debug!("Song {} {} set to {}", song.id, reference.column(), target_id);
    Ok(song)
}

pub fn attach_song_to_album<G>(gateway: &G, album_id: EntityId, song_id: EntityId) -> CatalogResult<Song>
where
    G: CatalogGateway + ?Sized,
{
    let album: Album = require(gateway, album_id)?;
    let song: Song = require(gateway, song_id)?;
    set_song_reference(gateway, song, SongReference::Album, album.id)
}

pub fn attach_album_to_artist<G>(
    gateway: &G,
    artist_id: EntityId,
    album_id: EntityId,
) -> CatalogResult<Album>
where
    G: CatalogGateway + ?Sized,
{
    let artist: Artist = require(gateway, artist_id)?;
    let mut album: Album = require(gateway, album_id)?;
    if album.artist_id == Some(artist.id) {
        return Ok(album);
    }
    album.artist_id = Some(artist.id);
    Repository::<Album>::update(gateway, &album)?;
    debug!("Album {} artist_id set to {}", album.id, artist.id);
    Ok(album)
}

pub fn attach_song_to_playlist<G>(
    gateway: &G,
    playlist_id: EntityId,
    song_id: EntityId,
) -> CatalogResult<Song>
where
    G: CatalogGateway + ?Sized,
{
    let playlist: Playlist = require(gateway, playlist_id)?;
    let song: Song = require(gateway, song_id)?;
    set_song_reference(gateway, song, SongReference::Playlist, playlist.id)
}

/// The genre row itself is never written.
pub fn set_song_genre<G>(gateway: &G, song_id: EntityId, genre_id: EntityId) -> CatalogResult<Song>
where
    G: CatalogGateway + ?Sized,
{
    let song: Song = require(gateway, song_id)?;
    let genre: Genre = require(gateway, genre_id)?;
    set_song_reference(gateway, song, SongReference::Genre, genre.id)
}

/// Song-side counterpart of [`attach_song_to_album`]; both write `songs.album_id`.
pub fn set_song_album<G>(gateway: &G, song_id: EntityId, album_id: EntityId) -> CatalogResult<Song>
where
    G: CatalogGateway + ?Sized,
{
    let song: Song = require(gateway, song_id)?;
    let album: Album = require(gateway, album_id)?;
    set_song_reference(gateway, song, SongReference::Album, album.id)
}

pub fn set_song_artist<G>(gateway: &G, song_id: EntityId, artist_id: EntityId) -> CatalogResult<Song>
where
    G: CatalogGateway + ?Sized,
{
    let song: Song = require(gateway, song_id)?;
    let artist: Artist = require(gateway, artist_id)?;
    set_song_reference(gateway, song, SongReference::Artist, artist.id)
}

/// Clear every reference to the entity `kind`/`id` and return how many rows
/// were changed.
///
/// Songs lose their album, artist, genre or playlist; albums lose their
/// artist. Nothing references a song.
pub fn cascade_clear_on_delete<G>(gateway: &G, kind: EntityKind, id: EntityId) -> CatalogResult<usize>
where
    G: CatalogGateway + ?Sized,
{
    let mut cleared = 0;
    if let Some(reference) = SongReference::for_kind(kind) {
        cleared += gateway.clear_song_references(reference, id)?;
    }
    if kind == EntityKind::Artist {
        cleared += gateway.clear_album_artist(id)?;
    }
    Ok(cleared)
}

/// Look up, cascade-clear and delete an entity. Returns the deleted entity.
pub fn delete_entity<T, G>(gateway: &G, id: EntityId) -> CatalogResult<T>
where
    T: Entity,
    G: CatalogGateway + Repository<T> + ?Sized,
{
    let entity: T = require(gateway, id)?;
    let cleared = cascade_clear_on_delete(gateway, T::KIND, id)?;
    Repository::<T>::delete(gateway, &entity)?;
    debug!("Deleted {} {}, cleared {} references", T::KIND, id, cleared);
    Ok(entity)
}
