//! JSON projections returned by the API.
//!
//! Related entities are rendered by name, one level deep.

use anyhow::Result;
use serde::Serialize;

use crate::catalog_store::{
    Album, Artist, CatalogGateway, Entity, EntityId, Genre, Playlist, Repository, Song,
    SongReference, SqlEntity,
};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SongView {
    pub id: EntityId,
    pub name: String,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
    pub playlist: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AlbumView {
    pub id: EntityId,
    pub name: String,
    pub artist: Option<String>,
    pub songs: Vec<SongView>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ArtistView {
    pub id: EntityId,
    pub name: String,
    pub albums: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GenreView {
    pub id: EntityId,
    pub name: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PlaylistView {
    pub id: EntityId,
    pub name: String,
    pub songs: Vec<SongView>,
}

/// An entity that can be rendered for the API.
pub trait ToView: SqlEntity {
    type View: Serialize + Send + 'static;

    fn to_view<G: CatalogGateway + ?Sized>(self, gateway: &G) -> Result<Self::View>;
}

/// An entity that songs point at through one of their references.
pub trait SongOwner: ToView {
    const REFERENCE: SongReference;
}

fn name_of<T, G>(gateway: &G, id: Option<EntityId>) -> Result<Option<String>>
where
    T: Entity,
    G: Repository<T> + ?Sized,
{
    let Some(id) = id else {
        return Ok(None);
    };
    let entity: Option<T> = gateway.get(id)?;
    Ok(entity.map(|e| e.name().to_string()))
}

fn song_views<G: CatalogGateway + ?Sized>(
    gateway: &G,
    reference: SongReference,
    id: EntityId,
) -> Result<Vec<SongView>> {
    gateway
        .songs_referencing(reference, id)?
        .into_iter()
        .map(|song| song.to_view(gateway))
        .collect()
}

impl ToView for Song {
    type View = SongView;

    fn to_view<G: CatalogGateway + ?Sized>(self, gateway: &G) -> Result<SongView> {
        Ok(SongView {
            album: name_of::<Album, _>(gateway, self.album_id)?,
            artist: name_of::<Artist, _>(gateway, self.artist_id)?,
            genre: name_of::<Genre, _>(gateway, self.genre_id)?,
            playlist: name_of::<Playlist, _>(gateway, self.playlist_id)?,
            id: self.id,
            name: self.name,
        })
    }
}

impl ToView for Album {
    type View = AlbumView;

    fn to_view<G: CatalogGateway + ?Sized>(self, gateway: &G) -> Result<AlbumView> {
        Ok(AlbumView {
            artist: name_of::<Artist, _>(gateway, self.artist_id)?,
            songs: song_views(gateway, SongReference::Album, self.id)?,
            id: self.id,
            name: self.name,
        })
    }
}

impl ToView for Artist {
    type View = ArtistView;

    fn to_view<G: CatalogGateway + ?Sized>(self, gateway: &G) -> Result<ArtistView> {
        let albums = gateway
            .albums_by_artist(self.id)?
            .into_iter()
            .map(|album| album.name)
            .collect();
        Ok(ArtistView {
            id: self.id,
            name: self.name,
            albums,
        })
    }
}

impl ToView for Genre {
    type View = GenreView;

    fn to_view<G: CatalogGateway + ?Sized>(self, _gateway: &G) -> Result<GenreView> {
        Ok(GenreView {
            id: self.id,
            name: self.name,
        })
    }
}

impl ToView for Playlist {
    type View = PlaylistView;

    fn to_view<G: CatalogGateway + ?Sized>(self, gateway: &G) -> Result<PlaylistView> {
        Ok(PlaylistView {
            songs: song_views(gateway, SongReference::Playlist, self.id)?,
            id: self.id,
            name: self.name,
        })
    }
}

impl SongOwner for Album {
    const REFERENCE: SongReference = SongReference::Album;
}

impl SongOwner for Genre {
    const REFERENCE: SongReference = SongReference::Genre;
}

impl SongOwner for Playlist {
    const REFERENCE: SongReference = SongReference::Playlist;
}
