//! Test fixture creation for the catalog database

use super::constants::*;
use anyhow::Result;
use music_catalog_server::catalog_store::{
    relationships, Album, Artist, Entity, Genre, Playlist, Repository, Song, SqliteCatalogStore,
};
use std::path::PathBuf;
use tempfile::TempDir;

/// Creates a temporary catalog with 2 artists, 2 albums, 2 genres,
/// 1 playlist and 3 songs, all linked through the relationship operations.
/// Returns (temp_dir, catalog_db_path)
pub fn create_test_catalog() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let catalog_db_path = dir.path().join("catalog.db");

    let store = SqliteCatalogStore::new(&catalog_db_path, 1)?;
    store.write(|gw| {
        for name in [ARTIST_1_NAME, ARTIST_2_NAME] {
            Repository::<Artist>::add(gw, Artist::with_name(name.to_string()))?;
        }
        for name in [ALBUM_1_NAME, ALBUM_2_NAME] {
            Repository::<Album>::add(gw, Album::with_name(name.to_string()))?;
        }
        for name in [GENRE_1_NAME, GENRE_2_NAME] {
            Repository::<Genre>::add(gw, Genre::with_name(name.to_string()))?;
        }
        Repository::<Playlist>::add(gw, Playlist::with_name(PLAYLIST_1_NAME.to_string()))?;
        for name in [SONG_1_NAME, SONG_2_NAME, SONG_3_NAME] {
            Repository::<Song>::add(gw, Song::with_name(name.to_string()))?;
        }

        relationships::attach_album_to_artist(gw, ARTIST_1_ID, ALBUM_1_ID)?;
        relationships::attach_album_to_artist(gw, ARTIST_2_ID, ALBUM_2_ID)?;

        for (song, album, artist, genre) in [
            (SONG_1_ID, ALBUM_1_ID, ARTIST_1_ID, GENRE_1_ID),
            (SONG_2_ID, ALBUM_1_ID, ARTIST_1_ID, GENRE_1_ID),
            (SONG_3_ID, ALBUM_2_ID, ARTIST_2_ID, GENRE_2_ID),
        ] {
            relationships::attach_song_to_album(gw, album, song)?;
            relationships::set_song_artist(gw, song, artist)?;
            relationships::set_song_genre(gw, song, genre)?;
        }

        relationships::attach_song_to_playlist(gw, PLAYLIST_1_ID, SONG_1_ID)?;
        relationships::attach_song_to_playlist(gw, PLAYLIST_1_ID, SONG_3_ID)?;
        Ok(())
    })?;

    Ok((dir, catalog_db_path))
}
