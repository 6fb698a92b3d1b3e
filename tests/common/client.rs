//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per catalog endpoint.
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn put_empty(&self, path: String) -> Response {
        self.client
            .put(self.url(&path))
            .send()
            .await
            .expect("Association request failed")
    }

    // ========================================================================
    // Collection Endpoints
    // ========================================================================

    /// GET /
    pub async fn get_home(&self) -> Response {
        self.get_path("").await
    }

    /// GET an arbitrary path, for malformed ids and other raw requests
    pub async fn get_path(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// GET /{collection}
    pub async fn list_entities(&self, collection: &str) -> Response {
        self.get_path(collection).await
    }

    /// GET /{collection}/{id}
    pub async fn get_entity(&self, collection: &str, id: i64) -> Response {
        self.get_path(&format!("{}/{}", collection, id)).await
    }

    /// POST /{collection}
    pub async fn create_entity(&self, collection: &str, name: &str) -> Response {
        self.create_entity_raw(collection, json!({ "name": name }))
            .await
    }

    /// POST /{collection} with an arbitrary JSON body
    pub async fn create_entity_raw(
        &self,
        collection: &str,
        body: serde_json::Value,
    ) -> Response {
        self.client
            .post(self.url(collection))
            .json(&body)
            .send()
            .await
            .expect("Create request failed")
    }

    /// PUT /{collection}/{id}
    pub async fn rename_entity(&self, collection: &str, id: i64, name: &str) -> Response {
        self.client
            .put(self.url(&format!("{}/{}", collection, id)))
            .json(&json!({ "name": name }))
            .send()
            .await
            .expect("Update request failed")
    }

    /// DELETE /{collection}/{id}
    pub async fn delete_entity(&self, collection: &str, id: i64) -> Response {
        self.client
            .delete(self.url(&format!("{}/{}", collection, id)))
            .send()
            .await
            .expect("Delete request failed")
    }

    // ========================================================================
    // Nested Reads
    // ========================================================================

    /// GET /{collection}/{id}/songs for albums, genres and playlists
    pub async fn list_songs_of(&self, collection: &str, id: i64) -> Response {
        self.get_path(&format!("{}/{}/songs", collection, id)).await
    }

    /// GET /{collection}/{id}/songs/{song_id}
    pub async fn get_song_of(&self, collection: &str, id: i64, song_id: i64) -> Response {
        self.get_path(&format!("{}/{}/songs/{}", collection, id, song_id))
            .await
    }

    /// GET /artists/{id}/albums
    pub async fn list_artist_albums(&self, artist_id: i64) -> Response {
        self.get_path(&format!("{}/{}/albums", ARTISTS, artist_id))
            .await
    }

    /// GET /artists/{id}/albums/{album_id}
    pub async fn get_artist_album(&self, artist_id: i64, album_id: i64) -> Response {
        self.get_path(&format!("{}/{}/albums/{}", ARTISTS, artist_id, album_id))
            .await
    }

    // ========================================================================
    // Associations
    // ========================================================================

    /// PUT /albums/{id}/songs/{song_id}
    pub async fn attach_song_to_album(&self, album_id: i64, song_id: i64) -> Response {
        self.put_empty(format!("{}/{}/songs/{}", ALBUMS, album_id, song_id))
            .await
    }

    /// PUT /artists/{id}/albums/{album_id}
    pub async fn attach_album_to_artist(&self, artist_id: i64, album_id: i64) -> Response {
        self.put_empty(format!("{}/{}/albums/{}", ARTISTS, artist_id, album_id))
            .await
    }

    /// PUT /playlists/{id}/songs/{song_id}
    pub async fn attach_song_to_playlist(&self, playlist_id: i64, song_id: i64) -> Response {
        self.put_empty(format!("{}/{}/songs/{}", PLAYLISTS, playlist_id, song_id))
            .await
    }

    /// PUT /genres/{id}/songs/{song_id}
    pub async fn attach_song_to_genre(&self, genre_id: i64, song_id: i64) -> Response {
        self.put_empty(format!("{}/{}/songs/{}", GENRES, genre_id, song_id))
            .await
    }

    /// PUT /songs/{id}/genre/{genre_id}
    pub async fn set_song_genre(&self, song_id: i64, genre_id: i64) -> Response {
        self.put_empty(format!("{}/{}/genre/{}", SONGS, song_id, genre_id))
            .await
    }

    /// PUT /songs/{id}/album/{album_id}
    pub async fn set_song_album(&self, song_id: i64, album_id: i64) -> Response {
        self.put_empty(format!("{}/{}/album/{}", SONGS, song_id, album_id))
            .await
    }

    /// PUT /songs/{id}/artist/{artist_id}
    pub async fn set_song_artist(&self, song_id: i64, artist_id: i64) -> Response {
        self.put_empty(format!("{}/{}/artist/{}", SONGS, song_id, artist_id))
            .await
    }
}
