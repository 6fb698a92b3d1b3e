use anyhow::{Context, Result};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::errors::ApiError;
use super::metrics::{adjust_catalog_count, metrics_handler, record_db_query};
use super::views::{AlbumView, SongOwner, SongView, ToView};
use super::{log_requests, state::*, ServerConfig};
use crate::catalog_store::{
    relationships, require, validate_name, Album, Artist, CatalogError, CatalogGateway,
    CatalogResult, EntityId, EntityKind, Genre, Playlist, Repository, Song, SqliteCatalogStore,
    SqliteGateway,
};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

/// Create and update body. Relationship fields are never accepted here.
#[derive(Deserialize, Debug)]
struct NameBody {
    pub name: Option<String>,
}

fn accept_name(body: Result<Json<NameBody>, JsonRejection>) -> Result<String, ApiError> {
    let Json(body) = body?;
    Ok(validate_name(body.name.as_deref()).map_err(CatalogError::from)?)
}

fn parse_id(kind: EntityKind, raw: &str) -> Result<EntityId, ApiError> {
    raw.parse::<EntityId>().map_err(|_| ApiError::MalformedId {
        kind,
        raw: raw.to_string(),
    })
}

fn read_scope<R, F>(store: &SqliteCatalogStore, f: F) -> CatalogResult<R>
where
    F: FnOnce(&SqliteGateway<'_>) -> CatalogResult<R>,
{
    let start = Instant::now();
    let result = store.read(f);
    record_db_query("read", start.elapsed());
    result
}

fn write_scope<R, F>(store: &SqliteCatalogStore, f: F) -> CatalogResult<R>
where
    F: FnOnce(&SqliteGateway<'_>) -> CatalogResult<R>,
{
    let start = Instant::now();
    let result = store.write(f);
    record_db_query("write", start.elapsed());
    result
}

fn views_of<T: ToView, G: CatalogGateway + ?Sized>(
    gateway: &G,
    entities: Vec<T>,
) -> Result<Vec<T::View>> {
    entities.into_iter().map(|e| e.to_view(gateway)).collect()
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

// =============================================================================
// Collection CRUD
// =============================================================================

async fn list_entities<T: ToView>(
    State(store): State<GuardedCatalogStore>,
) -> Result<Json<Vec<T::View>>, ApiError> {
    let views = read_scope(&store, |gw| {
        let entities = Repository::<T>::list(gw)?;
        Ok(views_of(gw, entities)?)
    })?;
    Ok(Json(views))
}

async fn get_entity<T: ToView>(
    State(store): State<GuardedCatalogStore>,
    Path(raw_id): Path<String>,
) -> Result<Json<T::View>, ApiError> {
    let id = parse_id(T::KIND, &raw_id)?;
    let view = read_scope(&store, |gw| {
        let entity: T = require(gw, id)?;
        Ok(entity.to_view(gw)?)
    })?;
    Ok(Json(view))
}

async fn create_entity<T: ToView>(
    State(store): State<GuardedCatalogStore>,
    body: Result<Json<NameBody>, JsonRejection>,
) -> Result<Json<T::View>, ApiError> {
    let name = accept_name(body)?;
    let (id, view) = write_scope(&store, |gw| {
        let entity = Repository::<T>::add(gw, T::with_name(name))?;
        Ok((entity.id(), entity.to_view(gw)?))
    })?;
    adjust_catalog_count(T::KIND, 1.0);
    info!("Created {} {}", T::KIND, id);
    Ok(Json(view))
}

async fn update_entity<T: ToView>(
    State(store): State<GuardedCatalogStore>,
    Path(raw_id): Path<String>,
    body: Result<Json<NameBody>, JsonRejection>,
) -> Result<Json<T::View>, ApiError> {
    let id = parse_id(T::KIND, &raw_id)?;
    let name = accept_name(body)?;
    let view = write_scope(&store, |gw| {
        let mut entity: T = require(gw, id)?;
        entity.set_name(name);
        Repository::<T>::update(gw, &entity)?;
        Ok(entity.to_view(gw)?)
    })?;
    debug!("Renamed {} {}", T::KIND, id);
    Ok(Json(view))
}

async fn delete_entity<T: ToView>(
    State(store): State<GuardedCatalogStore>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(T::KIND, &raw_id)?;
    write_scope(&store, |gw| relationships::delete_entity::<T, _>(gw, id))?;
    adjust_catalog_count(T::KIND, -1.0);
    info!("Deleted {} {}", T::KIND, id);
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Nested reads
// =============================================================================

async fn list_owned_songs<T: SongOwner>(
    State(store): State<GuardedCatalogStore>,
    Path(raw_id): Path<String>,
) -> Result<Json<Vec<SongView>>, ApiError> {
    let id = parse_id(T::KIND, &raw_id)?;
    let views = read_scope(&store, |gw| {
        let owner: T = require(gw, id)?;
        let songs = gw.songs_referencing(T::REFERENCE, owner.id())?;
        Ok(views_of(gw, songs)?)
    })?;
    Ok(Json(views))
}

async fn get_owned_song<T: SongOwner>(
    State(store): State<GuardedCatalogStore>,
    Path((raw_id, raw_song_id)): Path<(String, String)>,
) -> Result<Json<SongView>, ApiError> {
    let id = parse_id(T::KIND, &raw_id)?;
    let song_id = parse_id(EntityKind::Song, &raw_song_id)?;
    let view = read_scope(&store, |gw| {
        let owner: T = require(gw, id)?;
        let song: Song = require(gw, song_id)?;
        if T::REFERENCE.get(&song) != Some(owner.id()) {
            return Err(CatalogError::not_found(EntityKind::Song, song_id));
        }
        Ok(song.to_view(gw)?)
    })?;
    Ok(Json(view))
}

async fn list_artist_albums(
    State(store): State<GuardedCatalogStore>,
    Path(raw_id): Path<String>,
) -> Result<Json<Vec<AlbumView>>, ApiError> {
    let id = parse_id(EntityKind::Artist, &raw_id)?;
    let views = read_scope(&store, |gw| {
        let artist: Artist = require(gw, id)?;
        let albums = gw.albums_by_artist(artist.id)?;
        Ok(views_of(gw, albums)?)
    })?;
    Ok(Json(views))
}

async fn get_artist_album(
    State(store): State<GuardedCatalogStore>,
    Path((raw_id, raw_album_id)): Path<(String, String)>,
) -> Result<Json<AlbumView>, ApiError> {
    let id = parse_id(EntityKind::Artist, &raw_id)?;
    let album_id = parse_id(EntityKind::Album, &raw_album_id)?;
    let view = read_scope(&store, |gw| {
        let artist: Artist = require(gw, id)?;
        let album: Album = require(gw, album_id)?;
        if album.artist_id != Some(artist.id) {
            return Err(CatalogError::not_found(EntityKind::Album, album_id));
        }
        Ok(album.to_view(gw)?)
    })?;
    Ok(Json(view))
}

// =============================================================================
// Associations
// =============================================================================

/// Parse both path ids in order, then run `f` in one write scope.
fn associate<V, F>(
    store: &SqliteCatalogStore,
    first: (EntityKind, &str),
    second: (EntityKind, &str),
    f: F,
) -> Result<Json<V>, ApiError>
where
    F: FnOnce(&SqliteGateway<'_>, EntityId, EntityId) -> CatalogResult<V>,
{
    let first_id = parse_id(first.0, first.1)?;
    let second_id = parse_id(second.0, second.1)?;
    let view = write_scope(store, |gw| f(gw, first_id, second_id))?;
    Ok(Json(view))
}

async fn put_album_song(
    State(store): State<GuardedCatalogStore>,
    Path((album, song)): Path<(String, String)>,
) -> Result<Json<SongView>, ApiError> {
    associate(
        &store,
        (EntityKind::Album, &album),
        (EntityKind::Song, &song),
        |gw, album_id, song_id| {
            let song = relationships::attach_song_to_album(gw, album_id, song_id)?;
            Ok(song.to_view(gw)?)
        },
    )
}

async fn put_artist_album(
    State(store): State<GuardedCatalogStore>,
    Path((artist, album)): Path<(String, String)>,
) -> Result<Json<AlbumView>, ApiError> {
    associate(
        &store,
        (EntityKind::Artist, &artist),
        (EntityKind::Album, &album),
        |gw, artist_id, album_id| {
            let album = relationships::attach_album_to_artist(gw, artist_id, album_id)?;
            Ok(album.to_view(gw)?)
        },
    )
}

async fn put_playlist_song(
    State(store): State<GuardedCatalogStore>,
    Path((playlist, song)): Path<(String, String)>,
) -> Result<Json<SongView>, ApiError> {
    associate(
        &store,
        (EntityKind::Playlist, &playlist),
        (EntityKind::Song, &song),
        |gw, playlist_id, song_id| {
            let song = relationships::attach_song_to_playlist(gw, playlist_id, song_id)?;
            Ok(song.to_view(gw)?)
        },
    )
}

async fn put_genre_song(
    State(store): State<GuardedCatalogStore>,
    Path((genre, song)): Path<(String, String)>,
) -> Result<Json<SongView>, ApiError> {
    associate(
        &store,
        (EntityKind::Genre, &genre),
        (EntityKind::Song, &song),
        |gw, genre_id, song_id| {
            // Genre is loaded first to keep path order
            let _: Genre = require(gw, genre_id)?;
            let song = relationships::set_song_genre(gw, song_id, genre_id)?;
            Ok(song.to_view(gw)?)
        },
    )
}

async fn put_song_genre(
    State(store): State<GuardedCatalogStore>,
    Path((song, genre)): Path<(String, String)>,
) -> Result<Json<SongView>, ApiError> {
    associate(
        &store,
        (EntityKind::Song, &song),
        (EntityKind::Genre, &genre),
        |gw, song_id, genre_id| {
            let song = relationships::set_song_genre(gw, song_id, genre_id)?;
            Ok(song.to_view(gw)?)
        },
    )
}

async fn put_song_album(
    State(store): State<GuardedCatalogStore>,
    Path((song, album)): Path<(String, String)>,
) -> Result<Json<SongView>, ApiError> {
    associate(
        &store,
        (EntityKind::Song, &song),
        (EntityKind::Album, &album),
        |gw, song_id, album_id| {
            let song = relationships::set_song_album(gw, song_id, album_id)?;
            Ok(song.to_view(gw)?)
        },
    )
}

async fn put_song_artist(
    State(store): State<GuardedCatalogStore>,
    Path((song, artist)): Path<(String, String)>,
) -> Result<Json<SongView>, ApiError> {
    associate(
        &store,
        (EntityKind::Song, &song),
        (EntityKind::Artist, &artist),
        |gw, song_id, artist_id| {
            let song = relationships::set_song_artist(gw, song_id, artist_id)?;
            Ok(song.to_view(gw)?)
        },
    )
}

// =============================================================================
// App
// =============================================================================

fn collection_routes<T: ToView>() -> Router<ServerState> {
    Router::new()
        .route("/", get(list_entities::<T>).post(create_entity::<T>))
        .route(
            "/{id}",
            get(get_entity::<T>)
                .put(update_entity::<T>)
                .delete(delete_entity::<T>),
        )
}

pub fn make_app(config: ServerConfig, catalog_store: GuardedCatalogStore) -> Result<Router> {
    let state = ServerState::new(config, catalog_store);

    let artist_routes = collection_routes::<Artist>()
        .route("/{id}/albums", get(list_artist_albums))
        .route(
            "/{id}/albums/{album_id}",
            get(get_artist_album).put(put_artist_album),
        );

    let album_routes = collection_routes::<Album>()
        .route("/{id}/songs", get(list_owned_songs::<Album>))
        .route(
            "/{id}/songs/{song_id}",
            get(get_owned_song::<Album>).put(put_album_song),
        );

    let genre_routes = collection_routes::<Genre>()
        .route("/{id}/songs", get(list_owned_songs::<Genre>))
        .route(
            "/{id}/songs/{song_id}",
            get(get_owned_song::<Genre>).put(put_genre_song),
        );

    let playlist_routes = collection_routes::<Playlist>()
        .route("/{id}/songs", get(list_owned_songs::<Playlist>))
        .route(
            "/{id}/songs/{song_id}",
            get(get_owned_song::<Playlist>).put(put_playlist_song),
        );

    let song_routes = collection_routes::<Song>()
        .route("/{id}/genre/{genre_id}", put(put_song_genre))
        .route("/{id}/album/{album_id}", put(put_song_album))
        .route("/{id}/artist/{artist_id}", put(put_song_artist));

    let app: Router = Router::new()
        .route("/", get(home))
        .nest("/artists", artist_routes)
        .nest("/albums", album_routes)
        .nest("/genres", genre_routes)
        .nest("/playlists", playlist_routes)
        .nest("/songs", song_routes)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .with_state(state);

    Ok(app)
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(catalog_store: GuardedCatalogStore, config: ServerConfig) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, catalog_store)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    tokio::select! {
        result = async { axum::serve(listener, app).await } => {
            info!("HTTP server stopped: {:?}", result);
            Ok(result?)
        }
        result = async { axum::serve(metrics_listener, make_metrics_app()).await } => {
            info!("Metrics server stopped: {:?}", result);
            Ok(result?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::RequestsLoggingLevel;
    use axum::{body::Body, http::Request};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    fn test_app() -> Router {
        let store = Arc::new(SqliteCatalogStore::in_memory().unwrap());
        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            ..ServerConfig::default()
        };
        make_app(config, store).unwrap()
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(app: &Router, collection: &str, name: &str) -> i64 {
        let (status, body) = call(app, "POST", collection, Some(json!({ "name": name }))).await;
        assert_eq!(status, StatusCode::OK);
        body["id"].as_i64().unwrap()
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 01:01:01");
    }

    #[tokio::test]
    async fn home_reports_stats() {
        let app = test_app();
        let (status, body) = call(&app, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["uptime"].is_string());
        assert!(body["hash"].is_string());
    }

    #[tokio::test]
    async fn create_then_read_album() {
        let app = test_app();
        let id = create(&app, "/albums", "X").await;

        let (status, body) = call(&app, "GET", &format!("/albums/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "X");
        assert_eq!(body["artist"], Value::Null);
        assert_eq!(body["songs"], json!([]));
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids_are_not_found() {
        let app = test_app();
        for uri in ["/songs/999", "/songs/abc", "/albums/7/songs", "/playlists/x/songs/1"] {
            let (status, body) = call(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
            assert_eq!(body["error"]["code"], "NOT_FOUND");
        }
    }

    #[tokio::test]
    async fn invalid_bodies_are_rejected() {
        let app = test_app();
        let too_long = "x".repeat(31);
        let bodies = [
            json!({}),
            json!({ "name": "" }),
            json!({ "name": too_long }),
            json!({ "name": 42 }),
        ];
        for body in bodies {
            let (status, _) = call(&app, "POST", "/genres", Some(body.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        }

        let request = Request::builder()
            .method("POST")
            .uri("/genres")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let (_, genres) = call(&app, "GET", "/genres", None).await;
        assert_eq!(genres, json!([]));
    }

    #[tokio::test]
    async fn update_renames_and_keeps_relationships() {
        let app = test_app();
        let album = create(&app, "/albums", "Abbey Road").await;
        let song = create(&app, "/songs", "Somethin").await;
        call(&app, "PUT", &format!("/albums/{}/songs/{}", album, song), None).await;

        let (status, body) = call(
            &app,
            "PUT",
            &format!("/songs/{}", song),
            Some(json!({ "name": "Something" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Something");
        assert_eq!(body["album"], "Abbey Road");
    }

    #[tokio::test]
    async fn attach_song_to_album_shows_on_both_sides() {
        let app = test_app();
        let album = create(&app, "/albums", "Blue").await;
        let song = create(&app, "/songs", "River").await;

        let (status, body) =
            call(&app, "PUT", &format!("/albums/{}/songs/{}", album, song), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["album"], "Blue");

        let (_, songs) = call(&app, "GET", &format!("/albums/{}/songs", album), None).await;
        assert_eq!(songs.as_array().unwrap().len(), 1);
        assert_eq!(songs[0]["id"], song);

        let (status, _) =
            call(&app, "GET", &format!("/albums/{}/songs/{}", album, song), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn song_not_on_album_is_not_found_under_it() {
        let app = test_app();
        let album = create(&app, "/albums", "Empty").await;
        let song = create(&app, "/songs", "Elsewhere").await;

        let (status, _) =
            call(&app, "GET", &format!("/albums/{}/songs/{}", album, song), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn genre_side_route_sets_song_genre() {
        let app = test_app();
        let genre = create(&app, "/genres", "Blues").await;
        let song = create(&app, "/songs", "Crossroads").await;

        let (status, body) =
            call(&app, "PUT", &format!("/genres/{}/songs/{}", genre, song), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["genre"], "Blues");

        let (_, songs) = call(&app, "GET", &format!("/genres/{}/songs", genre), None).await;
        assert_eq!(songs[0]["name"], "Crossroads");
    }

    #[tokio::test]
    async fn attach_with_missing_entity_is_not_found() {
        let app = test_app();
        let song = create(&app, "/songs", "Lonely").await;

        let (status, _) = call(&app, "PUT", &format!("/playlists/5/songs/{}", song), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = call(&app, "GET", &format!("/songs/{}", song), None).await;
        assert_eq!(body["playlist"], Value::Null);
    }

    #[tokio::test]
    async fn delete_returns_no_content_and_clears_references() {
        let app = test_app();
        let artist = create(&app, "/artists", "Nirvana").await;
        let album = create(&app, "/albums", "Nevermind").await;
        let song = create(&app, "/songs", "Lithium").await;
        call(&app, "PUT", &format!("/artists/{}/albums/{}", artist, album), None).await;
        call(&app, "PUT", &format!("/songs/{}/artist/{}", song, artist), None).await;

        let (_, albums) = call(&app, "GET", &format!("/artists/{}/albums", artist), None).await;
        assert_eq!(albums[0]["artist"], "Nirvana");

        let (status, body) = call(&app, "DELETE", &format!("/artists/{}", artist), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (_, album_body) = call(&app, "GET", &format!("/albums/{}", album), None).await;
        assert_eq!(album_body["artist"], Value::Null);
        let (_, song_body) = call(&app, "GET", &format!("/songs/{}", song), None).await;
        assert_eq!(song_body["artist"], Value::Null);

        let (status, _) = call(&app, "DELETE", &format!("/artists/{}", artist), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    fn request_series_with_path(fragment: &str) -> usize {
        crate::server::metrics::REGISTRY
            .gather()
            .iter()
            .filter(|family| family.get_name() == "music_catalog_http_requests_total")
            .flat_map(|family| family.get_metric().iter())
            .filter(|metric| {
                metric
                    .get_label()
                    .iter()
                    .any(|label| label.get_name() == "path" && label.get_value().contains(fragment))
            })
            .count()
    }

    #[tokio::test]
    async fn request_metrics_are_labelled_by_route() {
        crate::server::metrics::init_metrics();
        let app = test_app();

        for i in 0..200 {
            call(&app, "GET", &format!("/songs/zz{}", i), None).await;
            call(&app, "GET", &format!("/no-such-route-{}", i), None).await;
        }

        assert_eq!(request_series_with_path("zz"), 0);
        assert_eq!(request_series_with_path("no-such-route"), 0);
        assert!(request_series_with_path("/songs/{id}") >= 1);
        assert!(request_series_with_path(crate::server::metrics::UNMATCHED_ROUTE) >= 1);
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_text() {
        crate::server::metrics::init_metrics();
        let response = make_metrics_app()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
