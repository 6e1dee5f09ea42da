//! Integration tests for melodia-api endpoints
//!
//! Each test builds the router over a fresh database in a temp dir and
//! drives it with `oneshot` requests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use melodia_api::{build_router, AppState};
use melodia_common::db::init_database;
use melodia_common::session::issue_token;
use melodia_common::store::PLAYLISTS;
use melodia_common::DocumentStore;
use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

const SECRET: &str = "test-secret-0123456789abcdef";
const USER: &str = "user_alice";

/// Test helper: router over an empty database, with direct store access
async fn setup_app_with_store() -> (TempDir, DocumentStore, Router) {
    let temp = tempfile::tempdir().unwrap();
    let pool = init_database(&temp.path().join("melodia.db")).await.unwrap();
    let store = DocumentStore::new(pool);
    let router = build_router(AppState::new(store.clone(), SECRET));
    (temp, store, router)
}

/// Test helper: router over an empty database
async fn setup_app() -> (TempDir, Router) {
    let (temp, _store, router) = setup_app_with_store().await;
    (temp, router)
}

fn token_for(user: &str) -> String {
    issue_token(
        user,
        Duration::from_secs(3600),
        SECRET,
        Utc::now().timestamp_millis(),
    )
    .unwrap()
}

fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token_for(user)));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Test helper: send a request and return status and JSON body
///
/// Panics if a non-empty body is not JSON.
async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            panic!("{} body is not JSON ({}): {}", status, e, String::from_utf8_lossy(&bytes))
        })
    };
    (status, body)
}

fn raw_request(uri: &str, content_type: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(USER)));
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn song(id: &str, cover: &str) -> Value {
    json!({
        "id": id,
        "nombre": format!("Song {}", id),
        "artista": "Nirvana",
        "album": "Nevermind",
        "foto": cover,
        "pista": format!("/songs/{}.mp3", id)
    })
}

async fn create_playlist(app: &Router, name: &str, songs: Vec<Value>) -> Value {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/playlists/create",
            Some(USER),
            Some(json!({"nombre_playlist": name, "canciones": songs})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["playlist"].clone()
}

// =============================================================================
// Health and session
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let (_temp, app) = setup_app().await;

    let (status, body) = send(&app, request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "melodia-api");
    assert!(body["version"].is_string());
    assert!(!body["git_hash"].as_str().unwrap().is_empty());
    assert!(!body["build_timestamp"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let (_temp, app) = setup_app().await;

    for (method, uri) in [
        ("GET", "/api/me"),
        ("GET", "/api/playlists"),
        ("GET", "/api/playlists/liked-songs/manage"),
        ("GET", "/api/me/favorite-albums"),
    ] {
        let (status, body) = send(&app, request(method, uri, None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body["error"], "Unauthorized");
    }
}

#[tokio::test]
async fn test_me_returns_user_id() {
    let (_temp, app) = setup_app().await;

    let (status, body) = send(&app, request("GET", "/api/me", Some(USER), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"userId": USER}));
}

#[tokio::test]
async fn test_session_cookie_accepted() {
    let (_temp, app) = setup_app().await;

    let req = Request::builder()
        .uri("/api/me")
        .header(header::COOKIE, format!("__session={}", token_for("user_bob")))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], "user_bob");
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_seed_and_list_albums() {
    let (_temp, app) = setup_app().await;

    let (status, body) = send(&app, request("GET", "/api/albums", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = send(&app, request("POST", "/api/albums", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully uploaded 1 albums!");

    let (_, body) = send(&app, request("GET", "/api/albums", None, None)).await;
    let albums = body.as_array().unwrap();
    assert_eq!(albums.len(), 1);
    assert_eq!(albums[0]["id"], "1");
    assert_eq!(albums[0]["nombre_album"], "Thriller");
    assert_eq!(albums[0]["canciones"].as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn test_seed_songs_is_idempotent() {
    let (_temp, app) = setup_app().await;

    for _ in 0..2 {
        let (status, body) = send(&app, request("POST", "/api/songs", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Successfully uploaded 12 songs!");
    }

    let (_, body) = send(&app, request("GET", "/api/songs", None, None)).await;
    let songs = body.as_array().unwrap();
    assert_eq!(songs.len(), 12);
    assert!(songs
        .iter()
        .any(|s| s["Nombre de la canción"] == "Smells Like Teen Spirit"));
}

// =============================================================================
// Playlists
// =============================================================================

#[tokio::test]
async fn test_create_playlist() {
    let (_temp, app) = setup_app().await;

    let playlist = create_playlist(
        &app,
        "Road trip",
        vec![song("20", "/img/Nevermind.png"), song("21", "/img/Other.png")],
    )
    .await;

    assert_eq!(playlist["usuario_id"], USER);
    assert_eq!(playlist["nombre_playlist"], "Road trip");
    assert_eq!(playlist["es_liked_songs"], false);
    assert_eq!(playlist["foto_portada"], "/img/Nevermind.png");
    assert_eq!(playlist["playlist_id"].as_str().unwrap().len(), 36);
    assert!(playlist["fecha_creacion"].is_string());
}

#[tokio::test]
async fn test_create_playlist_validation() {
    let (_temp, app) = setup_app().await;

    for body in [
        json!({"canciones": [song("20", "")]}),
        json!({"nombre_playlist": "   ", "canciones": [song("20", "")]}),
        json!({"nombre_playlist": "Empty", "canciones": []}),
        json!({"nombre_playlist": "No songs"}),
    ] {
        let (status, response) = send(
            &app,
            request("POST", "/api/playlists/create", Some(USER), Some(body.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        assert!(response["error"].is_string());
    }
}

#[tokio::test]
async fn test_list_playlists_sorted_and_scoped_to_user() {
    let (_temp, app) = setup_app().await;

    create_playlist(&app, "zebra", vec![song("1", "")]).await;
    create_playlist(&app, "Apple", vec![song("2", "")]).await;
    send(
        &app,
        request(
            "POST",
            "/api/playlists/liked-songs/manage",
            Some(USER),
            Some(song("3", "")),
        ),
    )
    .await;
    send(
        &app,
        request(
            "POST",
            "/api/playlists/create",
            Some("user_bob"),
            Some(json!({"nombre_playlist": "Bob's", "canciones": [song("4", "")]})),
        ),
    )
    .await;

    let (status, body) = send(&app, request("GET", "/api/playlists", Some(USER), None)).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["nombre_playlist"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Liked Songs", "Apple", "zebra"]);
}

#[tokio::test]
async fn test_remove_song_from_playlist_updates_cover() {
    let (_temp, app) = setup_app().await;
    let playlist = create_playlist(
        &app,
        "Mix",
        vec![song("20", "/img/a.png"), song("21", "/img/b.png")],
    )
    .await;
    let playlist_id = playlist["playlist_id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/playlists/manage",
            Some(USER),
            Some(json!({
                "action": "remove_song_from_playlist",
                "playlistId": playlist_id,
                "songIdToRemove": "20"
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["playlistId"], playlist_id);
    assert_eq!(body["songIdRemoved"], "20");
    assert_eq!(body["updatedPlaylist"]["foto_portada"], "/img/b.png");
    assert_eq!(body["updatedPlaylist"]["nombre_playlist"], "Mix");
    assert_eq!(body["updatedPlaylist"]["canciones"].as_array().unwrap().len(), 1);

    // Removing the last song falls back to the default cover
    let (_, body) = send(
        &app,
        request(
            "POST",
            "/api/playlists/manage",
            Some(USER),
            Some(json!({
                "action": "remove_song_from_playlist",
                "playlistId": playlist_id,
                "songIdToRemove": "21"
            })),
        ),
    )
    .await;
    assert_eq!(
        body["updatedPlaylist"]["foto_portada"],
        "/img/default_playlist_cover.png"
    );
    assert_eq!(body["updatedPlaylist"]["canciones"], json!([]));
}

#[tokio::test]
async fn test_remove_song_from_missing_playlist_is_not_found() {
    let (_temp, app) = setup_app().await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/playlists/manage",
            Some(USER),
            Some(json!({
                "action": "remove_song_from_playlist",
                "playlistId": "does-not-exist",
                "songIdToRemove": "20"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, request("GET", "/api/playlists", Some(USER), None)).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_playlists_of_other_users_are_invisible() {
    let (_temp, app) = setup_app().await;
    let playlist = create_playlist(&app, "Mine", vec![song("20", "")]).await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/playlists/manage",
            Some("user_mallory"),
            Some(json!({
                "action": "remove_song_from_playlist",
                "playlistId": playlist["playlist_id"],
                "songIdToRemove": "20"
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_playlist() {
    let (_temp, app) = setup_app().await;
    let playlist = create_playlist(&app, "Temp", vec![song("20", "")]).await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/playlists/manage",
            Some(USER),
            Some(json!({"action": "delete_playlist", "playlistId": playlist["playlist_id"]})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["playlistId"], playlist["playlist_id"]);

    let (_, body) = send(&app, request("GET", "/api/playlists", Some(USER), None)).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_liked_songs_playlist_is_protected() {
    let (_temp, app) = setup_app().await;

    for action in ["delete_playlist", "remove_song_from_playlist"] {
        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/playlists/manage",
                Some(USER),
                Some(json!({
                    "action": action,
                    "playlistId": "__LIKED_SONGS__",
                    "songIdToRemove": "20"
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", action);
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_manage_playlist_validation() {
    let (_temp, app) = setup_app().await;

    for body in [
        json!({"playlistId": "p1"}),
        json!({"action": "delete_playlist"}),
        json!({"action": "rename", "playlistId": "p1"}),
        json!({"action": "remove_song_from_playlist", "playlistId": "p1"}),
    ] {
        let (status, _) = send(
            &app,
            request("POST", "/api/playlists/manage", Some(USER), Some(body.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    }
}

// =============================================================================
// Liked songs
// =============================================================================

#[tokio::test]
async fn test_liked_songs_empty_before_first_like() {
    let (_temp, app) = setup_app().await;

    let (status, body) = send(
        &app,
        request("GET", "/api/playlists/liked-songs/manage", Some(USER), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_like_toggle_creates_playlist_then_removes() {
    let (_temp, app) = setup_app().await;
    let like = |id: &str| {
        request(
            "POST",
            "/api/playlists/liked-songs/manage",
            Some(USER),
            Some(song(id, "/img/x.png")),
        )
    };

    let (status, body) = send(&app, like("20")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "added");
    assert_eq!(body["songId"], "20");

    send(&app, like("21")).await;

    let (_, ids) = send(
        &app,
        request("GET", "/api/playlists/liked-songs/manage", Some(USER), None),
    )
    .await;
    assert_eq!(ids, json!(["20", "21"]));

    let (_, playlists) = send(&app, request("GET", "/api/playlists", Some(USER), None)).await;
    let liked = &playlists[0];
    assert_eq!(liked["playlist_id"], "__LIKED_SONGS__");
    assert_eq!(liked["nombre_playlist"], "Liked Songs");
    assert_eq!(liked["es_liked_songs"], true);
    assert_eq!(liked["foto_portada"], "/img/LikedSongs.png");

    let (_, body) = send(&app, like("20")).await;
    assert_eq!(body["action"], "removed");

    let (_, ids) = send(
        &app,
        request("GET", "/api/playlists/liked-songs/manage", Some(USER), None),
    )
    .await;
    assert_eq!(ids, json!(["21"]));
}

#[tokio::test]
async fn test_like_requires_song_id() {
    let (_temp, app) = setup_app().await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/playlists/liked-songs/manage",
            Some(USER),
            Some(json!({"nombre": "No id"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Favorite albums
// =============================================================================

#[tokio::test]
async fn test_favorite_album_add_list_remove() {
    let (_temp, app) = setup_app().await;
    let album = json!({
        "id": "1",
        "nombre_album": "Thriller",
        "artista": "Michael Jackson",
        "foto_portada": "/img/Thriller.png",
        "año_publicación": 1982
    });

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/me/favorite-albums",
            Some(USER),
            Some(json!({"albumData": album, "action": "add"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["albumId"], "1");
    assert_eq!(body["action"], "added");

    let (_, list) = send(&app, request("GET", "/api/me/favorite-albums", Some(USER), None)).await;
    let favorites = list.as_array().unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0]["id"], "1");
    assert_eq!(favorites[0]["nombre_album"], "Thriller");
    assert_eq!(favorites[0]["año_publicación"], 1982);
    assert!(favorites[0]["fecha_agregado"].is_string());
    assert!(favorites[0].get("usuario_id").is_none());

    let (_, body) = send(
        &app,
        request(
            "POST",
            "/api/me/favorite-albums",
            Some(USER),
            Some(json!({"albumData": {"id": "1"}, "action": "remove"})),
        ),
    )
    .await;
    assert_eq!(body["action"], "removed");

    let (_, list) = send(&app, request("GET", "/api/me/favorite-albums", Some(USER), None)).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_favorite_album_validation() {
    let (_temp, app) = setup_app().await;

    for body in [
        json!({"action": "add"}),
        json!({"albumData": {"nombre_album": "No id"}, "action": "add"}),
        json!({"albumData": {"id": "1"}}),
        json!({"albumData": {"id": "1"}, "action": "toggle"}),
    ] {
        let (status, _) = send(
            &app,
            request("POST", "/api/me/favorite-albums", Some(USER), Some(body.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    }
}

// =============================================================================
// Malformed bodies and stored nulls
// =============================================================================

#[tokio::test]
async fn test_malformed_json_answers_with_json_error() {
    let (_temp, app) = setup_app().await;

    for uri in [
        "/api/playlists/create",
        "/api/playlists/manage",
        "/api/playlists/liked-songs/manage",
        "/api/me/favorite-albums",
    ] {
        let (status, body) = send(&app, raw_request(uri, Some("application/json"), "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["error"].is_string(), "{}", uri);
    }
}

#[tokio::test]
async fn test_missing_content_type_answers_with_json_error() {
    let (_temp, app) = setup_app().await;

    let (status, body) = send(
        &app,
        raw_request("/api/playlists/manage", None, r#"{"action": "delete_playlist"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_wrong_field_type_answers_with_json_error() {
    let (_temp, app) = setup_app().await;

    let (status, body) = send(
        &app,
        raw_request(
            "/api/playlists/manage",
            Some("application/json"),
            r#"{"action": 5, "playlistId": "p1"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());
}

async fn put_liked_songs_with_null_list(store: &DocumentStore) {
    let item = json!({
        "usuario_id": USER,
        "playlist_id": "__LIKED_SONGS__",
        "nombre_playlist": "Liked Songs",
        "canciones": null
    });
    let Value::Object(item) = item else { unreachable!() };
    store.put(&PLAYLISTS, item).await.unwrap();
}

#[tokio::test]
async fn test_null_liked_song_list_reads_as_empty() {
    let (_temp, store, app) = setup_app_with_store().await;
    put_liked_songs_with_null_list(&store).await;

    let (status, body) = send(
        &app,
        request("GET", "/api/playlists/liked-songs/manage", Some(USER), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/playlists/liked-songs/manage",
            Some(USER),
            Some(song("20", "")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "added");

    let (status, playlists) = send(&app, request("GET", "/api/playlists", Some(USER), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(playlists[0]["canciones"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_remove_song_from_null_song_list_is_not_found() {
    let (_temp, store, app) = setup_app_with_store().await;
    let item = json!({"usuario_id": USER, "playlist_id": "p1", "canciones": null});
    let Value::Object(item) = item else { unreachable!() };
    store.put(&PLAYLISTS, item).await.unwrap();

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/playlists/manage",
            Some(USER),
            Some(json!({
                "action": "remove_song_from_playlist",
                "playlistId": "p1",
                "songIdToRemove": "20"
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_null_song_list_lists_as_empty_playlist() {
    let (_temp, store, app) = setup_app_with_store().await;
    put_liked_songs_with_null_list(&store).await;

    let (status, body) = send(&app, request("GET", "/api/playlists", Some(USER), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["canciones"], json!([]));
}
