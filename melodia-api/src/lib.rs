//! melodia-api library - HTTP service for the Melodia music library
//!
//! Catalog routes (albums, songs) are public. Everything under a user's
//! library (playlists, liked songs, favorite albums) requires a session.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use melodia_common::DocumentStore;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod extract;
pub mod session;

pub use error::{ApiError, ApiResult};
pub use extract::ApiJson;
pub use session::CurrentUser;

/// Request bodies above this size are rejected
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Shared document store client
    pub store: DocumentStore,
    /// Secret used to verify session tokens
    pub session_secret: Arc<str>,
}

impl AppState {
    /// Create new application state
    pub fn new(store: DocumentStore, session_secret: &str) -> Self {
        Self {
            store,
            session_secret: Arc::from(session_secret),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/api/albums", get(api::list_albums).post(api::seed_albums))
        .route("/api/songs", get(api::list_songs).post(api::seed_songs))
        .route("/api/playlists", get(api::list_playlists))
        .route("/api/playlists/create", post(api::create_playlist))
        .route("/api/playlists/manage", post(api::manage_playlist))
        .route(
            "/api/playlists/liked-songs/manage",
            get(api::list_liked_song_ids).post(api::toggle_liked_song),
        )
        .route(
            "/api/me/favorite-albums",
            get(api::list_favorite_albums).post(api::manage_favorite_album),
        )
        .route("/api/me", get(api::whoami))
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
