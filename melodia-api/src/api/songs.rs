//! Song catalog endpoints

use axum::{extract::State, Json};
use melodia_common::catalog;
use melodia_common::models::Song;
use melodia_common::store::{from_item, to_item, SONGS};
use serde_json::{json, Value};
use tracing::info;

use crate::{ApiError, ApiResult, AppState};

/// GET /api/songs
pub async fn list_songs(State(state): State<AppState>) -> ApiResult<Json<Vec<Song>>> {
    let songs = state
        .store
        .scan(&SONGS)
        .await?
        .into_iter()
        .map(from_item)
        .collect::<melodia_common::Result<Vec<Song>>>()?;

    Ok(Json(songs))
}

/// POST /api/songs
///
/// Loads the seed songs into the catalog.
pub async fn seed_songs(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let songs = catalog::seed_songs()?;
    if songs.is_empty() {
        return Err(ApiError::BadRequest("No songs to upload".to_string()));
    }

    let items = songs
        .iter()
        .map(to_item)
        .collect::<melodia_common::Result<Vec<_>>>()?;
    let written = state.store.batch_write_all(&SONGS, items).await?;

    info!("Seeded {} songs", written);
    Ok(Json(json!({
        "message": format!("Successfully uploaded {} songs!", written)
    })))
}
