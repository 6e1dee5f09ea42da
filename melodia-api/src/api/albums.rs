//! Album catalog endpoints

use axum::{extract::State, Json};
use melodia_common::catalog;
use melodia_common::models::Album;
use melodia_common::store::{from_item, to_item, ALBUMS};
use serde_json::{json, Value};
use tracing::info;

use crate::{ApiError, ApiResult, AppState};

/// GET /api/albums
///
/// Every album in the catalog.
pub async fn list_albums(State(state): State<AppState>) -> ApiResult<Json<Vec<Album>>> {
    let albums = state
        .store
        .scan(&ALBUMS)
        .await?
        .into_iter()
        .map(from_item)
        .collect::<melodia_common::Result<Vec<Album>>>()?;

    Ok(Json(albums))
}

/// POST /api/albums
///
/// Loads the seed albums into the catalog, overwriting albums with the same id.
pub async fn seed_albums(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let albums = catalog::seed_albums()?;
    if albums.is_empty() {
        return Err(ApiError::BadRequest("No albums to upload".to_string()));
    }

    let items = albums
        .iter()
        .map(to_item)
        .collect::<melodia_common::Result<Vec<_>>>()?;

    let written = state.store.batch_write_all(&ALBUMS, items).await?;

    info!("Seeded {} albums", written);
    Ok(Json(json!({
        "message": format!("Successfully uploaded {} albums!", written)
    })))
}
