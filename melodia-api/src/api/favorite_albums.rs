//! Favorite album endpoints

use axum::{extract::State, Json};
use chrono::Utc;
use melodia_common::library::LikeAction;
use melodia_common::models::{FavoriteAlbum, FavoriteAlbumPayload, FavoriteAlbumRecord};
use melodia_common::store::{from_item, to_item, FAVORITE_ALBUMS};
use melodia_common::Key;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::{ApiError, ApiJson, ApiResult, AppState, CurrentUser};

/// GET /api/me/favorite-albums
pub async fn list_favorite_albums(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<FavoriteAlbum>>> {
    let albums = state
        .store
        .query(&FAVORITE_ALBUMS, &user.user_id)
        .await?
        .into_iter()
        .map(|item| from_item::<FavoriteAlbumRecord>(item).map(FavoriteAlbum::from))
        .collect::<melodia_common::Result<Vec<_>>>()?;

    Ok(Json(albums))
}

#[derive(Debug, Deserialize)]
pub struct ManageFavoriteRequest {
    #[serde(rename = "albumData", default)]
    pub album_data: Option<FavoriteAlbumPayload>,
    #[serde(default)]
    pub action: Option<String>,
}

/// POST /api/me/favorite-albums
///
/// `action` is `add` or `remove`.
pub async fn manage_favorite_album(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<ManageFavoriteRequest>,
) -> ApiResult<Json<Value>> {
    let album = req.album_data.filter(|album| !album.id.is_empty());
    let action = req.action.filter(|action| !action.is_empty());
    let (Some(album), Some(action)) = (album, action) else {
        return Err(ApiError::BadRequest(
            "Album data and action are required".to_string(),
        ));
    };
    let album_id = album.id.clone();

    let (done, message) = match action.as_str() {
        "add" => {
            let record = FavoriteAlbumRecord::from_payload(&user.user_id, album, Utc::now());
            state.store.put(&FAVORITE_ALBUMS, to_item(&record)?).await?;
            (LikeAction::Added, "Album added to favorites")
        }
        "remove" => {
            let key = Key::composite(user.user_id.as_str(), album_id.as_str());
            state.store.delete(&FAVORITE_ALBUMS, &key).await?;
            (LikeAction::Removed, "Album removed from favorites")
        }
        _ => return Err(ApiError::BadRequest("Invalid action".to_string())),
    };

    info!("Favorite album {} {} for {}", album_id, done.as_str(), user.user_id);
    Ok(Json(json!({
        "message": message,
        "albumId": album_id,
        "action": done,
    })))
}
