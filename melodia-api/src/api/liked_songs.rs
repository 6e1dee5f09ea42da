//! Liked Songs endpoints
//!
//! Liking a song toggles it in the caller's Liked Songs playlist. The
//! playlist is created by the first like.

use axum::{extract::State, Json};
use melodia_common::library::{liked_song_ids, toggle_song, LikeAction};
use melodia_common::models::{
    PlaylistSong, LIKED_SONGS_COVER, LIKED_SONGS_NAME, LIKED_SONGS_PLAYLIST_ID,
};
use melodia_common::store::PLAYLISTS;
use melodia_common::{Key, UpdateExpression};
use serde_json::{json, Value};
use tracing::info;

use crate::{ApiError, ApiJson, ApiResult, AppState, CurrentUser};

fn liked_songs_key(user: &CurrentUser) -> Key {
    Key::composite(user.user_id.as_str(), LIKED_SONGS_PLAYLIST_ID)
}

/// Songs stored under `canciones`; absent or null means none
fn songs_of(value: Option<&Value>) -> melodia_common::Result<Vec<PlaylistSong>> {
    match value {
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(songs) => Ok(serde_json::from_value(songs.clone())?),
    }
}

/// GET /api/playlists/liked-songs/manage
///
/// Ids of the caller's liked songs, `[]` if nothing was liked yet.
pub async fn list_liked_song_ids(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<String>>> {
    let item = state
        .store
        .get_projected(&PLAYLISTS, &liked_songs_key(&user), &["canciones"])
        .await?;

    let songs = songs_of(item.as_ref().and_then(|item| item.get("canciones")))?;
    Ok(Json(liked_song_ids(&songs)))
}

/// POST /api/playlists/liked-songs/manage
pub async fn toggle_liked_song(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(song): ApiJson<PlaylistSong>,
) -> ApiResult<Json<Value>> {
    if song.id.is_empty() {
        return Err(ApiError::BadRequest("Song id is required".to_string()));
    }
    let song_id = song.id.clone();

    let mut action = LikeAction::Added;
    state
        .store
        .update_with(&PLAYLISTS, &liked_songs_key(&user), |current| {
            let songs = songs_of(current.and_then(|item| item.get("canciones")))?;
            let (songs, taken) = toggle_song(songs, song);
            action = taken;

            Ok(UpdateExpression::new()
                .set("canciones", serde_json::to_value(&songs)?)
                .set_if_not_exists("nombre_playlist", LIKED_SONGS_NAME)
                .set_if_not_exists("es_liked_songs", true)
                .set_if_not_exists("foto_portada", LIKED_SONGS_COVER))
        })
        .await?;

    info!("Song {} {} for {}", song_id, action.as_str(), user.user_id);
    Ok(Json(json!({
        "message": format!("Song {}", action.as_str()),
        "action": action,
        "songId": song_id,
    })))
}
