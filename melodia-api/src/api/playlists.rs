//! Playlist endpoints
//!
//! Playlists are stored under the owning user's partition. The Liked Songs
//! playlist lives there too but is only changed through the liked-songs
//! endpoint.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use melodia_common::library::{cover_for, remove_song, sort_playlists};
use melodia_common::models::{Playlist, PlaylistSong, LIKED_SONGS_PLAYLIST_ID};
use melodia_common::store::{from_item, to_item, PLAYLISTS};
use melodia_common::{Error as CommonError, Key, UpdateExpression};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::{ApiError, ApiJson, ApiResult, AppState, CurrentUser};

const ACTION_REMOVE_SONG: &str = "remove_song_from_playlist";
const ACTION_DELETE: &str = "delete_playlist";

/// GET /api/playlists
///
/// The caller's playlists, Liked Songs first.
pub async fn list_playlists(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Playlist>>> {
    let mut playlists = state
        .store
        .query(&PLAYLISTS, &user.user_id)
        .await?
        .into_iter()
        .map(from_item)
        .collect::<melodia_common::Result<Vec<Playlist>>>()?;

    sort_playlists(&mut playlists);
    Ok(Json(playlists))
}

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    #[serde(default)]
    pub nombre_playlist: Option<String>,
    #[serde(default)]
    pub canciones: Option<Vec<PlaylistSong>>,
}

/// POST /api/playlists/create
pub async fn create_playlist(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<CreatePlaylistRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let name = req
        .nombre_playlist
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let songs = req.canciones.filter(|songs| !songs.is_empty());

    let (Some(name), Some(songs)) = (name, songs) else {
        return Err(ApiError::BadRequest(
            "Playlist name and at least one song are required".to_string(),
        ));
    };

    let playlist = Playlist::new_custom(&user.user_id, name, songs, Utc::now());
    state.store.put(&PLAYLISTS, to_item(&playlist)?).await?;

    info!(
        "Created playlist {} for {} with {} songs",
        playlist.playlist_id,
        user.user_id,
        playlist.songs.len()
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Playlist created",
            "playlist": playlist,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ManagePlaylistRequest {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(rename = "playlistId", default)]
    pub playlist_id: Option<String>,
    #[serde(rename = "songIdToRemove", default)]
    pub song_id_to_remove: Option<String>,
}

/// POST /api/playlists/manage
pub async fn manage_playlist(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<ManagePlaylistRequest>,
) -> ApiResult<Json<Value>> {
    let action = req.action.filter(|a| !a.is_empty());
    let playlist_id = req.playlist_id.filter(|id| !id.is_empty());
    let (Some(action), Some(playlist_id)) = (action, playlist_id) else {
        return Err(ApiError::BadRequest(
            "Action and playlist id are required".to_string(),
        ));
    };

    if playlist_id == LIKED_SONGS_PLAYLIST_ID {
        match action.as_str() {
            ACTION_DELETE => {
                return Err(ApiError::Forbidden(
                    "The Liked Songs playlist cannot be deleted".to_string(),
                ))
            }
            ACTION_REMOVE_SONG => {
                return Err(ApiError::Forbidden(
                    "Unlike the song to remove it from Liked Songs".to_string(),
                ))
            }
            _ => {}
        }
    }

    let key = Key::composite(user.user_id.as_str(), playlist_id.as_str());

    match action.as_str() {
        ACTION_REMOVE_SONG => {
            let song_id = req
                .song_id_to_remove
                .filter(|id| !id.is_empty())
                .ok_or_else(|| {
                    ApiError::BadRequest("Id of the song to remove is required".to_string())
                })?;

            let updated = state
                .store
                .update_with(&PLAYLISTS, &key, |current| {
                    let songs = current
                        .and_then(|item| item.get("canciones"))
                        .filter(|songs| !songs.is_null())
                        .ok_or_else(|| {
                            CommonError::NotFound("Playlist or songs not found".to_string())
                        })?;
                    let songs: Vec<PlaylistSong> = serde_json::from_value(songs.clone())?;
                    let remaining = remove_song(songs, &song_id);

                    Ok(UpdateExpression::new()
                        .set("foto_portada", cover_for(&remaining))
                        .set("canciones", serde_json::to_value(&remaining)?))
                })
                .await?;

            info!("Removed song {} from playlist {}", song_id, playlist_id);
            Ok(Json(json!({
                "message": "Song removed from playlist",
                "playlistId": playlist_id,
                "songIdRemoved": song_id,
                "updatedPlaylist": updated,
            })))
        }
        ACTION_DELETE => {
            state.store.delete(&PLAYLISTS, &key).await?;

            info!("Deleted playlist {} for {}", playlist_id, user.user_id);
            Ok(Json(json!({
                "message": "Playlist deleted",
                "playlistId": playlist_id,
            })))
        }
        _ => Err(ApiError::BadRequest("Invalid action".to_string())),
    }
}
