//! Domain models
//!
//! Field names on the wire match the attribute names of the stored
//! documents, which predate this service and are kept for compatibility
//! with existing data and clients.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Sort key of the per-user "Liked Songs" playlist
pub const LIKED_SONGS_PLAYLIST_ID: &str = "__LIKED_SONGS__";

/// Display name given to the Liked Songs playlist when it is first created
pub const LIKED_SONGS_NAME: &str = "Liked Songs";

/// Cover image given to the Liked Songs playlist when it is first created
pub const LIKED_SONGS_COVER: &str = "/img/LikedSongs.png";

/// Cover image of a playlist with no songs
pub const DEFAULT_PLAYLIST_COVER: &str = "/img/default_playlist_cover.png";

/// Timestamp format used for `fecha_creacion` / `fecha_agregado`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Read a stored `null` as the type's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ========================================
// Catalog
// ========================================

/// Track listing entry embedded in an album
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumTrack {
    #[serde(rename = "id_cancion")]
    pub song_id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "compositor")]
    pub composer: String,
    #[serde(rename = "género")]
    pub genre: String,
    #[serde(rename = "pista")]
    pub audio_path: String,
}

/// Album document (`Albumes` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    #[serde(rename = "nombre_album")]
    pub name: String,
    #[serde(rename = "artista")]
    pub artist: String,
    #[serde(rename = "año_publicación")]
    pub release_year: i32,
    #[serde(rename = "género")]
    pub genre: String,
    #[serde(rename = "foto_portada")]
    pub cover_image: String,
    #[serde(rename = "canciones", default, deserialize_with = "null_as_default")]
    pub tracks: Vec<AlbumTrack>,
    #[serde(rename = "id_album_original", default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<i64>,
}

/// Song document (`Canciones` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    #[serde(rename = "Nombre de la canción")]
    pub title: String,
    #[serde(rename = "Álbum")]
    pub album: String,
    #[serde(rename = "Género")]
    pub genre: String,
    #[serde(rename = "Año de publicación")]
    pub release_year: i32,
    #[serde(rename = "Artista")]
    pub artist: String,
    #[serde(rename = "Compositor")]
    pub composer: String,
    #[serde(rename = "Idioma")]
    pub language: String,
    #[serde(rename = "País de origen")]
    pub country: String,
    #[serde(rename = "pista")]
    pub audio_path: String,
    #[serde(rename = "foto")]
    pub cover_image: String,
    #[serde(rename = "id_cancion_original", default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<i64>,
}

// ========================================
// Playlists
// ========================================

/// Song reference stored inside a playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistSong {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "artista", default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(rename = "foto", default)]
    pub cover_image: String,
    #[serde(rename = "pista", default)]
    pub audio_path: String,
}

/// Playlist document (`Playlists` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    #[serde(rename = "usuario_id")]
    pub user_id: String,
    pub playlist_id: String,
    #[serde(rename = "nombre_playlist", default)]
    pub name: String,
    #[serde(rename = "canciones", default, deserialize_with = "null_as_default")]
    pub songs: Vec<PlaylistSong>,
    #[serde(rename = "es_liked_songs", default)]
    pub is_liked_songs: bool,
    #[serde(rename = "foto_portada", default)]
    pub cover_image: String,
    #[serde(rename = "fecha_creacion", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Playlist {
    /// New user playlist with a fresh id and the first song's cover
    pub fn new_custom(
        user_id: &str,
        name: &str,
        songs: Vec<PlaylistSong>,
        now: DateTime<Utc>,
    ) -> Self {
        let cover_image = crate::library::cover_for(&songs);
        Self {
            user_id: user_id.to_string(),
            playlist_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            songs,
            is_liked_songs: false,
            cover_image,
            created_at: Some(format_timestamp(now)),
        }
    }

    pub fn is_liked_songs_playlist(&self) -> bool {
        self.playlist_id == LIKED_SONGS_PLAYLIST_ID
    }
}

// ========================================
// Favorite albums
// ========================================

/// Album summary sent by clients when favoriting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteAlbumPayload {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "nombre_album", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "artista", default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(rename = "foto_portada", default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(rename = "año_publicación", default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
}

/// Favorite album document (`UserFavoriteAlbums` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteAlbumRecord {
    #[serde(rename = "usuario_id")]
    pub user_id: String,
    pub album_id: String,
    #[serde(rename = "nombre_album", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "artista", default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(rename = "foto_portada", default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(rename = "año_publicación", default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(rename = "fecha_agregado", default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<String>,
}

impl FavoriteAlbumRecord {
    pub fn from_payload(user_id: &str, payload: FavoriteAlbumPayload, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            album_id: payload.id,
            name: payload.name,
            artist: payload.artist,
            cover_image: payload.cover_image,
            release_year: payload.release_year,
            added_at: Some(format_timestamp(now)),
        }
    }
}

/// Favorite album as returned to clients: `album_id` is exposed as `id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteAlbum {
    pub id: String,
    #[serde(rename = "nombre_album")]
    pub name: Option<String>,
    #[serde(rename = "artista")]
    pub artist: Option<String>,
    #[serde(rename = "foto_portada")]
    pub cover_image: Option<String>,
    #[serde(rename = "año_publicación")]
    pub release_year: Option<i32>,
    #[serde(rename = "fecha_agregado")]
    pub added_at: Option<String>,
}

impl From<FavoriteAlbumRecord> for FavoriteAlbum {
    fn from(record: FavoriteAlbumRecord) -> Self {
        Self {
            id: record.album_id,
            name: record.name,
            artist: record.artist,
            cover_image: record.cover_image,
            release_year: record.release_year,
            added_at: record.added_at,
        }
    }
}
