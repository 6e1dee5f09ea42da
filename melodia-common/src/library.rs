//! Playlist rules
//!
//! Pure functions used by the playlist and liked-songs handlers. They compute
//! the new song list; the handlers write it back to the store.

use crate::models::{Playlist, PlaylistSong, DEFAULT_PLAYLIST_COVER};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Outcome of toggling a song in a list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeAction {
    Added,
    Removed,
}

impl LikeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LikeAction::Added => "added",
            LikeAction::Removed => "removed",
        }
    }
}

/// Order playlists for display: Liked Songs first, then by name
pub fn sort_playlists(playlists: &mut [Playlist]) {
    playlists.sort_by(|a, b| {
        match (a.is_liked_songs_playlist(), b.is_liked_songs_playlist()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Remove the song if present, otherwise append it
pub fn toggle_song(
    current: Vec<PlaylistSong>,
    song: PlaylistSong,
) -> (Vec<PlaylistSong>, LikeAction) {
    if current.iter().any(|s| s.id == song.id) {
        (remove_song(current, &song.id), LikeAction::Removed)
    } else {
        let mut songs = current;
        songs.push(song);
        (songs, LikeAction::Added)
    }
}

/// Drop every entry with the given song id
pub fn remove_song(current: Vec<PlaylistSong>, song_id: &str) -> Vec<PlaylistSong> {
    current.into_iter().filter(|s| s.id != song_id).collect()
}

/// Cover image of a playlist: the first song's picture, or the default
pub fn cover_for(songs: &[PlaylistSong]) -> String {
    songs
        .first()
        .map(|s| s.cover_image.as_str())
        .filter(|cover| !cover.is_empty())
        .unwrap_or(DEFAULT_PLAYLIST_COVER)
        .to_string()
}

pub fn liked_song_ids(songs: &[PlaylistSong]) -> Vec<String> {
    songs.iter().map(|s| s.id.clone()).collect()
}
