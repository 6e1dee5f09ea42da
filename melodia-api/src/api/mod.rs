//! HTTP API handlers for melodia-api

pub mod albums;
pub mod favorite_albums;
pub mod health;
pub mod liked_songs;
pub mod me;
pub mod playlists;
pub mod songs;

pub use albums::{list_albums, seed_albums};
pub use favorite_albums::{list_favorite_albums, manage_favorite_album};
pub use health::health_routes;
pub use liked_songs::{list_liked_song_ids, toggle_liked_song};
pub use me::whoami;
pub use playlists::{create_playlist, list_playlists, manage_playlist};
pub use songs::{list_songs, seed_songs};
