//! # Melodia Common Library
//!
//! Shared code for the Melodia services:
//! - Document store client and table definitions
//! - Domain models (albums, songs, playlists, favorites)
//! - Playlist rules (liked songs toggling, ordering, covers)
//! - Session token issuing and verification
//! - Configuration loading and database bootstrap

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod library;
pub mod models;
pub mod session;
pub mod store;

pub use error::{Error, Result};
pub use store::{DocumentStore, Item, Key, TableSchema, UpdateExpression};
