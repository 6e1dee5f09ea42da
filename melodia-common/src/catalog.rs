//! Seed catalog
//!
//! Albums and songs loaded into an empty store by the seeding endpoints.
//! The source records carry numeric ids; stored documents use the id as a
//! string key and keep the number as `id_*_original`.

use crate::models::{Album, AlbumTrack, Song};
use crate::Result;
use serde::Deserialize;

const SEED_ALBUMS: &str = include_str!("../seed/albums.json");
const SEED_SONGS: &str = include_str!("../seed/songs.json");

#[derive(Debug, Deserialize)]
struct SeedAlbum {
    id_album: i64,
    nombre_album: String,
    artista: String,
    #[serde(rename = "año_publicación")]
    release_year: i32,
    #[serde(rename = "género")]
    genre: String,
    foto_portada: String,
    #[serde(default)]
    canciones: Vec<AlbumTrack>,
}

#[derive(Debug, Deserialize)]
struct SeedSong {
    id_cancion: i64,
    #[serde(rename = "Nombre de la canción")]
    title: String,
    #[serde(rename = "Álbum")]
    album: String,
    #[serde(rename = "Género")]
    genre: String,
    #[serde(rename = "Año de publicación")]
    release_year: i32,
    #[serde(rename = "Artista")]
    artist: String,
    #[serde(rename = "Compositor")]
    composer: String,
    #[serde(rename = "Idioma")]
    language: String,
    #[serde(rename = "País de origen")]
    country: String,
    pista: String,
    foto: String,
}

impl From<SeedAlbum> for Album {
    fn from(seed: SeedAlbum) -> Self {
        Album {
            id: seed.id_album.to_string(),
            name: seed.nombre_album,
            artist: seed.artista,
            release_year: seed.release_year,
            genre: seed.genre,
            cover_image: seed.foto_portada,
            tracks: seed.canciones,
            original_id: Some(seed.id_album),
        }
    }
}

impl From<SeedSong> for Song {
    fn from(seed: SeedSong) -> Self {
        Song {
            id: seed.id_cancion.to_string(),
            title: seed.title,
            album: seed.album,
            genre: seed.genre,
            release_year: seed.release_year,
            artist: seed.artist,
            composer: seed.composer,
            language: seed.language,
            country: seed.country,
            audio_path: seed.pista,
            cover_image: seed.foto,
            original_id: Some(seed.id_cancion),
        }
    }
}

/// Albums to seed
pub fn seed_albums() -> Result<Vec<Album>> {
    let seeds: Vec<SeedAlbum> = serde_json::from_str(SEED_ALBUMS)?;
    Ok(seeds.into_iter().map(Album::from).collect())
}

/// Songs to seed
pub fn seed_songs() -> Result<Vec<Song>> {
    let seeds: Vec<SeedSong> = serde_json::from_str(SEED_SONGS)?;
    Ok(seeds.into_iter().map(Song::from).collect())
}
