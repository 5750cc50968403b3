use serde::Deserialize;

use crate::models::SongData;

/// The `deezer` section of an audd.io result. The only source that ships a
/// ready-made short title.
#[derive(Debug, Clone, Deserialize)]
pub struct DeezerTrack {
    pub title: Option<String>,
    pub title_short: Option<String>,
    pub artist: Option<DeezerArtist>,
    pub album: Option<DeezerAlbum>,
    /// Seconds, unlike everyone else.
    pub duration: Option<u64>,
    pub explicit_lyrics: Option<bool>,
    pub preview: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeezerArtist {
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeezerAlbum {
    pub title: Option<String>,
    pub cover: Option<String>,
}

impl DeezerTrack {
    pub fn to_song(&self) -> SongData {
        let artist = self.artist.as_ref();
        let album = self.album.as_ref();

        SongData {
            artists: artist.and_then(|a| a.name.clone()).into_iter().collect(),
            title: self.title.clone(),
            short_title: self.title_short.clone(),
            album: album.and_then(|a| a.title.clone()),
            duration_ms: self.duration.map(|s| s * 1000),
            explicit: self.explicit_lyrics,
            preview_url: self.preview.clone(),
            art_url: album.and_then(|a| a.cover.clone()),
            artist_art_url: artist.and_then(|a| a.picture.clone()),
            ..Default::default()
        }
    }
}
