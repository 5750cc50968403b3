use serde::Deserialize;

use crate::models::{ReleaseDate, SongData};

/// The `spotify` section of an audd.io result.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTrack {
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    pub album: Option<SpotifyAlbum>,
    pub duration_ms: Option<u64>,
    pub explicit: Option<bool>,
    pub disc_number: Option<u32>,
    pub track_number: Option<u32>,
    pub external_ids: Option<ExternalIds>,
    pub external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyAlbum {
    pub name: Option<String>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExternalIds {
    pub isrc: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

impl SpotifyTrack {
    pub fn to_song(&self) -> SongData {
        let album = self.album.as_ref();

        // The largest album image is listed first, but don't rely on it.
        let art_url = album.and_then(|a| {
            a.images
                .iter()
                .max_by_key(|img| img.width.unwrap_or(0))
                .map(|img| img.url.clone())
        });

        SongData {
            artists: self.artists.iter().map(|a| a.name.clone()).collect(),
            title: self.name.clone(),
            album: album.and_then(|a| a.name.clone()),
            release: album
                .and_then(|a| a.release_date.as_deref())
                .and_then(ReleaseDate::parse),
            duration_ms: self.duration_ms,
            explicit: self.explicit,
            disk_number: self.disc_number,
            track_number: self.track_number,
            isrc: self.external_ids.as_ref().and_then(|ids| ids.isrc.clone()),
            link: self
                .external_urls
                .as_ref()
                .and_then(|urls| urls.spotify.clone()),
            art_url,
            ..Default::default()
        }
    }
}
