use serde::Deserialize;

use crate::models::SongData;

/// The `napster` section of an audd.io result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NapsterTrack {
    pub name: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    pub playback_seconds: Option<u64>,
    pub is_explicit: Option<bool>,
    pub disc: Option<u32>,
    /// Track position within the disc.
    pub index: Option<u32>,
    #[serde(rename = "previewURL")]
    pub preview_url: Option<String>,
    pub isrc: Option<String>,
}

impl NapsterTrack {
    pub fn to_song(&self) -> SongData {
        SongData {
            artists: self.artist_name.clone().into_iter().collect(),
            title: self.name.clone(),
            album: self.album_name.clone(),
            duration_ms: self.playback_seconds.map(|s| s * 1000),
            explicit: self.is_explicit,
            disk_number: self.disc,
            track_number: self.index,
            preview_url: self.preview_url.clone(),
            isrc: self.isrc.clone(),
            ..Default::default()
        }
    }
}
