use serde::Deserialize;

use crate::models::{ReleaseDate, SongData};

/// The `apple_music` section of an audd.io result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppleMusicTrack {
    pub name: Option<String>,
    pub artist_name: Option<String>,
    pub composer_name: Option<String>,
    pub release_date: Option<String>,
    pub duration_in_millis: Option<u64>,
    #[serde(default)]
    pub genre_names: Vec<String>,
    pub album_name: Option<String>,
    pub disc_number: Option<u32>,
    pub track_number: Option<u32>,
    pub url: Option<String>,
    pub artwork: Option<Artwork>,
    #[serde(default)]
    pub previews: Vec<Preview>,
    pub isrc: Option<String>,
}

/// Apple returns the artwork URL as a template with `{w}`/`{h}` size
/// placeholders plus the native dimensions to fill them with.
#[derive(Debug, Clone, Deserialize)]
pub struct Artwork {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Preview {
    pub url: Option<String>,
}

impl Artwork {
    fn resolved_url(&self) -> Option<String> {
        let url = self.url.as_ref()?;
        Some(
            url.replace("{w}", &self.width.unwrap_or(1000).to_string())
                .replace("{h}", &self.height.unwrap_or(1000).to_string()),
        )
    }
}

impl AppleMusicTrack {
    pub fn to_song(&self) -> SongData {
        SongData {
            artists: self.artist_name.clone().into_iter().collect(),
            title: self.name.clone(),
            composer: self.composer_name.clone(),
            release: self.release_date.as_deref().and_then(ReleaseDate::parse),
            duration_ms: self.duration_in_millis,
            genres: self.genre_names.clone(),
            album: self.album_name.clone(),
            disk_number: self.disc_number,
            track_number: self.track_number,
            link: self.url.clone(),
            art_url: self.artwork.as_ref().and_then(Artwork::resolved_url),
            preview_url: self.previews.first().and_then(|p| p.url.clone()),
            isrc: self.isrc.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artwork_size_placeholders_filled() {
        let art = Artwork {
            width: Some(3000),
            height: Some(3000),
            url: Some("https://example.com/{w}x{h}bb.jpg".to_string()),
        };
        assert_eq!(
            art.resolved_url(),
            Some("https://example.com/3000x3000bb.jpg".to_string())
        );
    }

    #[test]
    fn test_to_song_maps_fields() {
        let json = r#"{
            "name": "One More Time",
            "artistName": "Daft Punk",
            "composerName": "Thomas Bangalter",
            "releaseDate": "2000-11-30",
            "durationInMillis": 320357,
            "genreNames": ["House", "Dance"],
            "albumName": "Discovery",
            "discNumber": 1,
            "trackNumber": 1,
            "isrc": "GBDUW0000053",
            "previews": [{"url": "https://example.com/preview.m4a"}]
        }"#;
        let track: AppleMusicTrack = serde_json::from_str(json).unwrap();
        let song = track.to_song();

        assert_eq!(song.artists, vec!["Daft Punk".to_string()]);
        assert_eq!(song.title.as_deref(), Some("One More Time"));
        assert_eq!(song.genres.len(), 2);
        assert_eq!(song.release.unwrap().year, Some(2000));
        assert_eq!(song.track_number, Some(1));
        assert_eq!(
            song.preview_url.as_deref(),
            Some("https://example.com/preview.m4a")
        );
    }
}
