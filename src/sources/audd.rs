use std::path::Path;

use anyhow::{Context, Result};
use reqwest::blocking::multipart;
use serde::Deserialize;
use serde_json::Value;

use crate::models::{ReleaseDate, SongData};
use crate::sources::apple_music::AppleMusicTrack;
use crate::sources::deezer::DeezerTrack;
use crate::sources::napster::NapsterTrack;
use crate::sources::spotify::SpotifyTrack;
use crate::sources::Source;

const API_URL: &str = "https://api.audd.io/";

/// Blocking client for the audd.io recognition API.
pub struct AuddClient {
    client: reqwest::blocking::Client,
    api_token: Option<String>,
    market: Option<String>,
}

/// One reply from the API: the parsed envelope plus the untouched JSON for
/// --output-json.
pub struct Reply {
    pub parsed: ApiResponse,
    pub raw: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    #[serde(default)]
    pub result: Option<RecognitionResult>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error_code: i64,
    pub error_message: String,
}

/// The `result` object of a successful lookup: the core audd.io fields plus
/// whichever extra source sections were requested.
#[derive(Debug, Clone, Deserialize)]
pub struct RecognitionResult {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub release_date: Option<String>,
    pub timecode: Option<String>,
    pub song_link: Option<String>,
    #[serde(default)]
    pub apple_music: Option<AppleMusicTrack>,
    #[serde(default)]
    pub spotify: Option<SpotifyTrack>,
    #[serde(default)]
    pub napster: Option<NapsterTrack>,
    #[serde(default)]
    pub deezer: Option<DeezerTrack>,
    #[serde(default)]
    pub lyrics: Option<LyricsResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LyricsResult {
    pub lyrics: Option<String>,
}

impl RecognitionResult {
    /// The always-present audd.io core fields as a song record.
    pub fn base_song(&self) -> SongData {
        SongData {
            artists: self.artist.clone().into_iter().collect(),
            title: self.title.clone(),
            album: self.album.clone(),
            release: self.release_date.as_deref().and_then(ReleaseDate::parse),
            timecode: self.timecode.clone(),
            link: self.song_link.clone(),
            ..Default::default()
        }
    }

    /// Merge the selected source sections over the base record, in order:
    /// the first source supplying a field wins, audd.io's own data fills
    /// whatever is left.
    pub fn merge(&self, sources: &[Source]) -> SongData {
        let mut song = SongData::default();

        for source in sources {
            match source {
                Source::AppleMusic => {
                    if let Some(ref track) = self.apple_music {
                        song.absorb(track.to_song());
                    }
                }
                Source::Spotify => {
                    if let Some(ref track) = self.spotify {
                        song.absorb(track.to_song());
                    }
                }
                Source::Napster => {
                    if let Some(ref track) = self.napster {
                        song.absorb(track.to_song());
                    }
                }
                Source::Deezer => {
                    if let Some(ref track) = self.deezer {
                        song.absorb(track.to_song());
                    }
                }
                Source::Lyrics => {
                    if let Some(ref lyrics) = self.lyrics {
                        song.absorb(SongData {
                            lyrics: lyrics.lyrics.clone(),
                            ..Default::default()
                        });
                    }
                }
            }
        }

        song.absorb(self.base_song());
        song
    }
}

impl AuddClient {
    pub fn new(api_token: Option<String>, market: Option<String>) -> Result<AuddClient> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .context("could not build the HTTP client")?;

        Ok(AuddClient {
            client,
            api_token,
            market,
        })
    }

    fn common_fields(&self, sources: &[Source]) -> Vec<(&'static str, String)> {
        let return_param = sources
            .iter()
            .map(|s| s.api_name())
            .collect::<Vec<_>>()
            .join(",");

        let mut fields = vec![("return", return_param)];
        if let Some(ref token) = self.api_token {
            fields.push(("api_token", token.clone()));
        }
        if let Some(ref market) = self.market {
            fields.push(("market", market.clone()));
        }
        fields
    }

    /// Look up a song by URL; audd.io fetches the audio itself.
    pub fn recognize_url(&self, url: &str, sources: &[Source]) -> Result<Reply> {
        let mut fields = self.common_fields(sources);
        fields.push(("url", url.to_string()));

        let response = self
            .client
            .post(API_URL)
            .form(&fields)
            .send()
            .context("could not connect to audd.io")?
            .error_for_status()
            .context("audd.io rejected the request")?;

        Self::parse_reply(response)
    }

    /// Upload an audio file for recognition.
    pub fn recognize_file(&self, path: &Path, sources: &[Source]) -> Result<Reply> {
        let mut form = multipart::Form::new();
        for (name, value) in self.common_fields(sources) {
            form = form.text(name, value);
        }
        let form = form
            .file("file", path)
            .with_context(|| format!("could not read {}", path.display()))?;

        let response = self
            .client
            .post(API_URL)
            .multipart(form)
            .send()
            .context("could not connect to audd.io")?
            .error_for_status()
            .context("audd.io rejected the request")?;

        Self::parse_reply(response)
    }

    fn parse_reply(response: reqwest::blocking::Response) -> Result<Reply> {
        let raw: Value = response
            .json()
            .context("could not parse the audd.io response")?;
        let parsed: ApiResponse = serde_json::from_value(raw.clone())
            .context("unexpected audd.io response shape")?;
        Ok(Reply { parsed, raw })
    }

    /// Download a file (art, preview) and return its bytes together with an
    /// extension derived from the Content-Type header.
    pub fn download(&self, url: &str) -> Result<(Vec<u8>, String)> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("could not download {}", url))?
            .error_for_status()
            .with_context(|| format!("download of {} failed", url))?;

        let extension = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(extension_for)
            .unwrap_or_else(|| "bin".to_string());

        let bytes = response.bytes()?.to_vec();
        Ok((bytes, extension))
    }
}

/// "image/jpeg" -> "jpeg", "audio/x-m4a" -> "m4a". Parameters after a
/// semicolon are ignored.
fn extension_for(content_type: &str) -> String {
    let subtype = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .rsplit('/')
        .next()
        .unwrap_or(content_type);
    subtype.rsplit('-').next().unwrap_or(subtype).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_content_types() {
        assert_eq!(extension_for("image/jpeg"), "jpeg");
        assert_eq!(extension_for("audio/x-m4a"), "m4a");
        assert_eq!(extension_for("image/png; charset=binary"), "png");
    }

    #[test]
    fn test_parse_error_envelope() {
        let json = r#"{
            "status": "error",
            "error": {"error_code": 901, "error_message": "Recognition failed"}
        }"#;
        let parsed: ApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.status, "error");
        assert_eq!(parsed.error.unwrap().error_code, 901);
        assert!(parsed.result.is_none());
    }

    #[test]
    fn test_parse_no_match_envelope() {
        let json = r#"{"status": "success", "result": null}"#;
        let parsed: ApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.status, "success");
        assert!(parsed.result.is_none());
    }

    #[test]
    fn test_merge_priority_over_base() {
        let json = r#"{
            "status": "success",
            "result": {
                "title": "One More Time",
                "artist": "Daft Punk",
                "album": "Discovery",
                "release_date": "2001-03-12",
                "timecode": "00:42",
                "song_link": "https://lis.tn/OneMoreTime",
                "deezer": {
                    "title": "One More Time (Club Mix)",
                    "title_short": "One More Time",
                    "album": {"title": "Discovery (Deluxe)"}
                }
            }
        }"#;
        let parsed: ApiResponse = serde_json::from_str(json).unwrap();
        let result = parsed.result.unwrap();

        let song = result.merge(&[Source::Deezer]);
        // Deezer was asked for first, so its album title wins...
        assert_eq!(song.album.as_deref(), Some("Discovery (Deluxe)"));
        assert_eq!(song.short_title.as_deref(), Some("One More Time"));
        // ...and audd.io fills what Deezer didn't supply.
        assert_eq!(song.artists, vec!["Daft Punk".to_string()]);
        assert_eq!(song.link.as_deref(), Some("https://lis.tn/OneMoreTime"));

        // Without the source selected, its section is ignored entirely.
        let song = result.merge(&[]);
        assert_eq!(song.album.as_deref(), Some("Discovery"));
        assert!(song.short_title.is_none());
    }
}
