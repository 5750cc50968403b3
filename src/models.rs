/// Release date of a recognition result. Sources report anything from a
/// bare year to a full date, so every part is independently optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseDate {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl ReleaseDate {
    /// Parse a `"YYYY"`, `"YYYY-MM"` or `"YYYY-MM-DD"` string.
    /// Returns None when no part of the string is usable.
    pub fn parse(s: &str) -> Option<ReleaseDate> {
        let mut parts = s.trim().splitn(3, '-');
        let date = ReleaseDate {
            year: parts.next().and_then(|p| p.parse().ok()),
            month: parts.next().and_then(|p| p.parse().ok()),
            day: parts.next().and_then(|p| p.parse().ok()),
        };
        if date.year.is_none() && date.month.is_none() && date.day.is_none() {
            return None;
        }
        Some(date)
    }
}

/// The merged result of a song lookup. Any field may be missing because no
/// source supplied it; consumers substitute an empty string instead of
/// failing.
#[derive(Debug, Clone, Default)]
pub struct SongData {
    pub artists: Vec<String>,
    pub title: Option<String>,
    pub short_title: Option<String>,
    pub album: Option<String>,
    pub composer: Option<String>,
    pub genres: Vec<String>,
    pub explicit: Option<bool>,
    pub isrc: Option<String>,
    pub disk_number: Option<u32>,
    pub track_number: Option<u32>,
    pub release: Option<ReleaseDate>,
    pub duration_ms: Option<u64>,
    pub timecode: Option<String>,
    pub link: Option<String>,
    pub art_url: Option<String>,
    pub artist_art_url: Option<String>,
    pub preview_url: Option<String>,
    pub lyrics: Option<String>,
}

impl SongData {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Unknown")
    }

    pub fn display_artist(&self) -> String {
        if self.artists.is_empty() {
            "Unknown".to_string()
        } else {
            self.artists.join(", ")
        }
    }

    pub fn summary(&self) -> String {
        format!("{} - {}", self.display_artist(), self.display_title())
    }

    /// Short title: the source-supplied one when available, otherwise the
    /// title with a trailing parenthetical or feat./ft. suffix stripped.
    pub fn short_title(&self) -> Option<String> {
        if let Some(ref short) = self.short_title {
            return Some(short.clone());
        }
        self.title.as_deref().map(strip_title_suffix)
    }

    /// Fill in every field this record is missing from `other`. Fields that
    /// already have a value keep it, so applying sources in priority order
    /// makes the first source win.
    pub fn absorb(&mut self, other: SongData) {
        if self.artists.is_empty() {
            self.artists = other.artists;
        }
        if self.genres.is_empty() {
            self.genres = other.genres;
        }
        self.title = self.title.take().or(other.title);
        self.short_title = self.short_title.take().or(other.short_title);
        self.album = self.album.take().or(other.album);
        self.composer = self.composer.take().or(other.composer);
        self.explicit = self.explicit.or(other.explicit);
        self.isrc = self.isrc.take().or(other.isrc);
        self.disk_number = self.disk_number.or(other.disk_number);
        self.track_number = self.track_number.or(other.track_number);
        self.release = self.release.or(other.release);
        self.duration_ms = self.duration_ms.or(other.duration_ms);
        self.timecode = self.timecode.take().or(other.timecode);
        self.link = self.link.take().or(other.link);
        self.art_url = self.art_url.take().or(other.art_url);
        self.artist_art_url = self.artist_art_url.take().or(other.artist_art_url);
        self.preview_url = self.preview_url.take().or(other.preview_url);
        self.lyrics = self.lyrics.take().or(other.lyrics);
    }
}

/// Drop a trailing parenthetical ("Song (Remastered)") or a feat./ft.
/// suffix ("Song feat. X") from a title.
fn strip_title_suffix(title: &str) -> String {
    let mut short = title.trim();

    if short.ends_with(')') {
        if let Some(open) = short.rfind('(') {
            let head = short[..open].trim_end();
            if !head.is_empty() {
                short = head;
            }
        }
    }

    for marker in [" feat. ", " feat ", " ft. ", " ft "] {
        if let Some(pos) = find_ascii_ignore_case(short, marker) {
            let head = short[..pos].trim_end();
            if !head.is_empty() {
                short = head;
                break;
            }
        }
    }

    short.to_string()
}

/// Case-insensitive ASCII substring search. The needle must be ASCII so the
/// returned index is always a char boundary of the haystack.
fn find_ascii_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_date_full() {
        let date = ReleaseDate::parse("1997-03-09").unwrap();
        assert_eq!(date.year, Some(1997));
        assert_eq!(date.month, Some(3));
        assert_eq!(date.day, Some(9));
    }

    #[test]
    fn test_release_date_year_only() {
        let date = ReleaseDate::parse("2001").unwrap();
        assert_eq!(date.year, Some(2001));
        assert_eq!(date.month, None);
        assert_eq!(date.day, None);
    }

    #[test]
    fn test_release_date_garbage() {
        assert_eq!(ReleaseDate::parse("unknown"), None);
        assert_eq!(ReleaseDate::parse(""), None);
    }

    #[test]
    fn test_short_title_prefers_source_value() {
        let song = SongData {
            title: Some("Song (Radio Edit)".to_string()),
            short_title: Some("Song".to_string()),
            ..Default::default()
        };
        assert_eq!(song.short_title(), Some("Song".to_string()));
    }

    #[test]
    fn test_short_title_strips_parenthetical() {
        let song = SongData {
            title: Some("One More Time (Live at Fuji Rock)".to_string()),
            ..Default::default()
        };
        assert_eq!(song.short_title(), Some("One More Time".to_string()));
    }

    #[test]
    fn test_short_title_strips_feat() {
        let song = SongData {
            title: Some("Get Lucky feat. Pharrell Williams".to_string()),
            ..Default::default()
        };
        assert_eq!(song.short_title(), Some("Get Lucky".to_string()));

        let song = SongData {
            title: Some("Get Lucky Ft. Pharrell Williams".to_string()),
            ..Default::default()
        };
        assert_eq!(song.short_title(), Some("Get Lucky".to_string()));
    }

    #[test]
    fn test_short_title_plain_title_unchanged() {
        let song = SongData {
            title: Some("Around the World".to_string()),
            ..Default::default()
        };
        assert_eq!(song.short_title(), Some("Around the World".to_string()));
    }

    #[test]
    fn test_short_title_all_parenthetical_kept() {
        // Nothing left in front of the parenthetical, keep the title whole.
        let song = SongData {
            title: Some("(Untitled)".to_string()),
            ..Default::default()
        };
        assert_eq!(song.short_title(), Some("(Untitled)".to_string()));
    }

    #[test]
    fn test_absorb_first_value_wins() {
        let mut song = SongData {
            title: Some("From Spotify".to_string()),
            ..Default::default()
        };
        song.absorb(SongData {
            title: Some("From Deezer".to_string()),
            album: Some("Discovery".to_string()),
            ..Default::default()
        });
        assert_eq!(song.title.as_deref(), Some("From Spotify"));
        assert_eq!(song.album.as_deref(), Some("Discovery"));
    }

    #[test]
    fn test_absorb_keeps_existing_artists() {
        let mut song = SongData {
            artists: vec!["Daft Punk".to_string(), "Pharrell Williams".to_string()],
            ..Default::default()
        };
        song.absorb(SongData {
            artists: vec!["Daft Punk".to_string()],
            ..Default::default()
        });
        assert_eq!(song.artists.len(), 2);
    }
}
