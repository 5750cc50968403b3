use crate::models::{ReleaseDate, SongData};

/// A parsed piece of a filename pattern: either a run of plain text or a
/// two-character `%` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Token(Token),
}

/// The placeholders accepted in filename patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// `%f` - original filename without its extension
    Filename,
    /// `%a` - artist(s)
    Artist,
    /// `%c` - composer
    Composer,
    /// `%b` - album
    Album,
    /// `%g` - genre(s)
    Genre,
    /// `%T` - title
    Title,
    /// `%t` - short title
    ShortTitle,
    /// `%x` - explicit marker
    Explicit,
    /// `%i` - ISRC
    Isrc,
    /// `%k` - disk number
    DiskNumber,
    /// `%#` - track number
    TrackNumber,
    /// `%Y` - four-digit release year
    YearLong,
    /// `%y` - two-digit release year
    YearShort,
    /// `%M` - zero-padded release month
    MonthPadded,
    /// `%m` - release month
    Month,
    /// `%D` - zero-padded release day
    DayPadded,
    /// `%d` - release day
    Day,
}

impl Token {
    fn from_char(c: char) -> Option<Token> {
        let token = match c {
            'f' => Token::Filename,
            'a' => Token::Artist,
            'c' => Token::Composer,
            'b' => Token::Album,
            'g' => Token::Genre,
            'T' => Token::Title,
            't' => Token::ShortTitle,
            'x' => Token::Explicit,
            'i' => Token::Isrc,
            'k' => Token::DiskNumber,
            '#' => Token::TrackNumber,
            'Y' => Token::YearLong,
            'y' => Token::YearShort,
            'M' => Token::MonthPadded,
            'm' => Token::Month,
            'D' => Token::DayPadded,
            'd' => Token::Day,
            _ => return None,
        };
        Some(token)
    }
}

/// Split a pattern string into literal runs and tokens.
///
/// `%%` becomes a literal percent sign. A `%` followed by an unrecognized
/// character, or a lone `%` at the end of the pattern, stays in the output
/// as literal text, so a typo never aborts a run.
pub fn tokenize(pattern: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('%') => {
                chars.next();
                literal.push('%');
            }
            Some(next) => match Token::from_char(next) {
                Some(token) => {
                    chars.next();
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Token(token));
                }
                // Unknown marker: keep the percent, the next character is
                // picked up by the outer loop as ordinary text.
                None => literal.push('%'),
            },
            None => literal.push('%'),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    segments
}

/// Characters that are replaced when a resolved pattern becomes a filename.
/// The set differs between filesystem families, so callers pick (or build)
/// the rules for their target.
#[derive(Debug, Clone, Copy)]
pub struct SanitizeRules {
    illegal: &'static [char],
    replacement: char,
    replace_control: bool,
}

impl SanitizeRules {
    const UNIVERSAL: &'static [char] = &['/', '\0'];
    const MACOS: &'static [char] = &['/', '\0', ':'];
    const WINDOWS: &'static [char] =
        &['/', '\0', '\\', ':', '*', '?', '"', '<', '>', '|'];

    /// Only the separators no filesystem accepts: `/` and NUL.
    pub fn universal() -> SanitizeRules {
        SanitizeRules {
            illegal: Self::UNIVERSAL,
            replacement: '_',
            replace_control: false,
        }
    }

    pub fn macos() -> SanitizeRules {
        SanitizeRules {
            illegal: Self::MACOS,
            replacement: '_',
            replace_control: false,
        }
    }

    /// The NTFS/FAT set, control characters included. Names passing these
    /// rules are safe on every common filesystem.
    pub fn windows() -> SanitizeRules {
        SanitizeRules {
            illegal: Self::WINDOWS,
            replacement: '_',
            replace_control: true,
        }
    }

    /// Rules for the platform this binary was built for.
    pub fn host() -> SanitizeRules {
        if cfg!(target_os = "windows") {
            SanitizeRules::windows()
        } else if cfg!(target_os = "macos") {
            SanitizeRules::macos()
        } else {
            SanitizeRules::universal()
        }
    }

    /// Replace every illegal character in `s`. The result never contains a
    /// path separator and running it through sanitize again is a no-op.
    pub fn sanitize(&self, s: &str) -> String {
        s.chars()
            .map(|c| {
                if self.illegal.contains(&c) || (self.replace_control && c.is_ascii_control()) {
                    self.replacement
                } else {
                    c
                }
            })
            .collect()
    }
}

/// Resolve a parsed pattern against song data and sanitize the result into
/// a single path segment, without an extension.
///
/// `file_stem` is the input file's base name without its extension; it
/// backs the `%f` token and is the fallback when the pattern resolves to
/// nothing at all.
pub fn render(
    segments: &[Segment],
    song: &SongData,
    file_stem: &str,
    rules: &SanitizeRules,
) -> String {
    let mut assembled = String::new();
    for segment in segments {
        match segment {
            Segment::Literal(text) => assembled.push_str(text),
            Segment::Token(token) => assembled.push_str(&resolve(*token, song, file_stem)),
        }
    }

    let sanitized = rules.sanitize(&assembled);
    if sanitized.is_empty() {
        return rules.sanitize(file_stem);
    }
    sanitized
}

/// One-shot convenience: tokenize then render.
pub fn render_pattern(
    pattern: &str,
    song: &SongData,
    file_stem: &str,
    rules: &SanitizeRules,
) -> String {
    render(&tokenize(pattern), song, file_stem, rules)
}

/// Expand a single token. Absent fields become the empty string so that a
/// partial lookup still produces a usable name.
fn resolve(token: Token, song: &SongData, file_stem: &str) -> String {
    match token {
        Token::Filename => file_stem.to_string(),
        Token::Artist => song.artists.join(", "),
        Token::Composer => song.composer.clone().unwrap_or_default(),
        Token::Album => song.album.clone().unwrap_or_default(),
        Token::Genre => song.genres.join(", "),
        Token::Title => song.title.clone().unwrap_or_default(),
        Token::ShortTitle => song.short_title().unwrap_or_default(),
        Token::Explicit => {
            if song.explicit == Some(true) {
                "Explicit".to_string()
            } else {
                String::new()
            }
        }
        Token::Isrc => song.isrc.clone().unwrap_or_default(),
        Token::DiskNumber => number(song.disk_number),
        Token::TrackNumber => number(song.track_number),
        Token::YearLong => date_part(song.release, |d| d.year.map(|y| y.to_string())),
        Token::YearShort => date_part(song.release, |d| {
            d.year.map(|y| format!("{:02}", y.rem_euclid(100)))
        }),
        Token::MonthPadded => date_part(song.release, |d| d.month.map(|m| format!("{:02}", m))),
        Token::Month => date_part(song.release, |d| d.month.map(|m| m.to_string())),
        Token::DayPadded => date_part(song.release, |d| d.day.map(|x| format!("{:02}", x))),
        Token::Day => date_part(song.release, |d| d.day.map(|x| x.to_string())),
    }
}

fn number(n: Option<u32>) -> String {
    n.map(|n| n.to_string()).unwrap_or_default()
}

fn date_part<F>(release: Option<ReleaseDate>, f: F) -> String
where
    F: FnOnce(&ReleaseDate) -> Option<String>,
{
    release.as_ref().and_then(f).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song() -> SongData {
        SongData {
            artists: vec!["Daft Punk".to_string()],
            title: Some("One More Time".to_string()),
            album: Some("Discovery".to_string()),
            composer: Some("Thomas Bangalter".to_string()),
            genres: vec!["House".to_string(), "Electronic".to_string()],
            explicit: Some(false),
            isrc: Some("GBDUW0000059".to_string()),
            disk_number: Some(1),
            track_number: Some(7),
            release: Some(ReleaseDate {
                year: Some(1997),
                month: Some(3),
                day: Some(9),
            }),
            ..Default::default()
        }
    }

    fn rules() -> SanitizeRules {
        SanitizeRules::windows()
    }

    #[test]
    fn test_literal_pattern_passes_through() {
        assert_eq!(
            render_pattern("plain name", &song(), "orig", &rules()),
            "plain name"
        );
        assert_eq!(
            render_pattern("plain name", &SongData::default(), "orig", &rules()),
            "plain name"
        );
    }

    #[test]
    fn test_double_percent_is_literal() {
        assert_eq!(render_pattern("%%", &song(), "orig", &rules()), "%");
        assert_eq!(
            render_pattern("100%% %T", &song(), "orig", &rules()),
            "100% One More Time"
        );
        assert_eq!(render_pattern("%%a", &song(), "orig", &rules()), "%a");
    }

    #[test]
    fn test_artist_title_pattern() {
        assert_eq!(
            render_pattern("%a - %T", &song(), "orig", &rules()),
            "Daft Punk - One More Time"
        );
    }

    #[test]
    fn test_absent_artist_resolves_empty() {
        let song = SongData {
            title: Some("Alone".to_string()),
            ..Default::default()
        };
        assert_eq!(render_pattern("%a - %T", &song, "orig", &rules()), " - Alone");
    }

    #[test]
    fn test_no_placeholder_artifacts_for_absent_fields() {
        let resolved = render_pattern("%a%c%b%g%T%t%x%i%k%# end", &SongData::default(), "", &rules());
        assert_eq!(resolved, " end");
        assert!(!resolved.contains('%'));
    }

    #[test]
    fn test_date_tokens_padded_and_plain() {
        assert_eq!(
            render_pattern("%Y-%M-%D %T", &song(), "orig", &rules()),
            "1997-03-09 One More Time"
        );
        assert_eq!(render_pattern("%y %m %d", &song(), "orig", &rules()), "97 3 9");
    }

    #[test]
    fn test_absent_date_resolves_empty() {
        let song = SongData {
            title: Some("Track".to_string()),
            ..Default::default()
        };
        assert_eq!(render_pattern("%Y%y%M%m%D%d%T", &song, "orig", &rules()), "Track");
    }

    #[test]
    fn test_partial_date_resolves_known_parts_only() {
        let song = SongData {
            release: Some(ReleaseDate {
                year: Some(2001),
                month: None,
                day: None,
            }),
            ..Default::default()
        };
        assert_eq!(render_pattern("%Y-%M-%D", &song, "orig", &rules()), "2001--");
    }

    #[test]
    fn test_track_number_unpadded() {
        assert_eq!(render_pattern("track%#", &song(), "orig", &rules()), "track7");
        assert_eq!(render_pattern("disk %k", &song(), "orig", &rules()), "disk 1");
    }

    #[test]
    fn test_multi_value_fields_joined_in_order() {
        assert_eq!(
            render_pattern("%g", &song(), "orig", &rules()),
            "House, Electronic"
        );

        let song = SongData {
            artists: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            ..Default::default()
        };
        assert_eq!(render_pattern("%a", &song, "orig", &rules()), "A, B, C");
    }

    #[test]
    fn test_explicit_marker() {
        let explicit = SongData {
            explicit: Some(true),
            ..Default::default()
        };
        assert_eq!(render_pattern("%T%x", &explicit, "orig", &rules()), "Explicit");
        // false and absent both render as nothing
        assert_eq!(render_pattern("a%xb", &song(), "orig", &rules()), "ab");
        assert_eq!(
            render_pattern("a%xb", &SongData::default(), "orig", &rules()),
            "ab"
        );
    }

    #[test]
    fn test_filename_token() {
        assert_eq!(
            render_pattern("%f (restored)", &song(), "01 - unknown", &rules()),
            "01 - unknown (restored)"
        );
    }

    #[test]
    fn test_unknown_token_kept_as_literal() {
        assert_eq!(render_pattern("%z%T", &song(), "orig", &rules()), "%zOne More Time");
        assert_eq!(render_pattern("50%", &song(), "orig", &rules()), "50%");
    }

    #[test]
    fn test_adjacent_tokens_have_fixed_width() {
        assert_eq!(
            render_pattern("%T%a", &song(), "orig", &rules()),
            "One More TimeDaft Punk"
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let first = render_pattern("%a - %T (%Y)", &song(), "orig", &rules());
        let second = render_pattern("%a - %T (%Y)", &song(), "orig", &rules());
        assert_eq!(first, second);
    }

    #[test]
    fn test_sanitizes_separator_in_field_value() {
        let song = SongData {
            artists: vec!["AC/DC".to_string()],
            title: Some("T.N.T.".to_string()),
            ..Default::default()
        };
        let resolved = render_pattern("%a - %T", &song, "orig", &SanitizeRules::universal());
        assert_eq!(resolved, "AC_DC - T.N.T.");
        assert!(!resolved.contains('/'));
    }

    #[test]
    fn test_windows_rules_replace_full_set() {
        let resolved = SanitizeRules::windows().sanitize("a\\b:c*d?e\"f<g>h|i/j");
        assert_eq!(resolved, "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn test_universal_rules_keep_windows_chars() {
        assert_eq!(SanitizeRules::universal().sanitize("what?"), "what?");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let rules = SanitizeRules::windows();
        let once = rules.sanitize("AC/DC: Back?\x07");
        assert_eq!(rules.sanitize(&once), once);
    }

    #[test]
    fn test_empty_result_falls_back_to_file_stem() {
        assert_eq!(
            render_pattern("%a%T", &SongData::default(), "original song", &rules()),
            "original song"
        );
        assert_eq!(render_pattern("", &song(), "original song", &rules()), "original song");
    }

    #[test]
    fn test_fallback_stem_is_sanitized_too() {
        assert_eq!(
            render_pattern("%a", &SongData::default(), "odd:name", &SanitizeRules::windows()),
            "odd_name"
        );
    }

    #[test]
    fn test_tokenize_segments() {
        let segments = tokenize("%a - %T%z");
        assert_eq!(
            segments,
            vec![
                Segment::Token(Token::Artist),
                Segment::Literal(" - ".to_string()),
                Segment::Token(Token::Title),
                Segment::Literal("%z".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_trailing_percent() {
        let segments = tokenize("%T%");
        assert_eq!(
            segments,
            vec![
                Segment::Token(Token::Title),
                Segment::Literal("%".to_string()),
            ]
        );
    }
}
