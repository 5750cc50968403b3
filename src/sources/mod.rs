pub mod apple_music;
pub mod audd;
pub mod deezer;
pub mod napster;
pub mod spotify;

use clap::ValueEnum;

use crate::core::template::{Segment, Token};

/// Extra data sections the audd.io API can attach to a recognition result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum Source {
    Lyrics,
    AppleMusic,
    Spotify,
    Napster,
    Deezer,
}

impl Source {
    /// Every source, in precedence order (used by --all-sources).
    pub const ALL: [Source; 5] = [
        Source::Lyrics,
        Source::AppleMusic,
        Source::Spotify,
        Source::Napster,
        Source::Deezer,
    ];

    /// The identifier the audd.io `return` parameter expects.
    pub fn api_name(self) -> &'static str {
        match self {
            Source::Lyrics => "lyrics",
            Source::AppleMusic => "apple_music",
            Source::Spotify => "spotify",
            Source::Napster => "napster",
            Source::Deezer => "deezer",
        }
    }
}

/// The operations requested on the command line, as far as source selection
/// cares about them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Operations<'a> {
    pub rename_pattern: Option<&'a [Segment]>,
    pub art: bool,
    pub artist_art: bool,
    pub preview: bool,
    pub lyrics: bool,
}

/// Build the ordered source list for a run: the explicitly requested
/// sources first (their order sets the merge priority), then, unless
/// `minimum` is set, whatever the requested operations need to succeed.
pub fn select_sources(
    explicit: &[Source],
    all_sources: bool,
    minimum: bool,
    ops: &Operations,
) -> Vec<Source> {
    let mut selected: Vec<Source> = Vec::new();
    for source in explicit {
        push_unique(&mut selected, *source);
    }

    if all_sources {
        for source in Source::ALL {
            push_unique(&mut selected, source);
        }
    }

    if minimum {
        return selected;
    }

    if ops.art && !has_any(&selected, &[Source::AppleMusic, Source::Spotify, Source::Deezer]) {
        selected.push(Source::AppleMusic);
    }
    if ops.artist_art && !selected.contains(&Source::Deezer) {
        selected.push(Source::Deezer);
    }
    // Spotify previews are blank most of the time, so it doesn't count here.
    if ops.preview && !has_any(&selected, &[Source::AppleMusic, Source::Napster, Source::Deezer]) {
        selected.push(Source::AppleMusic);
    }
    if ops.lyrics {
        push_unique(&mut selected, Source::Lyrics);
    }

    if let Some(pattern) = ops.rename_pattern {
        if uses_token(pattern, &[Token::ShortTitle]) && !selected.contains(&Source::Deezer) {
            selected.push(Source::Deezer);
        }
        if uses_token(pattern, &[Token::Genre, Token::Composer])
            && !selected.contains(&Source::AppleMusic)
        {
            selected.push(Source::AppleMusic);
        }
        if uses_token(pattern, &[Token::Explicit])
            && !has_any(&selected, &[Source::Spotify, Source::Napster, Source::Deezer])
        {
            selected.push(Source::Spotify);
        }
        if uses_token(pattern, &[Token::DiskNumber, Token::TrackNumber, Token::Isrc])
            && !has_any(&selected, &[Source::AppleMusic, Source::Spotify, Source::Napster])
        {
            selected.push(Source::AppleMusic);
        }
    }

    selected
}

fn push_unique(selected: &mut Vec<Source>, source: Source) {
    if !selected.contains(&source) {
        selected.push(source);
    }
}

fn has_any(selected: &[Source], candidates: &[Source]) -> bool {
    candidates.iter().any(|c| selected.contains(c))
}

fn uses_token(pattern: &[Segment], tokens: &[Token]) -> bool {
    pattern
        .iter()
        .any(|segment| matches!(segment, Segment::Token(t) if tokens.contains(t)))
}
