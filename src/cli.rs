use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{Cell, Table};

use crate::config;
use crate::core::template::{SanitizeRules, Segment};
use crate::core::{clip, renamer, scanner, tagger, template};
use crate::models::{ReleaseDate, SongData};
use crate::report::Reporter;
use crate::sources::audd::{AuddClient, RecognitionResult, Reply};
use crate::sources::{self, Source};

const PATTERN_HELP: &str = "\
Filename pattern tokens:
    %%  literal percent       %f  original filename
    %a  artist(s)             %c  composer
    %b  album                 %g  genre(s)
    %T  title                 %t  short title
    %x  explicit marker       %i  ISRC
    %k  disk number           %#  track number
    %Y / %y  release year (four / two digits)
    %M / %m  release month (zero-padded / plain)
    %D / %d  release day (zero-padded / plain)";

#[derive(Parser)]
#[command(
    name = "audfill",
    version,
    about = "Look up songs on audd.io, then rename, tag or fetch extras",
    after_help = PATTERN_HELP
)]
pub struct Cli {
    /// Paths or URLs of sound files to identify. Directories are searched
    /// recursively for audio files.
    #[arg(value_name = "FILE", required = true)]
    pub inputs: Vec<String>,

    /// Start of the sample window, "m:ss.ms"
    #[arg(short = 'b', long)]
    pub start: Option<String>,

    /// End of the sample window; at most 25 seconds after the start
    #[arg(short = 'e', long)]
    pub end: Option<String>,

    /// Length of the sample window; at most 25 seconds
    #[arg(short = 'l', long)]
    pub length: Option<String>,

    /// Don't add sources implied by other options
    #[arg(short = 'n', long)]
    pub minimum: bool,

    /// Extra data source; repeatable, earlier sources win on conflicts
    #[arg(short = 's', long = "source", value_enum)]
    pub sources: Vec<Source>,

    /// Use every extra source
    #[arg(short = 'S', long)]
    pub all_sources: bool,

    /// Market to look the song up in for Apple Music and Spotify
    #[arg(short = 'c', long, default_value = "us")]
    pub market: String,

    /// Print the lyrics
    #[arg(short = 'w', long)]
    pub lyrics: bool,

    /// Rename the file according to this pattern; the extension is kept
    #[arg(short = 'r', long, value_name = "PATTERN")]
    pub rename: Option<String>,

    /// Write the identified metadata into the file's ID3 tags
    #[arg(long)]
    pub tag: bool,

    /// Display everything gathered about the song
    #[arg(short = 'i', long)]
    pub info: bool,

    /// Print the raw JSON response
    #[arg(short = 'j', long)]
    pub output_json: bool,

    /// Print a link to the song
    #[arg(short = 'u', long)]
    pub link: bool,

    /// Save the album art to a file named by this pattern
    #[arg(short = 'a', long, value_name = "PATTERN")]
    pub art: Option<String>,

    /// Save the artist art to a file named by this pattern
    #[arg(short = 'g', long, value_name = "PATTERN")]
    pub artist_art: Option<String>,

    /// Save the song preview to a file named by this pattern
    #[arg(short = 'p', long, value_name = "PATTERN")]
    pub preview: Option<String>,

    /// audd.io API token; falls back to AUDDIOTOKEN, then the config file
    #[arg(short = 't', long)]
    pub token: Option<String>,

    /// Don't print warnings and errors
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

/// Everything one lookup needs, resolved once per run.
struct Job {
    client: AuddClient,
    report: Reporter,
    sources: Vec<Source>,
    window: clip::ClipWindow,
    times_given: bool,
    rename: Option<Vec<Segment>>,
    art: Option<Vec<Segment>>,
    artist_art: Option<Vec<Segment>>,
    preview: Option<Vec<Segment>>,
    rules: SanitizeRules,
    lyrics: bool,
    tag: bool,
    info: bool,
    output_json: bool,
    link: bool,
}

/// Process every input and return how many of them failed; the count
/// becomes the process exit code.
pub fn run(cli: Cli) -> Result<u64> {
    let report = Reporter::new(cli.quiet);
    let cfg = config::load_config();

    let token = cli
        .token
        .clone()
        .filter(|t| !t.is_empty())
        .or_else(|| std::env::var("AUDDIOTOKEN").ok().filter(|t| !t.is_empty()))
        .or(cfg.audd.api_token);

    let market = if cli.market != "us" {
        Some(cli.market.clone())
    } else {
        cfg.audd.market.clone().filter(|m| m != "us")
    };

    let rename = cli.rename.as_deref().map(template::tokenize);
    let art = cli.art.as_deref().map(template::tokenize);
    let artist_art = cli.artist_art.as_deref().map(template::tokenize);
    let preview = cli.preview.as_deref().map(template::tokenize);

    let ops = sources::Operations {
        rename_pattern: rename.as_deref(),
        art: art.is_some(),
        artist_art: artist_art.is_some(),
        preview: preview.is_some(),
        lyrics: cli.lyrics,
    };
    let selected = sources::select_sources(&cli.sources, cli.all_sources, cli.minimum, &ops);

    if market.is_some()
        && !selected
            .iter()
            .any(|s| matches!(s, Source::AppleMusic | Source::Spotify))
    {
        report.warn("market specified but will not be used");
    }

    let times_given = cli.start.is_some() || cli.end.is_some() || cli.length.is_some();
    let window = clip::resolve_window(
        cli.start.as_deref(),
        cli.end.as_deref(),
        cli.length.as_deref(),
        &report,
    );

    let job = Job {
        client: AuddClient::new(token, market)?,
        report,
        sources: selected,
        window,
        times_given,
        rename,
        art,
        artist_art,
        preview,
        rules: SanitizeRules::host(),
        lyrics: cli.lyrics,
        tag: cli.tag,
        info: cli.info,
        output_json: cli.output_json,
        link: cli.link,
    };

    let mut errors = 0u64;
    for input in &cli.inputs {
        if is_url(input) {
            errors += job.process_url(input);
        } else {
            match scanner::collect_inputs(Path::new(input)) {
                Ok(files) => {
                    for file in files {
                        errors += job.process_file(&file);
                    }
                }
                Err(e) => {
                    job.report.error(format!("{:#}", e));
                    errors += 1;
                }
            }
        }
    }

    Ok(errors)
}

fn is_url(input: &str) -> bool {
    reqwest::Url::parse(input)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Base name of a local file, without the extension.
fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("download")
        .to_string()
}

/// Something stem-like for a URL input, backing %f and the empty-name
/// fallback.
fn url_stem(url: &str) -> String {
    let tail = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url);
    let tail = tail.split(['?', '#']).next().unwrap_or(tail);
    let stem = match tail.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => tail,
    };
    if stem.is_empty() {
        "download".to_string()
    } else {
        stem.to_string()
    }
}

impl Job {
    fn process_file(&self, path: &Path) -> u64 {
        self.report.info(format!("processing file {}", path.display()));

        let clip_file = match clip::extract(path, &self.window, &self.report) {
            Ok(f) => f,
            Err(e) => {
                self.report.error(format!("{:#}", e));
                return 1;
            }
        };

        let reply = match self.client.recognize_file(clip_file.path(), &self.sources) {
            Ok(reply) => reply,
            Err(e) => {
                self.report.error(format!("{:#}; song being skipped", e));
                return 1;
            }
        };

        self.handle_reply(reply, Some(path), &file_stem(path))
    }

    fn process_url(&self, url: &str) -> u64 {
        self.report.info(format!("processing URL {}", url));

        if self.rename.is_some() {
            self.report.warn("cannot rename a URL, ignoring the rename");
        }
        if self.tag {
            self.report.warn("cannot tag a URL, ignoring --tag");
        }

        let stem = url_stem(url);

        // Custom times mean we have to cut the audio ourselves.
        if self.times_given {
            self.report
                .info("downloading the file because custom times were given");
            let reply = (|| -> Result<Reply> {
                let (bytes, _ext) = self.client.download(url)?;
                let mut download = tempfile::NamedTempFile::new()
                    .context("could not create a temporary file")?;
                download
                    .write_all(&bytes)
                    .context("could not write the download")?;
                let clip_file = clip::extract(download.path(), &self.window, &self.report)?;
                self.client.recognize_file(clip_file.path(), &self.sources)
            })();
            return match reply {
                Ok(reply) => self.handle_reply(reply, None, &stem),
                Err(e) => {
                    self.report.error(format!("{:#}; song being skipped", e));
                    1
                }
            };
        }

        match self.client.recognize_url(url, &self.sources) {
            Ok(reply) => self.handle_reply(reply, None, &stem),
            Err(e) => {
                self.report.error(format!("{:#}; song being skipped", e));
                1
            }
        }
    }

    fn handle_reply(&self, reply: Reply, path: Option<&Path>, stem: &str) -> u64 {
        if self.output_json {
            if let Ok(json) = serde_json::to_string_pretty(&reply.raw) {
                println!("{}", json);
            }
        }

        if let Some(ref error) = reply.parsed.error {
            self.report.error(format!(
                "audd.io error {}: {}",
                error.error_code, error.error_message
            ));
            return 1;
        }
        if reply.parsed.status != "success" {
            self.report.error(format!(
                "unexpected audd.io status \"{}\"",
                reply.parsed.status
            ));
            return 1;
        }

        match reply.parsed.result {
            Some(ref result) => self.apply(result, path, stem),
            None => {
                self.report.error("song not found");
                1
            }
        }
    }

    /// Run every requested operation against one recognition result.
    fn apply(&self, result: &RecognitionResult, path: Option<&Path>, stem: &str) -> u64 {
        let song = result.merge(&self.sources);
        let mut errors = 0u64;

        self.report.info(format!("found {}", song.summary()));

        if self.lyrics {
            match song.lyrics {
                Some(ref lyrics) => println!("{}", lyrics),
                None => {
                    self.report.error("lyrics not found for song, skipping");
                    errors += 1;
                }
            }
        }

        if self.link {
            match song.link {
                Some(ref link) => println!("{}", link),
                None => {
                    self.report.error("link not found for song, skipping");
                    errors += 1;
                }
            }
        }

        if let Some(ref pattern) = self.art {
            errors += self.save_download(song.art_url.as_deref(), pattern, &song, stem, "art");
        }
        if let Some(ref pattern) = self.artist_art {
            errors += self.save_download(
                song.artist_art_url.as_deref(),
                pattern,
                &song,
                stem,
                "artist art",
            );
        }
        if let Some(ref pattern) = self.preview {
            errors +=
                self.save_download(song.preview_url.as_deref(), pattern, &song, stem, "preview");
        }

        if let Some(path) = path {
            // Tags first: renaming moves the file out from under us.
            if self.tag {
                if scanner::is_mp3(path) {
                    if let Err(e) = tagger::write_tags(path, &song) {
                        self.report.error(format!("could not write tags: {:#}", e));
                        errors += 1;
                    }
                } else {
                    self.report.warn(format!(
                        "{} is not an MP3, tags not written",
                        path.display()
                    ));
                }
            }

            if let Some(ref pattern) = self.rename {
                let new_stem = template::render(pattern, &song, stem, &self.rules);
                if let Err(e) = renamer::rename_file(path, &new_stem, &self.report) {
                    self.report.error(format!("{:#}", e));
                    errors += 1;
                }
            }
        }

        if self.info {
            print_info(result, &self.sources);
        }

        errors
    }

    /// Fetch a URL and save it under a template-derived name; the extension
    /// comes from the response's Content-Type.
    fn save_download(
        &self,
        url: Option<&str>,
        pattern: &[Segment],
        song: &SongData,
        stem: &str,
        what: &str,
    ) -> u64 {
        let url = match url {
            Some(url) => url,
            None => {
                self.report
                    .error(format!("{} not found for song, skipping", what));
                return 1;
            }
        };

        let (bytes, extension) = match self.client.download(url) {
            Ok(download) => download,
            Err(e) => {
                self.report.error(format!("{:#}", e));
                return 1;
            }
        };

        let name = template::render(pattern, song, stem, &self.rules);
        let target =
            renamer::unique_path(Path::new(&format!("{}.{}", name, extension)), &self.report);
        match std::fs::write(&target, bytes) {
            Ok(()) => 0,
            Err(e) => {
                self.report
                    .error(format!("could not save {}: {}", target.display(), e));
                1
            }
        }
    }
}

fn print_info(result: &RecognitionResult, sources: &[Source]) {
    print_source_table("audd.io", &result.base_song());

    for source in sources {
        match source {
            Source::AppleMusic => {
                if let Some(ref track) = result.apple_music {
                    print_source_table("Apple Music", &track.to_song());
                }
            }
            Source::Spotify => {
                if let Some(ref track) = result.spotify {
                    print_source_table("Spotify", &track.to_song());
                }
            }
            Source::Napster => {
                if let Some(ref track) = result.napster {
                    print_source_table("Napster", &track.to_song());
                }
            }
            Source::Deezer => {
                if let Some(ref track) = result.deezer {
                    print_source_table("Deezer", &track.to_song());
                }
            }
            Source::Lyrics => {
                if let Some(text) = result.lyrics.as_ref().and_then(|l| l.lyrics.as_deref()) {
                    println!("\nLyrics:");
                    println!("{}", text);
                }
            }
        }
    }
}

/// One table per source, listing only the fields that source supplied.
fn print_source_table(name: &str, song: &SongData) {
    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);

    if !song.artists.is_empty() {
        add_row(&mut table, "Artist", &song.artists.join(", "));
    }
    if let Some(ref title) = song.title {
        add_row(&mut table, "Title", title);
    }
    if let Some(ref short) = song.short_title {
        add_row(&mut table, "Short Title", short);
    }
    if let Some(ref album) = song.album {
        add_row(&mut table, "Album", album);
    }
    if let Some(ref composer) = song.composer {
        add_row(&mut table, "Composer", composer);
    }
    if !song.genres.is_empty() {
        add_row(&mut table, "Genre", &song.genres.join(", "));
    }
    if let Some(release) = song.release {
        add_row(&mut table, "Release Date", &fmt_release(&release));
    }
    if let Some(ms) = song.duration_ms {
        add_row(&mut table, "Duration", &fmt_duration(ms));
    }
    if let Some(explicit) = song.explicit {
        add_row(&mut table, "Explicit", if explicit { "Yes" } else { "No" });
    }
    if let Some(disk) = song.disk_number {
        add_row(&mut table, "Disk", &disk.to_string());
    }
    if let Some(track) = song.track_number {
        add_row(&mut table, "Track", &track.to_string());
    }
    if let Some(ref isrc) = song.isrc {
        add_row(&mut table, "ISRC", isrc);
    }
    if let Some(ref timecode) = song.timecode {
        add_row(&mut table, "Found At", timecode);
    }
    if let Some(ref link) = song.link {
        add_row(&mut table, "Link", link);
    }
    if let Some(ref art) = song.art_url {
        add_row(&mut table, "Artwork", art);
    }
    if let Some(ref art) = song.artist_art_url {
        add_row(&mut table, "Artist Art", art);
    }
    if let Some(ref preview) = song.preview_url {
        add_row(&mut table, "Preview", preview);
    }

    println!("\n{}:", name);
    println!("{table}");
}

fn add_row(table: &mut Table, field: &str, value: &str) {
    table.add_row(vec![Cell::new(field), Cell::new(value)]);
}

fn fmt_release(date: &ReleaseDate) -> String {
    let mut out = String::new();
    if let Some(year) = date.year {
        out.push_str(&year.to_string());
    }
    if let Some(month) = date.month {
        out.push_str(&format!("-{:02}", month));
    }
    if let Some(day) = date.day {
        out.push_str(&format!("-{:02}", day));
    }
    out
}

/// Milliseconds to "m:ss.ms", the shape the time flags accept.
fn fmt_duration(ms: u64) -> String {
    format!("{}:{:02}.{:03}", ms / 60_000, (ms % 60_000) / 1000, ms % 1000)
}
