use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};
use tempfile::NamedTempFile;

use crate::report::Reporter;

/// Sample length used when the user gives no times.
pub const DEFAULT_WINDOW_MS: u64 = 18_000;
/// The API rejects samples longer than this.
pub const MAX_WINDOW_MS: u64 = 25_000;

/// The slice of the input to upload for recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipWindow {
    /// None means: center the window on the file's halfway point.
    pub start_ms: Option<u64>,
    pub length_ms: u64,
    /// Whether the length came from an explicit --end/--length flag, which
    /// controls whether short inputs deserve a warning.
    pub explicit_length: bool,
}

/// Parse `"m:ss.ms"`, `"m:ss"`, `"s.ms"` or `"s"` into milliseconds.
pub fn parse_time(s: &str) -> Option<u64> {
    let s = s.trim();
    let (clock, ms) = match s.split_once('.') {
        Some((clock, ms)) => (clock, ms.parse::<u64>().ok()?),
        None => (s, 0),
    };
    let (minutes, seconds) = match clock.split_once(':') {
        Some((m, sec)) => (m.parse::<u64>().ok()?, sec.parse::<u64>().ok()?),
        None => (0, clock.parse::<u64>().ok()?),
    };
    Some(ms + seconds * 1000 + minutes * 60_000)
}

fn parse_time_or_default(s: &str, report: &Reporter) -> u64 {
    match parse_time(s) {
        Some(ms) => ms,
        None => {
            report.warn(
                "invalid time entered, expected \"m:ss.ms\", \"m:ss\", \"s.ms\" or \"s\"; \
                 using the default instead",
            );
            DEFAULT_WINDOW_MS
        }
    }
}

/// Reduce the --start/--end/--length flags to one window.
///
/// An end without a start is ignored. A length overrides an end. Windows
/// longer than the API limit are truncated, empty windows fall back to the
/// default length.
pub fn resolve_window(
    start: Option<&str>,
    end: Option<&str>,
    length: Option<&str>,
    report: &Reporter,
) -> ClipWindow {
    let mut start_ms = None;
    let mut length_ms = None;
    let mut end = end;

    match start {
        Some(raw) => {
            let s = parse_time_or_default(raw, report);
            start_ms = Some(s);
            if let Some(raw_end) = end {
                let e = parse_time_or_default(raw_end, report);
                length_ms = Some(e.saturating_sub(s));
            }
        }
        None => {
            if end.is_some() {
                report.warn("end time given with no start, ignoring end time");
                end = None;
            }
        }
    }

    if let Some(raw) = length {
        if end.is_some() {
            report.warn("both end time and length given, length will be used");
        }
        length_ms = Some(parse_time_or_default(raw, report));
    }

    let explicit_length = end.is_some() || length.is_some();
    let mut length_ms = length_ms.unwrap_or(DEFAULT_WINDOW_MS);

    if length_ms > MAX_WINDOW_MS {
        report.warn("specified length is longer than 25 seconds and will be truncated");
        length_ms = MAX_WINDOW_MS;
    }
    if length_ms == 0 {
        report.warn("length is not positive, 18 seconds will be used instead");
        length_ms = DEFAULT_WINDOW_MS;
    }

    ClipWindow {
        start_ms,
        length_ms,
        explicit_length,
    }
}

/// Cut the window out of `path` into a temporary MP3 ready for upload.
/// Needs ffmpeg and ffprobe on the PATH.
pub fn extract(path: &Path, window: &ClipWindow, report: &Reporter) -> Result<NamedTempFile> {
    let duration_ms = probe_duration(path)?;

    let mut start_ms = window.start_ms;
    if let Some(s) = start_ms {
        if s >= duration_ms {
            report.warn("sound file is shorter than the given start time, using the halfway point");
            start_ms = None;
        }
    }

    let (start_ms, length_ms) = if duration_ms <= window.length_ms {
        if window.explicit_length {
            report.warn("sound file is not as long as the specified length, using the whole file");
        }
        (0, duration_ms)
    } else {
        let start = start_ms.unwrap_or((duration_ms - window.length_ms) / 2);
        (start, window.length_ms)
    };

    let clip = tempfile::Builder::new()
        .prefix("audfill-")
        .suffix(".mp3")
        .tempfile()
        .context("could not create a temporary file for the sample")?;

    let status = Command::new("ffmpeg")
        .arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-y")
        .arg("-ss")
        .arg(fmt_seconds(start_ms))
        .arg("-t")
        .arg(fmt_seconds(length_ms))
        .arg("-i")
        .arg(path)
        .arg("-vn")
        .arg("-acodec")
        .arg("libmp3lame")
        .arg(clip.path())
        .status()
        .context("could not run ffmpeg, is it installed?")?;

    if !status.success() {
        bail!("ffmpeg failed to cut a sample from {}", path.display());
    }

    Ok(clip)
}

/// Ask ffprobe for the stream duration in milliseconds.
fn probe_duration(path: &Path) -> Result<u64> {
    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration")
        .arg("-of")
        .arg("default=noprint_wrappers=1:nokey=1")
        .arg(path)
        .output()
        .context("could not run ffprobe, is it installed?")?;

    if !output.status.success() {
        bail!("ffprobe could not read {}", path.display());
    }

    let seconds: f64 = String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse()
        .with_context(|| format!("unexpected ffprobe output for {}", path.display()))?;

    Ok((seconds * 1000.0) as u64)
}

fn fmt_seconds(ms: u64) -> String {
    format!("{}.{:03}", ms / 1000, ms % 1000)
}
