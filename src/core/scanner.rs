use std::path::{Path, PathBuf};

use anyhow::Result;

/// Extensions we are willing to upload for recognition.
const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "m4a", "aac", "flac", "ogg", "opus", "wav", "wma", "aiff",
];

/// Expand one input path into the audio files to process. A directory is
/// walked recursively and returned sorted; a plain file is returned as-is.
pub fn collect_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_dir() {
        let mut files = Vec::new();
        collect_audio_files(path, &mut files)?;
        files.sort();
        return Ok(files);
    }

    if !path.exists() {
        anyhow::bail!("file not found: {}", path.display());
    }
    Ok(vec![path.to_path_buf()])
}

fn collect_audio_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            collect_audio_files(&path, files)?;
        } else if is_audio(&path) {
            files.push(path);
        }
    }

    Ok(())
}

/// Whether the extension is a supported audio format (case-insensitive).
pub fn is_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.iter().any(|a| ext.eq_ignore_ascii_case(a)))
        .unwrap_or(false)
}

/// Whether the path is an MP3; tag writing only supports these.
pub fn is_mp3(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("mp3"))
        .unwrap_or(false)
}
