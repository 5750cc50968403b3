use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::report::Reporter;

/// Return a path that does not exist yet by appending ` (1)`, ` (2)`, ...
/// before the extension until the name is free.
pub fn unique_path(path: &Path, report: &Reporter) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let suffix = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    let mut count = 0u32;
    loop {
        count += 1;
        let candidate = dir.join(format!("{} ({}){}", stem, count, suffix));
        if !candidate.exists() {
            report.warn(format!(
                "\"{}\" already exists, using \"{}\"",
                path.display(),
                candidate.display()
            ));
            return candidate;
        }
    }
}

/// Rename a file in place to `new_stem`, keeping its extension. Renaming to
/// the current name is a no-op; an occupied destination gets a numbered
/// suffix instead of being overwritten.
pub fn rename_file(old_path: &Path, new_stem: &str, report: &Reporter) -> Result<PathBuf> {
    let file_name = match old_path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.{}", new_stem, ext),
        None => new_stem.to_string(),
    };

    let dir = old_path.parent().unwrap_or_else(|| Path::new("."));
    let new_path = dir.join(&file_name);

    if new_path == old_path {
        return Ok(new_path);
    }

    let new_path = unique_path(&new_path, report);
    std::fs::rename(old_path, &new_path)
        .with_context(|| format!("could not rename {}", old_path.display()))?;
    Ok(new_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> Reporter {
        Reporter::new(true)
    }

    #[test]
    fn test_unique_path_free_name_unchanged() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("song.mp3");
        assert_eq!(unique_path(&path, &quiet()), path);
    }

    #[test]
    fn test_unique_path_appends_counter() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("song.mp3");
        std::fs::write(&path, b"x").unwrap();
        std::fs::write(temp.path().join("song (1).mp3"), b"x").unwrap();

        assert_eq!(
            unique_path(&path, &quiet()),
            temp.path().join("song (2).mp3")
        );
    }

    #[test]
    fn test_rename_keeps_extension() {
        let temp = tempfile::tempdir().unwrap();
        let old = temp.path().join("old.mp3");
        std::fs::write(&old, b"x").unwrap();

        let new = rename_file(&old, "Daft Punk - One More Time", &quiet()).unwrap();
        assert_eq!(
            new,
            temp.path().join("Daft Punk - One More Time.mp3")
        );
        assert!(new.exists());
        assert!(!old.exists());
    }

    #[test]
    fn test_rename_to_same_name_is_noop() {
        let temp = tempfile::tempdir().unwrap();
        let old = temp.path().join("same.mp3");
        std::fs::write(&old, b"x").unwrap();

        let new = rename_file(&old, "same", &quiet()).unwrap();
        assert_eq!(new, old);
        assert!(old.exists());
    }

    #[test]
    fn test_rename_avoids_existing_file() {
        let temp = tempfile::tempdir().unwrap();
        let old = temp.path().join("old.mp3");
        let taken = temp.path().join("new.mp3");
        std::fs::write(&old, b"moved").unwrap();
        std::fs::write(&taken, b"kept").unwrap();

        let new = rename_file(&old, "new", &quiet()).unwrap();
        assert_eq!(new, temp.path().join("new (1).mp3"));
        assert_eq!(std::fs::read(&taken).unwrap(), b"kept");
        assert_eq!(std::fs::read(&new).unwrap(), b"moved");
    }
}
