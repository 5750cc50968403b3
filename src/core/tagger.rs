use std::path::Path;

use anyhow::Result;
use id3::frame::{Content, Frame};
use id3::{Tag, TagLike, Timestamp, Version};

use crate::models::SongData;

/// Write the identified metadata into the file's ID3v2.4 tag. Only fields
/// the lookup actually produced are touched; everything else in an existing
/// tag is preserved.
pub fn write_tags(path: &Path, song: &SongData) -> Result<()> {
    let mut tag = Tag::read_from_path(path).unwrap_or_else(|_| Tag::new());

    if let Some(ref title) = song.title {
        tag.set_title(title);
    }
    if !song.artists.is_empty() {
        tag.set_artist(song.artists.join(", "));
    }
    if let Some(ref album) = song.album {
        tag.set_album(album);
    }
    if !song.genres.is_empty() {
        tag.set_genre(song.genres.join(", "));
    }
    if let Some(track) = song.track_number {
        tag.set_track(track);
    }
    if let Some(disk) = song.disk_number {
        tag.set_disc(disk);
    }
    if let Some(ref composer) = song.composer {
        tag.add_frame(Frame::with_content(
            "TCOM",
            Content::Text(composer.clone()),
        ));
    }
    if let Some(ref isrc) = song.isrc {
        tag.add_frame(Frame::with_content("TSRC", Content::Text(isrc.clone())));
    }
    if let Some(release) = song.release {
        if let Some(year) = release.year {
            tag.set_year(year);
            tag.set_date_released(Timestamp {
                year,
                month: release.month.map(|m| m as u8),
                day: release.day.map(|d| d as u8),
                hour: None,
                minute: None,
                second: None,
            });
        }
    }

    tag.write_to_path(path, Version::Id3v24)?;
    Ok(())
}
