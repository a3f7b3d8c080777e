use camino::Utf8Path;
use serde::Serialize;

use super::SongPreview;

/// Maximum characters shown before a field gets an ellipsis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Thresholds {
    pub artist: usize,
    pub title: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            artist: 27,
            title: 27,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PreviewDisplay {
    pub file: String,
    pub artist_full: String,
    pub artist: String,
    pub title_full: String,
    pub title: String,
    pub track: Option<i32>,
}

pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else if max <= 3 {
        text.chars().take(max).collect()
    } else {
        let mut short: String = text.chars().take(max - 3).collect();
        short.push_str("...");
        short
    }
}

impl SongPreview {
    pub fn format(&self, artist_name: &str, thresholds: Thresholds) -> PreviewDisplay {
        let file = Utf8Path::new(&self.file)
            .file_name()
            .unwrap_or(&self.file)
            .to_string();

        PreviewDisplay {
            file,
            artist_full: artist_name.to_string(),
            artist: truncate(artist_name, thresholds.artist),
            title_full: self.title.clone(),
            title: truncate(&self.title, thresholds.title),
            track: self.track,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("Music Has the Right to Children", 10), "Music H...");
        assert_eq!(truncate("abcdef", 2), "ab");
        // counts characters, not bytes
        assert_eq!(truncate("Sigur Rós – Ágætis byrjun", 9), "Sigur ...");
    }

    #[test]
    fn format_preview() {
        let preview = SongPreview {
            id: Some(1),
            file: "/var/previews/session/Olson.flac".into(),
            title: "Olson".into(),
            track: Some(4),
            ..Default::default()
        };
        let display = preview.format(
            "Boards of Canada",
            Thresholds {
                artist: 8,
                title: 27,
            },
        );

        assert_eq!(display.file, "Olson.flac");
        assert_eq!(display.artist_full, "Boards of Canada");
        assert_eq!(display.artist, "Board...");
        assert_eq!(display.title, "Olson");
        assert_eq!(display.track, Some(4));
    }
}
