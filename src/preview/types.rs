use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

/// Columns selected for hydration; `session` is deliberately not loaded.
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult)]
pub struct PreviewRow {
    pub id: i32,
    pub file: String,
    pub album_mbid: Option<String>,
    pub artist: i32,
    pub title: String,
    pub disk: Option<i32>,
    pub track: Option<i32>,
    pub mbid: Option<String>,
}

/// Cached attribute set of one preview.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewInfo {
    pub id: i32,
    pub file: String,
    pub album_mbid: Option<String>,
    pub artist: i32,
    pub title: String,
    pub disk: Option<i32>,
    pub track: Option<i32>,
    pub mbid: Option<String>,
    /// Only resolved on the single-row path.
    pub artist_mbid: Option<String>,
}

impl From<PreviewRow> for PreviewInfo {
    fn from(row: PreviewRow) -> Self {
        PreviewInfo {
            id: row.id,
            file: row.file,
            album_mbid: row.album_mbid,
            artist: row.artist,
            title: row.title,
            disk: row.disk,
            track: row.track,
            mbid: row.mbid,
            artist_mbid: None,
        }
    }
}

/// Everything the caller supplies when creating a preview.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPreview {
    pub file: String,
    pub album_mbid: Option<String>,
    pub artist: i32,
    pub title: String,
    pub disk: Option<i32>,
    pub track: Option<i32>,
    pub mbid: Option<String>,
    pub session: String,
}
