//! Capabilities shared by everything that can be streamed.

use serde::Serialize;

use crate::preview::SongPreview;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Native,
    Transcode,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TranscodeSettings {
    pub format: String,
    pub bitrate: Option<u32>,
}

/// Where stream URLs point and who is asking.
#[derive(Clone, Copy, Debug)]
pub struct StreamBase<'a> {
    /// Prefix ending in `?`, e.g. `http://host/play/index.php?`.
    pub url: &'a str,
    pub user_id: Option<i32>,
}

pub trait Playable {
    const OBJECT_TYPE: &'static str;

    fn object_id(&self) -> Option<i32>;

    fn stream_types(&self) -> &'static [StreamType];

    fn transcode_settings(&self, target: Option<&str>) -> Option<TranscodeSettings>;

    /// Human readable name used as the last URL parameter.
    fn stream_name(&self, artist_name: &str) -> String;

    fn play_url(
        &self,
        base: &StreamBase<'_>,
        artist_name: &str,
        additional_params: &str,
    ) -> Option<String> {
        let id = self.object_id()?;
        let uid = base.user_id.unwrap_or(-1);
        let name = urlencoding::encode(&self.stream_name(artist_name)).into_owned();
        Some(format!(
            "{}type={}&oid={id}&uid={uid}&name={name}{additional_params}",
            base.url,
            Self::OBJECT_TYPE
        ))
    }
}

impl Playable for SongPreview {
    const OBJECT_TYPE: &'static str = "song_preview";

    fn object_id(&self) -> Option<i32> {
        self.id
    }

    fn stream_types(&self) -> &'static [StreamType] {
        &[StreamType::Native]
    }

    // previews are always served as-is
    fn transcode_settings(&self, _target: Option<&str>) -> Option<TranscodeSettings> {
        None
    }

    fn stream_name(&self, artist_name: &str) -> String {
        match self.file_type.as_deref() {
            Some(file_type) => format!("{artist_name} - {}.{file_type}", self.title),
            None => format!("{artist_name} - {}", self.title),
        }
    }
}
