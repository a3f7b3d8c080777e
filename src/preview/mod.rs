//! Session-scoped song previews.
//!
//! A preview row is a short-lived catalog entry (an audio sample found while
//! browsing an album) owned by one web session. Rows are only ever inserted
//! and read here; deletion happens in [`crate::reaper`] once the owning
//! session is gone.

use std::collections::BTreeSet;

use camino::Utf8Path;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::{
    artist,
    cache::{ObjectKind, RequestCache},
    store::{self, Store},
};
use types::{NewPreview, PreviewInfo};

pub mod display;

pub mod types;

/// A hydrated preview, or the absent preview when `id` is `None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SongPreview {
    pub id: Option<i32>,
    pub file: String,
    pub artist: i32,
    pub title: String,
    pub disk: Option<i32>,
    pub track: Option<i32>,
    pub album_mbid: Option<String>,
    pub artist_mbid: Option<String>,
    pub mbid: Option<String>,
    /// Lower-cased file extension.
    #[serde(rename = "type")]
    pub file_type: Option<String>,
    pub mime: Option<String>,
    pub enabled: bool,
}

impl Default for SongPreview {
    fn default() -> Self {
        SongPreview {
            id: None,
            file: String::new(),
            artist: 0,
            title: String::new(),
            disk: None,
            track: None,
            album_mbid: None,
            artist_mbid: None,
            mbid: None,
            file_type: None,
            mime: None,
            enabled: true,
        }
    }
}

/// Media type for a lower-cased file extension.
pub fn type_to_mime(file_type: &str) -> Option<String> {
    mime_guess::from_ext(file_type)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

impl SongPreview {
    pub async fn insert(store: &Store, preview: &NewPreview) -> Result<i32, store::Error> {
        match store.insert_preview(preview).await {
            Ok(id) => Ok(id),
            Err(e) => {
                warn!("unable to insert preview {}: {e}", preview.file);
                Err(e)
            }
        }
    }

    /// Warms `cache` for every id with one query per
    /// [`BATCH_CHUNK`](crate::store::BATCH_CHUNK) ids, then batch-loads the
    /// referenced artists.
    ///
    /// Returns `false` (and stays off the store) when no positive id is given.
    /// A failing query is logged and still reported as `true`; callers
    /// find out about missing rows by constructing the preview.
    ///
    /// `artist_mbid` is left unset on rows cached here. Entries already in
    /// the cache are kept so an enriched copy is not replaced.
    pub async fn build_cache(store: &Store, cache: &mut RequestCache, ids: &[i32]) -> bool {
        let ids: Vec<i32> = ids.iter().copied().filter(|id| *id > 0).collect();
        if ids.is_empty() {
            return false;
        }

        let rows = match store.previews(&ids).await {
            Ok(rows) => rows,
            Err(e) => {
                error!("preview batch lookup: {e}");
                return true;
            }
        };

        let mut artists = BTreeSet::new();
        for row in rows {
            artists.insert(row.artist);
            if !cache.is_cached(ObjectKind::SongPreview, row.id) {
                cache.add_to_cache(row.id, PreviewInfo::from(row));
            }
        }

        artist::build_cache(store, cache, artists).await;
        true
    }

    /// Hydrates preview `id` from the cache or, on a miss, from the store.
    ///
    /// Non-positive ids and ids without a row give the absent preview.
    pub async fn new(store: &Store, cache: &mut RequestCache, id: i32) -> Self {
        if id <= 0 {
            return Self::default();
        }

        match Self::info(store, cache, id).await {
            Some(info) => Self::hydrate(info),
            None => Self::default(),
        }
    }

    async fn info(store: &Store, cache: &mut RequestCache, id: i32) -> Option<PreviewInfo> {
        if cache.is_cached(ObjectKind::SongPreview, id) {
            return cache.get_from_cache::<PreviewInfo>(id).cloned();
        }

        let row = match store.preview(id).await {
            Ok(Some(row)) => row,
            Ok(None) => {
                debug!("no preview {id}");
                return None;
            }
            Err(e) => {
                warn!("preview {id} lookup: {e}");
                return None;
            }
        };

        let mut info = PreviewInfo::from(row);
        match store.artist_mbid(info.artist).await {
            Ok(mbid) => info.artist_mbid = mbid,
            Err(e) => warn!("artist mbid for preview {id}: {e}"),
        }

        cache.add_to_cache(id, info.clone());
        Some(info)
    }

    fn hydrate(info: PreviewInfo) -> Self {
        let file_type = Utf8Path::new(&info.file)
            .extension()
            .map(|ext| ext.to_lowercase());
        let mime = file_type.as_deref().and_then(type_to_mime);

        SongPreview {
            id: Some(info.id),
            file: info.file,
            artist: info.artist,
            title: info.title,
            disk: info.disk,
            track: info.track,
            album_mbid: info.album_mbid,
            artist_mbid: info.artist_mbid,
            mbid: info.mbid,
            file_type,
            mime,
            enabled: true,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.id.is_some()
    }

    /// Previews held by `session_id` for one album, in store order.
    ///
    /// A failing query is logged and yields an empty list.
    pub async fn for_session(
        store: &Store,
        cache: &mut RequestCache,
        session_id: &str,
        album_mbid: &str,
    ) -> Vec<Self> {
        let ids = match store.preview_ids_for_session(session_id, album_mbid).await {
            Ok(ids) => ids,
            Err(e) => {
                error!("previews for session: {e}");
                return vec![];
            }
        };

        let mut previews = Vec::with_capacity(ids.len());
        for id in ids {
            previews.push(Self::new(store, cache, id).await);
        }
        previews
    }

    pub async fn artist_name(&self, store: &Store, cache: &mut RequestCache) -> Option<String> {
        if !self.is_valid() {
            return None;
        }
        artist::lookup(store, cache, self.artist)
            .await
            .map(|artist| artist.full_name())
    }
}
