//! Per-request memoization of hydrated rows.
//!
//! A [`RequestCache`] lives for exactly one processing unit (an HTTP request,
//! a maintenance job) and is dropped afterwards, so there is no eviction or
//! invalidation. Preview rows are never updated in place, which keeps the
//! cached copies correct for the whole lifetime of the cache.

use std::collections::HashMap;

use tracing::trace;

use crate::{entity::artist, preview::types::PreviewInfo};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    SongPreview,
    Artist,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheEntry {
    SongPreview(PreviewInfo),
    Artist(artist::Model),
}

/// A record type that can be stored in the [`RequestCache`].
pub trait Cached: Sized {
    const KIND: ObjectKind;

    fn into_entry(self) -> CacheEntry;

    fn from_entry(entry: &CacheEntry) -> Option<&Self>;
}

impl Cached for PreviewInfo {
    const KIND: ObjectKind = ObjectKind::SongPreview;

    fn into_entry(self) -> CacheEntry {
        CacheEntry::SongPreview(self)
    }

    fn from_entry(entry: &CacheEntry) -> Option<&Self> {
        match entry {
            CacheEntry::SongPreview(info) => Some(info),
            _ => None,
        }
    }
}

impl Cached for artist::Model {
    const KIND: ObjectKind = ObjectKind::Artist;

    fn into_entry(self) -> CacheEntry {
        CacheEntry::Artist(self)
    }

    fn from_entry(entry: &CacheEntry) -> Option<&Self> {
        match entry {
            CacheEntry::Artist(artist) => Some(artist),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct RequestCache {
    entries: HashMap<(ObjectKind, i32), CacheEntry>,
}

impl RequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cached(&self, kind: ObjectKind, id: i32) -> bool {
        self.entries.contains_key(&(kind, id))
    }

    pub fn get_from_cache<T: Cached>(&self, id: i32) -> Option<&T> {
        let hit = self.entries.get(&(T::KIND, id)).and_then(T::from_entry);
        trace!(
            "cache {} {:?}:{id}",
            if hit.is_some() { "hit" } else { "miss" },
            T::KIND
        );
        hit
    }

    /// Replaces whatever was cached under the same kind and id.
    pub fn add_to_cache<T: Cached>(&mut self, id: i32, value: T) {
        self.entries.insert((T::KIND, id), value.into_entry());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
