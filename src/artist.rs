use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::{
    cache::{ObjectKind, RequestCache},
    entity::artist,
    store::Store,
};

/// Loads all `ids` into `cache` with a single query.
///
/// Non-positive ids are ignored; returns `false` without touching the store
/// when nothing is left.
pub async fn build_cache(
    store: &Store,
    cache: &mut RequestCache,
    ids: impl IntoIterator<Item = i32>,
) -> bool {
    let ids: Vec<i32> = ids
        .into_iter()
        .filter(|id| *id > 0)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if ids.is_empty() {
        return false;
    }

    match store.artists(&ids).await {
        Ok(artists) => {
            debug!("cached {} of {} artists", artists.len(), ids.len());
            for artist in artists {
                cache.add_to_cache(artist.id, artist);
            }
        }
        Err(e) => warn!("artist batch lookup: {e}"),
    }
    true
}

pub async fn lookup(store: &Store, cache: &mut RequestCache, id: i32) -> Option<artist::Model> {
    if id <= 0 {
        return None;
    }
    if cache.is_cached(ObjectKind::Artist, id) {
        return cache.get_from_cache::<artist::Model>(id).cloned();
    }

    match store.artist(id).await {
        Ok(Some(artist)) => {
            cache.add_to_cache(id, artist.clone());
            Some(artist)
        }
        Ok(None) => None,
        Err(e) => {
            warn!("artist {id} lookup: {e}");
            None
        }
    }
}
