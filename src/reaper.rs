//! Removal of previews whose session has ended.
//!
//! The session subsystem never deletes previews itself; a row is garbage as
//! soon as its `session` no longer names a row in the session table.

use std::{sync::Arc, time::Duration};

use tokio::{spawn, task::JoinHandle, time};
use tracing::{error, info, trace};

use crate::store::{Error, Store};

/// Deletes every orphaned preview and returns how many went away.
/// Running it again without new orphans is a no-op.
pub async fn garbage_collect(store: &Store) -> Result<u64, Error> {
    let reaped = store.delete_orphaned_previews().await?;
    if reaped > 0 {
        info!("reaped {reaped} orphaned previews");
    } else {
        trace!("no orphaned previews");
    }
    Ok(reaped)
}

/// Runs [`garbage_collect`] every `period` until the task is aborted.
pub fn spawn_periodic(store: Arc<Store>, period: Duration) -> JoinHandle<()> {
    info!("reaping orphaned previews every {period:?}");
    spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(e) = garbage_collect(&store).await {
                error!("preview gc: {e}");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::RequestCache,
        preview::SongPreview,
        store::testing::*,
    };

    #[tokio::test]
    async fn gc_is_idempotent() {
        let store = memory_store().await;
        add_session(&store, "S1").await;
        SongPreview::insert(&store, &new_preview("S1", "M1", 1, "live"))
            .await
            .unwrap();
        SongPreview::insert(&store, &new_preview("gone", "M1", 1, "orphan"))
            .await
            .unwrap();

        assert_eq!(garbage_collect(&store).await.unwrap(), 1);
        assert_eq!(garbage_collect(&store).await.unwrap(), 0);

        let mut cache = RequestCache::new();
        assert_eq!(
            SongPreview::for_session(&store, &mut cache, "S1", "M1").await.len(),
            1
        );
    }

    #[tokio::test]
    async fn gc_on_empty_store() {
        let store = memory_store().await;
        assert_eq!(garbage_collect(&store).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn preview_lifetime_is_bounded_by_session() {
        let store = memory_store().await;
        let artist = add_artist(&store, "Labradford", Some("mbid-7")).await;
        add_session(&store, "S1").await;
        SongPreview::insert(&store, &new_preview("S1", "M1", artist, "T"))
            .await
            .unwrap();

        let mut cache = RequestCache::new();
        let previews = SongPreview::for_session(&store, &mut cache, "S1", "M1").await;
        assert_eq!(previews.len(), 1);
        assert_eq!(previews[0].title, "T");
        assert_eq!(previews[0].artist_mbid.as_deref(), Some("mbid-7"));

        end_session(&store, "S1").await;
        garbage_collect(&store).await.unwrap();

        let mut cache = RequestCache::new();
        assert!(SongPreview::for_session(&store, &mut cache, "S1", "M1")
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn gc_reports_store_failure() {
        let store = memory_store().await;
        break_previews(&store).await;
        assert!(garbage_collect(&store).await.is_err());
    }

    #[tokio::test]
    async fn periodic_reaper_runs() {
        let store = Arc::new(memory_store().await);
        let id = SongPreview::insert(&store, &new_preview("gone", "M1", 1, "orphan"))
            .await
            .unwrap();

        // the first tick fires immediately
        let handle = spawn_periodic(store.clone(), Duration::from_secs(3600));
        let mut reaped = false;
        for _ in 0..100 {
            if store.preview(id).await.unwrap().is_none() {
                reaped = true;
                break;
            }
            time::sleep(Duration::from_millis(20)).await;
        }
        handle.abort();

        assert!(reaped);
    }
}
