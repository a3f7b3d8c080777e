use std::sync::atomic::{AtomicU64, Ordering};

use camino::{Utf8Path, Utf8PathBuf};
use sea_orm::{
    sea_query::Query, ActiveValue as AV, ColumnTrait, ConnectOptions, Database,
    DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect,
};
use sea_orm_migration::MigratorTrait;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    entity::{artist, session, song_preview},
    migration::Migrator,
    preview::types::{NewPreview, PreviewRow},
};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbErr),
    #[error("data path must be absolute: {0}")]
    RelativePath(Utf8PathBuf),
}

/// Database access for preview rows plus the read-only artist and session
/// lookups they depend on.
///
/// Every statement sent to the database counts as one round-trip.
#[derive(Debug)]
pub struct Store {
    connection: DatabaseConnection,
    round_trips: AtomicU64,
}

const PREVIEW_COLUMNS: [song_preview::Column; 8] = [
    song_preview::Column::Id,
    song_preview::Column::File,
    song_preview::Column::AlbumMbid,
    song_preview::Column::Artist,
    song_preview::Column::Title,
    song_preview::Column::Disk,
    song_preview::Column::Track,
    song_preview::Column::Mbid,
];

/// Ids per `IN (...)` list, well below SQLite's bind variable limit.
pub const BATCH_CHUNK: usize = 500;

impl Store {
    pub async fn new(data_path: impl AsRef<Utf8Path>) -> Result<Self, Error> {
        let path = data_path.as_ref();
        if !path.is_absolute() {
            return Err(Error::RelativePath(path.to_owned()));
        }

        let db_url = format!("sqlite://{path}/prevue.sqlite?mode=rwc");
        debug!("database URL: {db_url}");
        let mut opts = ConnectOptions::new(db_url);
        opts.sqlx_logging(true)
            .sqlx_logging_level(log::LevelFilter::Debug);

        Self::connect(opts).await
    }

    pub async fn connect(opts: impl Into<ConnectOptions>) -> Result<Self, Error> {
        let connection = Database::connect(opts).await?;
        Ok(Self {
            connection,
            round_trips: AtomicU64::new(0),
        })
    }

    pub async fn migrate(&self) -> Result<(), Error> {
        Migrator::up(&self.connection, None).await?;
        Ok(())
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    /// Number of queries issued through this store so far.
    pub fn round_trips(&self) -> u64 {
        self.round_trips.load(Ordering::Relaxed)
    }

    fn tick(&self) {
        self.round_trips.fetch_add(1, Ordering::Relaxed);
    }

    pub async fn insert_preview(&self, preview: &NewPreview) -> Result<i32, Error> {
        self.tick();
        let row = song_preview::ActiveModel {
            file: AV::Set(preview.file.clone()),
            album_mbid: AV::Set(preview.album_mbid.clone()),
            artist: AV::Set(preview.artist),
            title: AV::Set(preview.title.clone()),
            disk: AV::Set(preview.disk),
            track: AV::Set(preview.track),
            mbid: AV::Set(preview.mbid.clone()),
            session: AV::Set(preview.session.clone()),
            ..Default::default()
        };
        let res = song_preview::Entity::insert(row)
            .exec(&self.connection)
            .await?;
        trace!("inserted preview {}", res.last_insert_id);
        Ok(res.last_insert_id)
    }

    /// One `IN (...)` query per [`BATCH_CHUNK`] ids.
    pub async fn previews(&self, ids: &[i32]) -> Result<Vec<PreviewRow>, Error> {
        debug!("batch preview query for {} ids", ids.len());
        let mut rows = Vec::new();
        for chunk in ids.chunks(BATCH_CHUNK) {
            self.tick();
            rows.extend(
                song_preview::Entity::find()
                    .select_only()
                    .columns(PREVIEW_COLUMNS)
                    .filter(song_preview::Column::Id.is_in(chunk.iter().copied()))
                    .into_model::<PreviewRow>()
                    .all(&self.connection)
                    .await?,
            );
        }
        Ok(rows)
    }

    pub async fn preview(&self, id: i32) -> Result<Option<PreviewRow>, Error> {
        self.tick();
        let row = song_preview::Entity::find()
            .select_only()
            .columns(PREVIEW_COLUMNS)
            .filter(song_preview::Column::Id.eq(id))
            .into_model::<PreviewRow>()
            .one(&self.connection)
            .await?;
        Ok(row)
    }

    /// Ids of the previews a session holds for one album, in store order.
    pub async fn preview_ids_for_session(
        &self,
        session_id: &str,
        album_mbid: &str,
    ) -> Result<Vec<i32>, Error> {
        self.tick();
        let ids = song_preview::Entity::find()
            .select_only()
            .column(song_preview::Column::Id)
            .filter(song_preview::Column::Session.eq(session_id))
            .filter(song_preview::Column::AlbumMbid.eq(album_mbid))
            .into_tuple::<i32>()
            .all(&self.connection)
            .await?;
        Ok(ids)
    }

    pub async fn artist_mbid(&self, artist_id: i32) -> Result<Option<String>, Error> {
        self.tick();
        let mbid = artist::Entity::find_by_id(artist_id)
            .select_only()
            .column(artist::Column::Mbid)
            .into_tuple::<Option<String>>()
            .one(&self.connection)
            .await?;
        Ok(mbid.flatten())
    }

    pub async fn artist(&self, artist_id: i32) -> Result<Option<artist::Model>, Error> {
        self.tick();
        Ok(artist::Entity::find_by_id(artist_id)
            .one(&self.connection)
            .await?)
    }

    pub async fn artists(&self, ids: &[i32]) -> Result<Vec<artist::Model>, Error> {
        let mut artists = Vec::new();
        for chunk in ids.chunks(BATCH_CHUNK) {
            self.tick();
            artists.extend(
                artist::Entity::find()
                    .filter(artist::Column::Id.is_in(chunk.iter().copied()))
                    .all(&self.connection)
                    .await?,
            );
        }
        Ok(artists)
    }

    /// Deletes every preview whose session row no longer exists.
    pub async fn delete_orphaned_previews(&self) -> Result<u64, Error> {
        self.tick();
        let live_sessions = Query::select()
            .column(session::Column::Id)
            .from(session::Entity)
            .to_owned();
        let res = song_preview::Entity::delete_many()
            .filter(song_preview::Column::Session.not_in_subquery(live_sessions))
            .exec(&self.connection)
            .await?;
        Ok(res.rows_affected)
    }
}
