use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // artist and session usually belong to other subsystems, hence if_not_exists
        manager
            .create_table(
                Table::create()
                    .table(Artist::Table)
                    .if_not_exists()
                    .col(pk_auto(Artist::Id))
                    .col(string_null(Artist::Mbid))
                    .col(string_null(Artist::Prefix))
                    .col(string(Artist::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Session::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Session::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .to_owned(),
            )
            .await?;

        // no foreign keys: orphaned rows are left for the reaper
        manager
            .create_table(
                Table::create()
                    .table(SongPreview::Table)
                    .if_not_exists()
                    .col(pk_auto(SongPreview::Id))
                    .col(string(SongPreview::File))
                    .col(string_null(SongPreview::AlbumMbid))
                    .col(integer(SongPreview::Artist))
                    .col(string(SongPreview::Title))
                    .col(integer_null(SongPreview::Disk))
                    .col(integer_null(SongPreview::Track))
                    .col(string_null(SongPreview::Mbid))
                    .col(string(SongPreview::Session))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-song_preview-session-album_mbid")
                    .table(SongPreview::Table)
                    .col(SongPreview::Session)
                    .col(SongPreview::AlbumMbid)
                    .to_owned(),
            )
            .await
    }

    // artist and session are left alone, they may hold data owned elsewhere
    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SongPreview::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Artist {
    Table,
    Id,
    Mbid,
    Prefix,
    Name,
}

#[derive(DeriveIden)]
enum Session {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum SongPreview {
    Table,
    Id,
    File,
    AlbumMbid,
    Artist,
    Title,
    Disk,
    Track,
    Mbid,
    Session,
}
