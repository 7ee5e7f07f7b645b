use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(pk_auto(Movies::Id))
                    .col(string(Movies::Title))
                    .col(string(Movies::Type))
                    .col(double(Movies::Score).default(0.0))
                    .col(string(Movies::Status))
                    .col(string(Movies::Cover))
                    .col(string(Movies::ReleaseTime))
                    .col(string(Movies::Duration))
                    .col(string(Movies::Director))
                    .col(text(Movies::Description))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movies_score")
                    .table(Movies::Table)
                    .col(Movies::Score)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movies_release_time")
                    .table(Movies::Table)
                    .col(Movies::ReleaseTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Actors::Table)
                    .if_not_exists()
                    .col(pk_auto(Actors::Id))
                    .col(string(Actors::Name))
                    .col(string_null(Actors::Avatar))
                    .col(string_null(Actors::Birth))
                    .col(string_null(Actors::BirthPlace))
                    .col(text_null(Actors::Intro))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieActors::Table)
                    .if_not_exists()
                    .col(integer(MovieActors::MovieId))
                    .col(integer(MovieActors::ActorId))
                    .primary_key(Index::create().col(MovieActors::MovieId).col(MovieActors::ActorId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_actors_movie")
                            .from(MovieActors::Table, MovieActors::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_actors_actor")
                            .from(MovieActors::Table, MovieActors::ActorId)
                            .to(Actors::Table, Actors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_actors_actor")
                    .table(MovieActors::Table)
                    .col(MovieActors::ActorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Clips::Table)
                    .if_not_exists()
                    .col(pk_auto(Clips::Id))
                    .col(integer(Clips::MovieId))
                    .col(string(Clips::Title))
                    .col(string_null(Clips::Cover))
                    .col(string(Clips::VideoUrl))
                    .col(string_null(Clips::Duration))
                    .col(integer(Clips::SortOrder).default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_clips_movie")
                            .from(Clips::Table, Clips::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_clips_movie_sort")
                    .table(Clips::Table)
                    .col(Clips::MovieId)
                    .col(Clips::SortOrder)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Carousels::Table)
                    .if_not_exists()
                    .col(pk_auto(Carousels::Id))
                    .col(integer(Carousels::MovieId))
                    .col(integer(Carousels::SortOrder).default(0))
                    .col(boolean(Carousels::IsActive).default(true))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_carousels_movie")
                            .from(Carousels::Table, Carousels::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Carousels::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Clips::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieActors::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Actors::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
    Title,
    Type,
    Score,
    Status,
    Cover,
    ReleaseTime,
    Duration,
    Director,
    Description,
}

#[derive(DeriveIden)]
enum Actors {
    Table,
    Id,
    Name,
    Avatar,
    Birth,
    BirthPlace,
    Intro,
}

#[derive(DeriveIden)]
enum MovieActors {
    Table,
    MovieId,
    ActorId,
}

#[derive(DeriveIden)]
enum Clips {
    Table,
    Id,
    MovieId,
    Title,
    Cover,
    VideoUrl,
    Duration,
    SortOrder,
}

#[derive(DeriveIden)]
enum Carousels {
    Table,
    Id,
    MovieId,
    SortOrder,
    IsActive,
}
