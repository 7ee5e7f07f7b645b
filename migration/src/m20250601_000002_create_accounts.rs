use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_uniq(Users::Phone))
                    .col(string(Users::Password))
                    .col(string(Users::Nickname))
                    .col(string_null(Users::Avatar))
                    .col(big_integer(Users::RegisterTime))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(pk_auto(Comments::Id))
                    .col(integer(Comments::MovieId))
                    .col(integer(Comments::UserId))
                    .col(text(Comments::Content))
                    .col(big_integer(Comments::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_movie")
                            .from(Comments::Table, Comments::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_user")
                            .from(Comments::Table, Comments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comments_movie_created")
                    .table(Comments::Table)
                    .col(Comments::MovieId)
                    .col(Comments::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comments_user_created")
                    .table(Comments::Table)
                    .col(Comments::UserId)
                    .col(Comments::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserFavorites::Table)
                    .if_not_exists()
                    .col(pk_auto(UserFavorites::Id))
                    .col(integer(UserFavorites::UserId))
                    .col(integer(UserFavorites::MovieId))
                    .col(big_integer(UserFavorites::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_favorites_user")
                            .from(UserFavorites::Table, UserFavorites::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_favorites_movie")
                            .from(UserFavorites::Table, UserFavorites::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_favorites_unique")
                    .table(UserFavorites::Table)
                    .col(UserFavorites::UserId)
                    .col(UserFavorites::MovieId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(UserFavorites::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Comments::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Phone,
    Password,
    Nickname,
    Avatar,
    RegisterTime,
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    Id,
    MovieId,
    UserId,
    Content,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserFavorites {
    Table,
    Id,
    UserId,
    MovieId,
    CreatedAt,
}
