use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr, TransactionTrait,
};
use tracing::{debug, info};

use crate::{
    entities::{favorite, movie, user},
    error::{AppError, AppResult},
    models::{FavoriteState, now_sec},
};

#[derive(Clone)]
pub struct Favorites {
    db: DatabaseConnection,
}

impl Favorites {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Flips the (user, movie) favorite and reports the state after the flip.
    ///
    /// Runs in one transaction whose first statement is the delete, so the
    /// write lock is taken before anything is read. The pair is inserted only
    /// if nothing was deleted. A concurrent insert of the same pair trips
    /// `idx_user_favorites_unique` and is reported as favorited.
    pub async fn toggle(&self, user_id: i32, movie_id: Option<i32>) -> AppResult<FavoriteState> {
        let Some(movie_id) = movie_id else {
            return Err(AppError::validation("电影ID不能为空"));
        };

        debug!(user_id, movie_id, "toggling favorite");

        let txn = self.db.begin().await?;

        let removed = favorite::Entity::delete_many()
            .filter(favorite::Column::UserId.eq(user_id))
            .filter(favorite::Column::MovieId.eq(movie_id))
            .exec(&txn)
            .await?
            .rows_affected;

        let is_favorite = if removed > 0 {
            false
        } else {
            if user::Entity::find_by_id(user_id).one(&txn).await?.is_none() {
                debug!(user_id, "favorite toggle for unknown user");
                return Err(AppError::not_found("用户不存在，请重新登录"));
            }
            if movie::Entity::find_by_id(movie_id).one(&txn).await?.is_none() {
                debug!(movie_id, "favorite toggle for unknown movie");
                return Err(AppError::not_found("电影不存在"));
            }
            insert_favorite(&txn, user_id, movie_id).await?;
            true
        };

        txn.commit().await?;

        info!(user_id, movie_id, is_favorite, "favorite toggled");
        Ok(FavoriteState { is_favorite })
    }

    /// Favorited movies, most recently favorited first.
    pub async fn list(&self, user_id: i32) -> AppResult<Vec<movie::Model>> {
        let rows = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .find_also_related(movie::Entity)
            .order_by_desc(favorite::Column::CreatedAt)
            .order_by_desc(favorite::Column::Id)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().filter_map(|(_, movie)| movie).collect())
    }
}

async fn insert_favorite<C: ConnectionTrait>(conn: &C, user_id: i32, movie_id: i32) -> AppResult<()> {
    let model = favorite::ActiveModel {
        user_id: Set(user_id),
        movie_id: Set(movie_id),
        created_at: Set(now_sec()),
        ..Default::default()
    };

    match favorite::Entity::insert(model).exec(conn).await {
        Ok(_) => Ok(()),
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            debug!(user_id, movie_id, "favorite inserted concurrently");
            Ok(())
        },
        Err(err) => Err(err.into()),
    }
}
