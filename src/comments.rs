use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{debug, info};

use crate::{
    entities::{comment, movie, user},
    error::{AppError, AppResult},
    models::{CommentView, UserCommentView, format_timestamp, now_sec},
};

#[derive(Clone)]
pub struct Comments {
    db: DatabaseConnection,
}

impl Comments {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Stores a comment and returns it joined with its author.
    pub async fn add(
        &self,
        movie_id: i32,
        user_id: Option<i32>,
        content: Option<&str>,
    ) -> AppResult<CommentView> {
        let content = content.map(str::trim).filter(|c| !c.is_empty());
        let (Some(user_id), Some(content)) = (user_id, content) else {
            return Err(AppError::validation("用户ID和评论内容不能为空"));
        };

        if movie::Entity::find_by_id(movie_id).one(&self.db).await?.is_none() {
            return Err(AppError::not_found("电影不存在"));
        }
        if user::Entity::find_by_id(user_id).one(&self.db).await?.is_none() {
            return Err(AppError::not_found("用户不存在，请重新登录"));
        }

        let inserted = comment::ActiveModel {
            movie_id: Set(movie_id),
            user_id: Set(user_id),
            content: Set(content.to_string()),
            created_at: Set(now_sec()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(comment_id = inserted.id, movie_id, user_id, "comment added");

        let row = comment::Entity::find_by_id(inserted.id)
            .find_also_related(user::Entity)
            .one(&self.db)
            .await?;

        match row {
            Some((comment, Some(author))) => Ok(comment_view(comment, author)),
            _ => Err(AppError::Internal(anyhow::anyhow!(
                "comment {} vanished after insert",
                inserted.id
            ))),
        }
    }

    /// Comments on a movie, newest first.
    pub async fn list_for_movie(&self, movie_id: i32) -> AppResult<Vec<CommentView>> {
        let rows = comment::Entity::find()
            .filter(comment::Column::MovieId.eq(movie_id))
            .find_also_related(user::Entity)
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(comment, author)| Some(comment_view(comment, author?)))
            .collect())
    }

    /// Comments written by a user, newest first.
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<UserCommentView>> {
        let rows = comment::Entity::find()
            .filter(comment::Column::UserId.eq(user_id))
            .find_also_related(movie::Entity)
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(comment, movie)| {
                let movie = movie?;
                Some(UserCommentView {
                    id: comment.id,
                    movie_id: comment.movie_id,
                    user_id: comment.user_id,
                    content: comment.content,
                    created_at: format_timestamp(comment.created_at),
                    movie_title: movie.title,
                    movie_cover: movie.cover,
                })
            })
            .collect())
    }

    /// Deletes a comment owned by `user_id`. Missing and foreign comments are
    /// both rejected as forbidden.
    pub async fn delete(&self, user_id: i32, comment_id: i32) -> AppResult<()> {
        let owned = comment::Entity::find_by_id(comment_id)
            .filter(comment::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        if owned.is_none() {
            debug!(user_id, comment_id, "delete rejected: missing or not owned");
            return Err(AppError::forbidden("无权删除此评论或评论不存在"));
        }

        comment::Entity::delete_many()
            .filter(comment::Column::Id.eq(comment_id))
            .filter(comment::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        info!(user_id, comment_id, "comment deleted");
        Ok(())
    }
}

fn comment_view(comment: comment::Model, author: user::Model) -> CommentView {
    CommentView {
        id: comment.id,
        movie_id: comment.movie_id,
        user_id: comment.user_id,
        content: comment.content,
        created_at: format_timestamp(comment.created_at),
        username: author.nickname,
        avatar: author.avatar,
    }
}
