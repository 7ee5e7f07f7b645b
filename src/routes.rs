use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, header},
    response::Response,
};
use axum_extra::extract::WithRejection;

use crate::{
    AppState,
    auth::AuthUser,
    entities::{clip, movie},
    error::{AppError, AppResult},
    models::{
        ApiResponse, AuthSession, CarouselItem, CommentView, FavoriteState, HealthStatus,
        LoginRequest, MovieCommentRequest, MovieDetail, MovieWithActors, ProxyQuery,
        RegisterRequest, SearchQuery, ToggleFavoriteRequest, UpdateProfileRequest,
        UserCommentRequest, UserCommentView, UserProfile, format_timestamp, now_sec, parse_id,
    },
};

type Reply<T> = AppResult<Json<ApiResponse<T>>>;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthStatus>> {
    let database = match state.db.ping().await {
        Ok(()) => "ok",
        Err(err) => {
            tracing::warn!(error = %err, "database ping failed");
            "unavailable"
        },
    };
    let status =
        HealthStatus { timestamp: format_timestamp(now_sec()), database: database.to_string() };
    Json(ApiResponse::ok_with_message(status, "服务器运行正常"))
}

pub async fn not_found() -> AppError {
    AppError::not_found("接口不存在")
}

// Movies

pub async fn list_movies(State(state): State<Arc<AppState>>) -> Reply<Vec<MovieWithActors>> {
    Ok(Json(ApiResponse::ok(state.catalog.list().await?)))
}

pub async fn search_movies(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(query), _): WithRejection<Query<SearchQuery>, AppError>,
) -> Reply<Vec<movie::Model>> {
    let keyword = query.q.unwrap_or_default();
    Ok(Json(ApiResponse::ok(state.catalog.search(&keyword).await?)))
}

pub async fn hot_movies(State(state): State<Arc<AppState>>) -> Reply<Vec<movie::Model>> {
    Ok(Json(ApiResponse::ok(state.catalog.hot_list().await?)))
}

pub async fn new_movies(State(state): State<Arc<AppState>>) -> Reply<Vec<movie::Model>> {
    Ok(Json(ApiResponse::ok(state.catalog.new_list().await?)))
}

pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
) -> Reply<MovieDetail> {
    Ok(Json(ApiResponse::ok(state.catalog.get_by_id(id).await?)))
}

pub async fn movie_clips(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
) -> Reply<Vec<clip::Model>> {
    Ok(Json(ApiResponse::ok(state.catalog.clips_for(id).await?)))
}

pub async fn proxy_video(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    WithRejection(Query(query), _): WithRejection<Query<ProxyQuery>, AppError>,
) -> AppResult<Response> {
    state.proxy.fetch(query.url.as_deref(), headers.get(header::RANGE)).await
}

pub async fn carousel(State(state): State<Arc<AppState>>) -> Reply<Vec<CarouselItem>> {
    Ok(Json(ApiResponse::ok(state.catalog.carousel().await?)))
}

// Users

pub async fn register(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> Reply<AuthSession> {
    let session = state
        .accounts
        .register(req.phone.as_deref(), req.password.as_deref(), req.nickname.as_deref())
        .await?;
    Ok(Json(ApiResponse::ok_with_message(session, "注册成功")))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Reply<AuthSession> {
    let session = state.accounts.login(req.phone.as_deref(), req.password.as_deref()).await?;
    Ok(Json(ApiResponse::ok_with_message(session, "登录成功")))
}

pub async fn user_profile(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
) -> Reply<UserProfile> {
    Ok(Json(ApiResponse::ok(state.accounts.profile(id).await?)))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateProfileRequest>, AppError>,
) -> Reply<UserProfile> {
    caller.ensure_is(id)?;
    let profile = state
        .accounts
        .update_profile(id, req.nickname.as_deref(), req.avatar.as_deref())
        .await?;
    Ok(Json(ApiResponse::ok_with_message(profile, "更新成功")))
}

pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
) -> Reply<Vec<movie::Model>> {
    Ok(Json(ApiResponse::ok(state.favorites.list(id).await?)))
}

pub async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<ToggleFavoriteRequest>, AppError>,
) -> Reply<FavoriteState> {
    caller.ensure_is(id)?;
    let toggled = state.favorites.toggle(id, parse_id(req.movie_id.as_ref())).await?;
    let message = if toggled.is_favorite { "收藏成功" } else { "取消收藏成功" };
    Ok(Json(ApiResponse::ok_with_message(toggled, message)))
}

pub async fn list_user_comments(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
) -> Reply<Vec<UserCommentView>> {
    Ok(Json(ApiResponse::ok(state.comments.list_for_user(id).await?)))
}

pub async fn add_user_comment(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<UserCommentRequest>, AppError>,
) -> Reply<CommentView> {
    caller.ensure_is(id)?;
    let Some(movie_id) = parse_id(req.movie_id.as_ref()) else {
        return Err(AppError::validation("电影ID不能为空"));
    };
    let comment = state.comments.add(movie_id, Some(id), req.content.as_deref()).await?;
    Ok(Json(ApiResponse::ok_with_message(comment, "评论成功")))
}

pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    WithRejection(Path((id, comment_id)), _): WithRejection<Path<(i32, i32)>, AppError>,
) -> AppResult<Json<ApiResponse<()>>> {
    caller.ensure_is(id)?;
    state.comments.delete(id, comment_id).await?;
    Ok(Json(ApiResponse::message("删除成功")))
}

// Comments

pub async fn list_movie_comments(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(movie_id), _): WithRejection<Path<i32>, AppError>,
) -> Reply<Vec<CommentView>> {
    Ok(Json(ApiResponse::ok(state.comments.list_for_movie(movie_id).await?)))
}

pub async fn add_movie_comment(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    WithRejection(Path(movie_id), _): WithRejection<Path<i32>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<MovieCommentRequest>, AppError>,
) -> Reply<CommentView> {
    let user_id = parse_id(req.user_id.as_ref());
    if let Some(user_id) = user_id {
        caller.ensure_is(user_id)?;
    }
    let comment = state.comments.add(movie_id, user_id, req.content.as_deref()).await?;
    Ok(Json(ApiResponse::ok_with_message(comment, "评论成功")))
}
