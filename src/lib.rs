pub mod accounts;
pub mod auth;
pub mod catalog;
pub mod client;
pub mod comments;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod favorites;
pub mod models;
pub mod proxy;
pub mod routes;
pub mod seed;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    accounts::Accounts, auth::TokenIssuer, catalog::Catalog, comments::Comments, config::Config,
    favorites::Favorites, proxy::VideoProxy,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DatabaseConnection,
    pub tokens: TokenIssuer,
    pub accounts: Accounts,
    pub catalog: Catalog,
    pub favorites: Favorites,
    pub comments: Comments,
    pub proxy: Arc<VideoProxy>,
}

impl AppState {
    pub fn new(config: Arc<Config>, db: DatabaseConnection, http: reqwest::Client) -> Self {
        let tokens = TokenIssuer::new(&config.jwt_secret, config.token_ttl_hours);
        Self {
            accounts: Accounts::new(db.clone(), tokens.clone(), config.bcrypt_cost),
            catalog: Catalog::new(db.clone()),
            favorites: Favorites::new(db.clone()),
            comments: Comments::new(db.clone()),
            proxy: Arc::new(VideoProxy::new(http, config.proxy_rps)),
            tokens,
            db,
            config,
        }
    }
}

/// Full HTTP surface, mounted under `/api`.
pub fn router(state: Arc<AppState>) -> Router {
    // Static segments take priority over `{id}`.
    let api = Router::new()
        .route("/health", get(routes::health))
        .route("/movies", get(routes::list_movies))
        .route("/movies/search", get(routes::search_movies))
        .route("/movies/hot/list", get(routes::hot_movies))
        .route("/movies/new/list", get(routes::new_movies))
        .route("/movies/proxy/video", get(routes::proxy_video))
        .route("/movies/{id}", get(routes::get_movie))
        .route("/movies/{id}/clips", get(routes::movie_clips))
        .route("/carousel", get(routes::carousel))
        .route("/users/register", post(routes::register))
        .route("/users/login", post(routes::login))
        .route("/users/{id}", get(routes::user_profile).put(routes::update_profile))
        .route("/users/{id}/favorites", get(routes::list_favorites).post(routes::toggle_favorite))
        .route(
            "/users/{id}/comments",
            get(routes::list_user_comments).post(routes::add_user_comment),
        )
        .route("/users/{id}/comments/{comment_id}", delete(routes::delete_comment))
        .route(
            "/comments/movies/{movie_id}",
            get(routes::list_movie_comments).post(routes::add_movie_comment),
        )
        .fallback(routes::not_found);

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
}
