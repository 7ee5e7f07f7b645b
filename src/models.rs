use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{actor, movie, user};

/// Uniform response envelope: `{ success, data?, message? }`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), message: None }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self { success: true, data: Some(data), message: Some(message.into()) }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, data: None, message: Some(message.into()) }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self { success: true, data: None, message: Some(message.into()) }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i32,
    pub phone: String,
    pub nickname: String,
    pub avatar: Option<String>,
    pub register_time: String,
}

impl From<user::Model> for UserProfile {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            phone: user.phone,
            nickname: user.nickname,
            avatar: user.avatar,
            register_time: format_timestamp(user.register_time),
        }
    }
}

/// Result of a successful register or login.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: UserProfile,
    pub token: String,
    pub expires_at: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovieWithActors {
    #[serde(flatten)]
    pub movie: movie::Model,
    pub actors: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorWork {
    pub id: i32,
    pub title: String,
    pub cover: String,
    pub score: f64,
}

impl From<movie::Model> for ActorWork {
    fn from(movie: movie::Model) -> Self {
        Self { id: movie.id, title: movie.title, cover: movie.cover, score: movie.score }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    #[serde(flatten)]
    pub actor: actor::Model,
    pub works: Vec<ActorWork>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    #[serde(flatten)]
    pub movie: movie::Model,
    pub cast: Vec<CastMember>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CarouselItem {
    pub id: i32,
    pub movie_id: i32,
    pub sort_order: i32,
    pub is_active: bool,
    pub title: String,
    pub cover: String,
}

/// A movie comment joined with its author.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: i32,
    pub movie_id: i32,
    pub user_id: i32,
    pub content: String,
    pub created_at: String,
    pub username: String,
    pub avatar: Option<String>,
}

/// A user's comment joined with the movie it was left on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserCommentView {
    pub id: i32,
    pub movie_id: i32,
    pub user_id: i32,
    pub content: String,
    pub created_at: String,
    #[serde(rename = "movieTitle")]
    pub movie_title: String,
    #[serde(rename = "movieCover")]
    pub movie_cover: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteState {
    #[serde(rename = "isFavorite")]
    pub is_favorite: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Absent fields stay unchanged. An empty `avatar` clears it.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ToggleFavoriteRequest {
    #[serde(default, rename = "movieId")]
    pub movie_id: Option<Value>,
}

/// Body of `POST /comments/movies/:movieId`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MovieCommentRequest {
    #[serde(default, rename = "userId")]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Body of `POST /users/:id/comments`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UserCommentRequest {
    #[serde(default, rename = "movieId")]
    pub movie_id: Option<Value>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProxyQuery {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub timestamp: String,
    pub database: String,
}

/// Accepts ids sent either as JSON numbers or numeric strings. Anything that
/// is not a positive integer is treated as missing.
pub fn parse_id(value: Option<&Value>) -> Option<i32> {
    let id = match value? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    i32::try_from(id).ok().filter(|id| *id > 0)
}

pub fn format_timestamp(secs: i64) -> String {
    jiff::Timestamp::from_second(secs).map(|ts| ts.to_string()).unwrap_or_default()
}

pub fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}
