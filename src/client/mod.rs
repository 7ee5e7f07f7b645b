//! Typed client for the `/api` surface, used by front ends and the
//! session-backed [`store::UserStore`].

pub mod store;

use reqwest::{Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;

use crate::{
    entities::movie,
    models::{
        ApiResponse, AuthSession, FavoriteState, UpdateProfileRequest, UserCommentView,
        UserProfile,
    },
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with `success: false` or a non-2xx status.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("请先登录")]
    NotLoggedIn,
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` points at the `/api` prefix, e.g. `http://localhost:3000/api`.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    pub async fn register(
        &self,
        phone: &str,
        password: &str,
        nickname: Option<&str>,
    ) -> ClientResult<AuthSession> {
        let body = json!({ "phone": phone, "password": password, "nickname": nickname });
        self.send(Method::POST, "/users/register", None, Some(&body)).await
    }

    pub async fn login(&self, phone: &str, password: &str) -> ClientResult<AuthSession> {
        let body = json!({ "phone": phone, "password": password });
        self.send(Method::POST, "/users/login", None, Some(&body)).await
    }

    pub async fn update_profile(
        &self,
        token: &str,
        user_id: i32,
        nickname: Option<&str>,
        avatar: Option<&str>,
    ) -> ClientResult<UserProfile> {
        let body = UpdateProfileRequest {
            nickname: nickname.map(str::to_string),
            avatar: avatar.map(str::to_string),
        };
        self.send(Method::PUT, &format!("/users/{user_id}"), Some(token), Some(&body)).await
    }

    pub async fn favorites(&self, user_id: i32) -> ClientResult<Vec<movie::Model>> {
        self.send(Method::GET, &format!("/users/{user_id}/favorites"), None, None::<&()>).await
    }

    pub async fn toggle_favorite(
        &self,
        token: &str,
        user_id: i32,
        movie_id: i32,
    ) -> ClientResult<FavoriteState> {
        let body = json!({ "movieId": movie_id });
        self.send(Method::POST, &format!("/users/{user_id}/favorites"), Some(token), Some(&body))
            .await
    }

    pub async fn user_comments(&self, user_id: i32) -> ClientResult<Vec<UserCommentView>> {
        self.send(Method::GET, &format!("/users/{user_id}/comments"), None, None::<&()>).await
    }

    pub async fn delete_comment(
        &self,
        token: &str,
        user_id: i32,
        comment_id: i32,
    ) -> ClientResult<()> {
        let path = format!("/users/{user_id}/comments/{comment_id}");
        self.envelope::<serde_json::Value, ()>(Method::DELETE, &path, Some(token), None).await?;
        Ok(())
    }

    async fn send<T, B>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let (status, envelope) = self.envelope::<T, B>(method, path, token, body).await?;
        envelope.data.ok_or_else(|| ClientError::Api {
            status: status.as_u16(),
            message: envelope.message.unwrap_or_else(|| "响应缺少数据".to_string()),
        })
    }

    async fn envelope<T, B>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> ClientResult<(StatusCode, ApiResponse<T>)>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, url = %url, "api request");

        let mut req = self.client.request(method, url);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        let envelope: ApiResponse<T> = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::debug!(status = status.as_u16(), error = %err, "unreadable api response");
                return Err(ClientError::Api {
                    status: status.as_u16(),
                    message: format!("请求失败: {status}"),
                });
            },
        };

        if !status.is_success() || !envelope.success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: envelope.message.unwrap_or_else(|| format!("请求失败: {status}")),
            });
        }

        Ok((status, envelope))
    }
}
