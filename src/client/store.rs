use tracing::{debug, info};

use super::{ApiClient, ClientError, ClientResult};
use crate::{
    entities::movie,
    models::{AuthSession, UserCommentView, UserProfile, now_sec},
};

/// Logged-in user plus the token that authenticates them.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub user: UserProfile,
    pub token: String,
    pub expires_at: i64,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= now_sec()
    }
}

impl From<AuthSession> for Session {
    fn from(auth: AuthSession) -> Self {
        Self { user: auth.user, token: auth.token, expires_at: auth.expires_at }
    }
}

/// Client-side user state. Lists are only ever replaced by a server fetch;
/// mutation responses are not used to patch them.
pub struct UserStore {
    api: ApiClient,
    session: Option<Session>,
    favorites: Vec<movie::Model>,
    comments: Vec<UserCommentView>,
}

impl UserStore {
    pub fn new(api: ApiClient) -> Self {
        Self { api, session: None, favorites: Vec::new(), comments: Vec::new() }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_expired())
    }

    pub fn favorites(&self) -> &[movie::Model] {
        &self.favorites
    }

    pub fn comments(&self) -> &[UserCommentView] {
        &self.comments
    }

    pub fn is_favorite(&self, movie_id: i32) -> bool {
        self.favorites.iter().any(|m| m.id == movie_id)
    }

    pub async fn login(&mut self, phone: &str, password: &str) -> ClientResult<&Session> {
        let auth = self.api.login(phone, password).await?;
        self.adopt(auth.into()).await
    }

    pub async fn register(
        &mut self,
        phone: &str,
        password: &str,
        nickname: Option<&str>,
    ) -> ClientResult<&Session> {
        let auth = self.api.register(phone, password, nickname).await?;
        self.adopt(auth.into()).await
    }

    /// Resumes a persisted session. An expired one logs the store out and
    /// returns `false`.
    pub async fn restore(&mut self, session: Session) -> ClientResult<bool> {
        if session.is_expired() {
            debug!(user_id = session.user.id, "stored session expired");
            self.logout();
            return Ok(false);
        }
        self.adopt(session).await?;
        Ok(true)
    }

    pub fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            info!(user_id = session.user.id, "logged out");
        }
        self.favorites.clear();
        self.comments.clear();
    }

    /// Saves nickname/avatar changes and swaps the returned profile into the
    /// session.
    pub async fn update_profile(
        &mut self,
        nickname: Option<&str>,
        avatar: Option<&str>,
    ) -> ClientResult<&UserProfile> {
        let session = self.live_session()?;
        let profile =
            self.api.update_profile(&session.token, session.user.id, nickname, avatar).await?;
        let session = self.session.as_mut().ok_or(ClientError::NotLoggedIn)?;
        session.user = profile;
        Ok(&session.user)
    }

    pub async fn fetch_favorites(&mut self) -> ClientResult<&[movie::Model]> {
        let user_id = self.live_session()?.user.id;
        self.favorites = self.api.favorites(user_id).await?;
        Ok(&self.favorites)
    }

    pub async fn fetch_user_comments(&mut self) -> ClientResult<&[UserCommentView]> {
        let user_id = self.live_session()?.user.id;
        self.comments = self.api.user_comments(user_id).await?;
        Ok(&self.comments)
    }

    /// Flips a favorite on the server and reloads the list. Returns the
    /// state the server reported.
    pub async fn toggle_favorite(&mut self, movie_id: i32) -> ClientResult<bool> {
        let session = self.live_session()?;
        let state = self.api.toggle_favorite(&session.token, session.user.id, movie_id).await?;
        self.fetch_favorites().await?;
        Ok(state.is_favorite)
    }

    pub async fn delete_comment(&mut self, comment_id: i32) -> ClientResult<()> {
        let session = self.live_session()?;
        self.api.delete_comment(&session.token, session.user.id, comment_id).await?;
        self.fetch_user_comments().await?;
        Ok(())
    }

    async fn adopt(&mut self, session: Session) -> ClientResult<&Session> {
        info!(user_id = session.user.id, "session started");
        self.session = Some(session);
        self.comments.clear();
        self.fetch_favorites().await?;
        self.live_session()
    }

    fn live_session(&self) -> ClientResult<&Session> {
        self.session.as_ref().filter(|s| !s.is_expired()).ok_or(ClientError::NotLoggedIn)
    }
}
