use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};
use tracing::{debug, info, warn};

use crate::{
    auth::{TokenIssuer, hash_password, verify_password},
    entities::user,
    error::{AppError, AppResult},
    models::{AuthSession, UserProfile, now_sec},
};

const DEFAULT_NICKNAME: &str = "用户";
const PHONE_TAKEN: &str = "该手机号已注册";

/// Registration, login, profile lookup and profile edits.
#[derive(Clone)]
pub struct Accounts {
    db: DatabaseConnection,
    tokens: TokenIssuer,
    bcrypt_cost: u32,
}

impl Accounts {
    pub fn new(db: DatabaseConnection, tokens: TokenIssuer, bcrypt_cost: u32) -> Self {
        Self { db, tokens, bcrypt_cost }
    }

    pub async fn register(
        &self,
        phone: Option<&str>,
        password: Option<&str>,
        nickname: Option<&str>,
    ) -> AppResult<AuthSession> {
        let (phone, password) = required_credentials(phone, password)?;

        if self.find_by_phone(phone).await?.is_some() {
            debug!(phone = %phone, "phone already registered");
            return Err(AppError::Conflict(PHONE_TAKEN.to_string()));
        }

        let hashed = hash_password(password, self.bcrypt_cost).await?;
        let nickname = nickname
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_NICKNAME);

        let model = user::ActiveModel {
            phone: Set(phone.to_string()),
            password: Set(hashed),
            nickname: Set(nickname.to_string()),
            avatar: Set(None),
            register_time: Set(now_sec()),
            ..Default::default()
        };

        // The unique index catches a registration racing the existence check above.
        let user = match model.insert(&self.db).await {
            Ok(user) => user,
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Err(AppError::Conflict(PHONE_TAKEN.to_string()));
            },
            Err(err) => return Err(err.into()),
        };

        info!(user_id = user.id, "registered user");
        self.session_for(user)
    }

    pub async fn login(&self, phone: Option<&str>, password: Option<&str>) -> AppResult<AuthSession> {
        let (phone, password) = required_credentials(phone, password)?;

        let Some(user) = self.find_by_phone(phone).await? else {
            debug!(phone = %phone, "login for unknown phone");
            return Err(AppError::not_found("该手机号未注册"));
        };

        if !verify_password(password, &user.password).await? {
            warn!(user_id = user.id, "password verification failed");
            return Err(AppError::Auth("密码错误".to_string()));
        }

        info!(user_id = user.id, "user logged in");
        self.session_for(user)
    }

    pub async fn profile(&self, user_id: i32) -> AppResult<UserProfile> {
        user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::not_found("用户不存在"))
    }

    pub async fn update_profile(
        &self,
        user_id: i32,
        nickname: Option<&str>,
        avatar: Option<&str>,
    ) -> AppResult<UserProfile> {
        let nickname = match nickname.map(str::trim) {
            Some("") => return Err(AppError::validation("昵称不能为空")),
            other => other,
        };

        let Some(user) = user::Entity::find_by_id(user_id).one(&self.db).await? else {
            return Err(AppError::not_found("用户不存在"));
        };
        if nickname.is_none() && avatar.is_none() {
            return Ok(user.into());
        }

        let mut active: user::ActiveModel = user.into();
        if let Some(nickname) = nickname {
            active.nickname = Set(nickname.to_string());
        }
        if let Some(avatar) = avatar.map(str::trim) {
            active.avatar = Set((!avatar.is_empty()).then(|| avatar.to_string()));
        }

        let user = active.update(&self.db).await?;
        info!(user_id, "profile updated");
        Ok(user.into())
    }

    async fn find_by_phone(&self, phone: &str) -> AppResult<Option<user::Model>> {
        Ok(user::Entity::find().filter(user::Column::Phone.eq(phone)).one(&self.db).await?)
    }

    fn session_for(&self, user: user::Model) -> AppResult<AuthSession> {
        let issued = self.tokens.issue(user.id)?;
        Ok(AuthSession { user: user.into(), token: issued.token, expires_at: issued.expires_at })
    }
}

fn required_credentials<'a>(
    phone: Option<&'a str>,
    password: Option<&'a str>,
) -> AppResult<(&'a str, &'a str)> {
    let phone = phone.map(str::trim).filter(|p| !p.is_empty());
    let password = password.filter(|p| !p.is_empty());
    match (phone, password) {
        (Some(phone), Some(password)) => Ok((phone, password)),
        _ => Err(AppError::validation("手机号和密码不能为空")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_trimmed_and_required() {
        assert_eq!(required_credentials(Some(" 138 "), Some("pw")).unwrap(), ("138", "pw"));
        assert!(required_credentials(None, Some("pw")).is_err());
        assert!(required_credentials(Some("138"), None).is_err());
        assert!(required_credentials(Some("   "), Some("pw")).is_err());
        assert!(required_credentials(Some("138"), Some("")).is_err());
    }
}
