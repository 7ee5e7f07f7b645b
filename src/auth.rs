use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::now_sec,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Per-token id; two logins in the same second still get distinct tokens.
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

/// Signs and verifies HS256 session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds: ttl_hours.max(1) * 3600,
        }
    }

    pub fn issue(&self, user_id: i32) -> AppResult<IssuedToken> {
        let iat = now_sec();
        let exp = iat + self.ttl_seconds;
        let claims = Claims {
            sub: user_id.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat,
            exp,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;
        Ok(IssuedToken { token, expires_at: exp })
    }

    /// Returns the user id carried by a valid, unexpired token.
    pub fn verify(&self, token: &str) -> AppResult<i32> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            tracing::debug!(error = %e, "rejected session token");
            AppError::Auth("登录已过期，请重新登录".to_string())
        })?;
        data.claims
            .sub
            .parse()
            .map_err(|_| AppError::Auth("登录已过期，请重新登录".to_string()))
    }
}

/// Runs on the blocking pool.
pub async fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await?
        .map_err(|e| AppError::Internal(anyhow::Error::new(e)))
}

pub async fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await?
        .map_err(|e| AppError::Internal(anyhow::Error::new(e)))
}

/// Caller identity taken from `Authorization: Bearer <token>`.
#[derive(Clone, Copy, Debug)]
pub struct AuthUser {
    pub user_id: i32,
}

impl AuthUser {
    /// Fails unless the token belongs to `user_id`.
    pub fn ensure_is(&self, user_id: i32) -> AppResult<()> {
        if self.user_id != user_id {
            tracing::warn!(caller = self.user_id, target = user_id, "cross-user request rejected");
            return Err(AppError::forbidden("无权操作其他用户的数据"));
        }
        Ok(())
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Auth("请先登录".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Auth("请先登录".to_string()))?;

        let user_id = state.tokens.verify(token)?;
        Ok(Self { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_to_user_id() {
        let issuer = TokenIssuer::new("test-secret", 1);
        let issued = issuer.issue(42).unwrap();
        assert_eq!(issuer.verify(&issued.token).unwrap(), 42);
        assert!(issued.expires_at > now_sec());
    }

    #[test]
    fn tokens_are_unique_per_issue() {
        let issuer = TokenIssuer::new("test-secret", 1);
        let a = issuer.issue(1).unwrap();
        let b = issuer.issue(1).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let issued = TokenIssuer::new("secret-a", 1).issue(7).unwrap();
        let err = TokenIssuer::new("secret-b", 1).verify(&issued.token).unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = TokenIssuer::new("test-secret", 1);
        let claims = Claims {
            sub: "7".to_string(),
            jti: "old".to_string(),
            iat: now_sec() - 7200,
            exp: now_sec() - 3600,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test-secret"))
            .unwrap();
        assert!(matches!(issuer.verify(&token), Err(AppError::Auth(_))));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let issuer = TokenIssuer::new("test-secret", 1);
        assert!(matches!(issuer.verify("token_1_1700000000"), Err(AppError::Auth(_))));
    }

    #[tokio::test]
    async fn password_hash_round_trip() {
        let hash = hash_password("Aa123456", 4).await.unwrap();
        assert_ne!(hash, "Aa123456");
        assert!(verify_password("Aa123456", &hash).await.unwrap());
        assert!(!verify_password("wrong", &hash).await.unwrap());
    }
}
