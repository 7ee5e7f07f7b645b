use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::models::ApiResponse;

pub const GENERIC_FAILURE: &str = "服务器内部错误";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("upstream returned {status}")]
    BadGateway { status: u16 },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Http(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// Message shown to the caller. Server-side failures are logged and
    /// collapsed into a generic message.
    fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::Auth(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::BadGateway { status } => format!("视频服务器返回错误: {status}"),
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                GENERIC_FAILURE.to_string()
            },
            AppError::Http(e) => {
                tracing::error!(error = %e, "outbound http error");
                GENERIC_FAILURE.to_string()
            },
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                GENERIC_FAILURE.to_string()
            },
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection, "rejected path parameters");
        Self::Validation("参数格式错误".to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(error = %rejection, "rejected query string");
        Self::Validation("查询参数格式错误".to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "rejected json body");
        Self::Validation("请求体格式错误".to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ApiResponse::<()>::failure(self.public_message());
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn response_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn validation_and_conflict_return_400() {
        assert_eq!(response_status(AppError::validation("missing")), StatusCode::BAD_REQUEST);
        assert_eq!(
            response_status(AppError::Conflict("该手机号已注册".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn auth_returns_401() {
        assert_eq!(response_status(AppError::Auth("密码错误".into())), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn forbidden_returns_403() {
        assert_eq!(response_status(AppError::forbidden("nope")), StatusCode::FORBIDDEN);
    }

    #[test]
    fn not_found_returns_404() {
        assert_eq!(response_status(AppError::not_found("电影不存在")), StatusCode::NOT_FOUND);
    }

    #[test]
    fn bad_gateway_returns_502() {
        assert_eq!(response_status(AppError::BadGateway { status: 403 }), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn internal_hides_details() {
        let err = AppError::Internal(anyhow::anyhow!("connection refused on 10.0.0.3"));
        assert_eq!(err.public_message(), GENERIC_FAILURE);
        assert_eq!(response_status(err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn database_error_is_500() {
        let err = AppError::from(sea_orm::DbErr::Custom("boom".into()));
        assert_eq!(response_status(err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn client_errors_keep_their_message() {
        let err = AppError::forbidden("无权删除此评论或评论不存在");
        assert_eq!(err.public_message(), "无权删除此评论或评论不存在");
    }
}
