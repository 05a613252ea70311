//! API 에러 응답.
//!
//! 핵심 크레이트의 `AuthError`를 HTTP 응답으로 변환합니다.
//! 상태 코드와 에러 코드는 `AuthError`의 분류를 그대로 따릅니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tokengate_core::AuthError;

/// API 에러 응답 본문.
///
/// ```json
/// { "code": "INSUFFICIENT_ROLE", "message": "권한이 부족합니다", "timestamp": 1738300800 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "TOKEN_EXPIRED", "INVALID_CREDENTIALS")
    pub code: String,
    /// 사람이 읽을 수 있는 메시지
    pub message: String,
    /// 발생 시각 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// 핸들러와 미들웨어가 반환하는 에러.
#[derive(Debug)]
pub struct ApiError(pub AuthError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, code = self.0.error_code(), "Request failed");
        }

        let body = ApiErrorResponse::new(self.0.error_code(), self.0.public_message());
        (status, Json(body)).into_response()
    }
}

/// API 핸들러 Result 타입.
pub type ApiResult<T> = Result<T, ApiError>;
