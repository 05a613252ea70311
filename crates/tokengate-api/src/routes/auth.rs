//! 인증 endpoint.
//!
//! - `POST /auth/register`, `POST /auth/login`: 토큰 발급 (누구나)
//! - `POST /auth/reset-password`: 현재 비밀번호 확인 후 변경 (누구나)
//! - `POST /auth/reset-request`: 재설정 요청 기록 (누구나)
//! - `GET /auth/me`: 토큰의 신원 조회 (역할 보유자)
//! - `POST /auth/users/{subject}/roles`, `DELETE /auth/users/{subject}`: 관리자 전용

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tokengate_core::{Identity, Role, TokenGrant};

use crate::error::ApiResult;
use crate::middleware::Authenticated;
use crate::state::AppState;

/// 가입/로그인 요청.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub subject: String,
    pub password: String,
}

/// 비밀번호 변경 요청.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub subject: String,
    pub current_password: String,
    pub new_password: String,
}

/// 재설정 요청.
#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub subject: String,
}

/// 역할 부여 요청.
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    /// 역할 이름 (대소문자 무시)
    pub role: String,
}

/// 신원 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityResponse {
    pub subject: String,
    pub roles: Vec<String>,
}

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self {
            roles: identity.roles.iter().map(|r| r.as_str().to_string()).collect(),
            subject: identity.subject,
        }
    }
}

/// 요청 접수 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptedResponse {
    pub status: String,
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<(StatusCode, Json<TokenGrant>)> {
    let grant = state.service.register(&req.subject, &req.password).await?;
    Ok((StatusCode::CREATED, Json(grant)))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<Json<TokenGrant>> {
    let grant = state.service.login(&req.subject, &req.password).await?;
    Ok(Json(grant))
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<TokenGrant>> {
    let grant = state
        .service
        .reset_password(&req.subject, &req.current_password, &req.new_password)
        .await?;
    Ok(Json(grant))
}

/// POST /auth/reset-request
///
/// 사용자 존재 여부와 관계없이 같은 응답을 반환합니다.
pub async fn request_reset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetRequest>,
) -> ApiResult<(StatusCode, Json<AcceptedResponse>)> {
    state.service.request_password_reset(&req.subject).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            status: "accepted".to_string(),
        }),
    ))
}

/// GET /auth/me
pub async fn me(Authenticated(identity): Authenticated) -> Json<IdentityResponse> {
    Json(identity.into())
}

/// POST /auth/users/{subject}/roles
pub async fn assign_role(
    State(state): State<Arc<AppState>>,
    Authenticated(admin): Authenticated,
    Path(subject): Path<String>,
    Json(req): Json<AssignRoleRequest>,
) -> ApiResult<Json<IdentityResponse>> {
    let role: Role = req.role.parse()?;
    let identity = state.service.assign_role(&subject, role).await?;

    tracing::info!(admin = %admin.subject, subject = %subject, role = %role, "Role granted by admin");
    Ok(Json(identity.into()))
}

/// DELETE /auth/users/{subject}
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Authenticated(admin): Authenticated,
    Path(subject): Path<String>,
) -> ApiResult<StatusCode> {
    state.service.delete_account(&subject).await?;

    tracing::info!(admin = %admin.subject, subject = %subject, "Account deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}
