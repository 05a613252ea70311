//! 라우트별 인증 게이트 미들웨어와 신원 추출기.
//!
//! 각 라우트 그룹은 요구 역할을 담은 `RouteGuard`를 상태로 갖는
//! `require_roles` 미들웨어로 보호됩니다. 통과한 요청에는 `Identity`가
//! request extension으로 붙고, 핸들러는 `Authenticated` 추출기로 꺼내 씁니다.
//!
//! ```rust,ignore
//! let guard = RouteGuard::new(state.gate.clone(), RequiredRoles::any_of([Role::Admin]));
//! Router::new()
//!     .route("/auth/users/{subject}", delete(delete_account))
//!     .route_layer(middleware::from_fn_with_state(guard, require_roles));
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::counter;
use tokengate_core::{AuthError, AuthenticationGate, GateDecision, Identity, RequiredRoles};

use crate::error::ApiError;

/// 라우트 그룹의 게이트와 요구 역할.
#[derive(Clone)]
pub struct RouteGuard {
    gate: AuthenticationGate,
    required: Arc<RequiredRoles>,
}

impl RouteGuard {
    pub fn new(gate: AuthenticationGate, required: RequiredRoles) -> Self {
        Self {
            gate,
            required: Arc::new(required),
        }
    }

    pub fn required(&self) -> &RequiredRoles {
        &self.required
    }
}

/// 요구 역할을 검사하는 미들웨어.
///
/// CORS preflight(`OPTIONS`)는 검사 없이 통과합니다.
pub async fn require_roles(
    State(guard): State<RouteGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    // ASCII가 아닌 헤더 값은 빈 값으로 보고 형식 오류로 처리
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default().to_owned());

    match guard.gate.evaluate(authorization.as_deref(), guard.required()) {
        GateDecision::Allowed(identity) => {
            counter!("auth_gate_decisions_total", "outcome" => "allowed").increment(1);
            if let Some(identity) = identity {
                request.extensions_mut().insert(identity);
            }
            next.run(request).await
        }
        GateDecision::Rejected(err) => {
            counter!(
                "auth_gate_decisions_total",
                "outcome" => "rejected",
                "code" => err.error_code()
            )
            .increment(1);

            if err.is_token_failure() {
                tracing::info!(
                    path = %request.uri().path(),
                    code = err.error_code(),
                    "Token rejected"
                );
            }

            ApiError(err).into_response()
        }
    }
}

/// 게이트를 통과한 요청의 신원.
///
/// 열린 라우트처럼 신원이 붙지 않은 요청에서는 `MissingCredential`로 거부합니다.
///
/// ```rust,ignore
/// async fn me(Authenticated(identity): Authenticated) -> impl IntoResponse {
///     identity.subject
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(Authenticated)
            .ok_or(ApiError(AuthError::MissingCredential))
    }
}

/// 신원이 있으면 꺼내고 없으면 `None`.
#[derive(Debug, Clone)]
pub struct MaybeAuthenticated(pub Option<Identity>);

impl<S> FromRequestParts<S> for MaybeAuthenticated
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthenticated(parts.extensions.get::<Identity>().cloned()))
    }
}
