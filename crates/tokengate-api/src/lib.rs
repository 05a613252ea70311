//! # Tokengate API
//!
//! `tokengate-core`의 인증 게이트를 axum 라우터에 연결합니다.
//!
//! - `middleware`: 라우트별 요구 역할 게이트와 신원 추출기
//! - `routes`: 가입, 로그인, 비밀번호 재설정, 사용자 관리 endpoint
//! - `error`: `AuthError`의 HTTP 응답 변환

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use routes::create_router;
pub use state::AppState;
