//! 애플리케이션 상태.
//!
//! 핸들러 간 공유되는 인증 서비스와 게이트를 담습니다.
//! 모든 구성 요소는 불변이거나 내부적으로 동기화되어 있어 `Arc`로 공유합니다.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokengate_core::{
    AuthConfig, AuthResult, AuthService, AuthenticationGate, CredentialStore, PasswordHasher,
    TokenIssuer, TokenVerifier,
};

/// 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 가입/로그인/계정 관리
    pub service: AuthService,
    /// 요청 경계 인증
    pub gate: AuthenticationGate,
    /// 서버 시작 시각
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// 기본 Argon2 파라미터로 상태 생성.
    pub fn new(config: Arc<AuthConfig>, store: Arc<dyn CredentialStore>) -> AuthResult<Self> {
        Self::with_hasher(config, store, PasswordHasher::default())
    }

    /// 해시 파라미터를 지정해 상태 생성.
    pub fn with_hasher(
        config: Arc<AuthConfig>,
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
    ) -> AuthResult<Self> {
        let issuer = TokenIssuer::new(config.clone());
        let gate = AuthenticationGate::new(TokenVerifier::new(config));

        Ok(Self {
            service: AuthService::new(store, hasher, issuer)?,
            gate,
            started_at: Utc::now(),
        })
    }

    /// 서버 업타임 (초).
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
