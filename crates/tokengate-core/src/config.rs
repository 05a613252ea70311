//! 인증 설정.
//!
//! 서명 키, 발급자 이름, 토큰 유효 기간을 시작 시 한 번 로드합니다.
//! 로드된 설정은 변경되지 않으며 `Arc`로 공유됩니다.
//!
//! # 환경 변수
//!
//! - `DEPLOYED`: 설정되어 있으면 아래 값을 환경에서 읽습니다 (모두 필수)
//! - `SECRET_KEY`: HMAC 서명 키 (32바이트 이상)
//! - `ISSUER`: 토큰 발급자 이름
//! - `TOKEN_EXPIRE_TIME`: 토큰 유효 기간 (밀리초)
//!
//! `DEPLOYED`가 없으면 개발용 기본값을 사용합니다.
//! 개발용 서명 키는 공개된 값이므로 운영 환경에서는 반드시 `DEPLOYED`를 설정해야 합니다.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::{AuthError, AuthResult};

/// 개발 환경 기본 서명 키.
const DEVELOPMENT_SECRET: &str = "development-secret-key-change-in-production";

/// 개발 환경 기본 발급자.
pub const DEFAULT_ISSUER: &str = "tokengate-dev";

/// 기본 토큰 유효 기간 (30분).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// 최대 토큰 유효 기간 (365일).
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// HS256 최소 키 길이 (바이트).
pub const MIN_SECRET_LEN: usize = 32;

/// 배포 모드.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    /// 개발용 고정 기본값
    Development,
    /// 환경 변수에서 로드
    Deployed,
}

/// 인증 설정.
#[derive(Debug)]
pub struct AuthConfig {
    secret: SecretString,
    /// 토큰 발급자 (`iss` 클레임)
    pub issuer: String,
    /// 토큰 유효 기간
    pub token_ttl: Duration,
    /// 설정 출처
    pub mode: DeploymentMode,
}

impl AuthConfig {
    /// 명시적 값으로 설정 생성.
    ///
    /// # Errors
    ///
    /// 키가 32바이트 미만이거나 발급자가 비어 있으면 `Config`,
    /// 유효 기간이 1초 미만이거나 `MAX_TOKEN_TTL`을 넘으면 `InvalidTtl`.
    pub fn new(
        secret: impl Into<String>,
        issuer: impl Into<String>,
        token_ttl: Duration,
    ) -> AuthResult<Self> {
        let secret = secret.into();
        let issuer = issuer.into();

        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::Config(format!(
                "SECRET_KEY must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        if issuer.trim().is_empty() {
            return Err(AuthError::Config("ISSUER must not be empty".to_string()));
        }
        let ttl_secs = i64::try_from(token_ttl.as_secs()).map_err(|_| AuthError::InvalidTtl)?;
        if ttl_secs == 0 || token_ttl > MAX_TOKEN_TTL {
            return Err(AuthError::InvalidTtl);
        }

        Ok(Self {
            secret: SecretString::from(secret),
            issuer,
            token_ttl,
            mode: DeploymentMode::Deployed,
        })
    }

    /// 개발용 기본 설정.
    pub fn development() -> Self {
        Self {
            secret: SecretString::from(DEVELOPMENT_SECRET.to_string()),
            issuer: DEFAULT_ISSUER.to_string(),
            token_ttl: DEFAULT_TOKEN_TTL,
            mode: DeploymentMode::Development,
        }
    }

    /// 프로세스 환경 변수에서 설정을 로드합니다.
    ///
    /// `.env` 로드는 바이너리 시작 시 한 번 수행됩니다.
    pub fn from_env() -> AuthResult<Self> {
        let source = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .map_err(|e| AuthError::Config(e.to_string()))?;

        Self::from_source(&source)
    }

    /// 설정 소스에서 로드합니다. 키는 소문자입니다 (`deployed`, `secret_key` 등).
    pub fn from_source(source: &config::Config) -> AuthResult<Self> {
        if source.get_string("deployed").is_err() {
            tracing::warn!(
                issuer = DEFAULT_ISSUER,
                "DEPLOYED not set, using development signing secret"
            );
            return Ok(Self::development());
        }

        let secret = required(source, "secret_key")?;
        let issuer = required(source, "issuer")?;
        let ttl_ms: u64 = required(source, "token_expire_time")?
            .trim()
            .parse()
            .map_err(|_| {
                AuthError::Config("TOKEN_EXPIRE_TIME must be milliseconds".to_string())
            })?;

        let config = Self::new(secret, issuer, Duration::from_millis(ttl_ms))?;
        tracing::info!(
            issuer = %config.issuer,
            ttl_secs = config.token_ttl.as_secs(),
            "Auth configuration loaded from environment"
        );

        Ok(config)
    }

    /// 서명 키 바이트.
    pub fn secret_bytes(&self) -> &[u8] {
        self.secret.expose_secret().as_bytes()
    }

    /// 유효 기간 (초).
    ///
    /// 생성 시 `MAX_TOKEN_TTL` 이하로 검증되어 i64 범위를 넘지 않습니다.
    pub fn ttl_secs(&self) -> i64 {
        i64::try_from(self.token_ttl.as_secs()).unwrap_or(i64::MAX)
    }
}

fn required(source: &config::Config, key: &str) -> AuthResult<String> {
    source
        .get_string(key)
        .map_err(|_| AuthError::Config(format!("{} is required when DEPLOYED is set", key.to_uppercase())))
}
