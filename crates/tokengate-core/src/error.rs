//! 인증/인가 에러 타입.
//!
//! 요청 단위 거부 사유(`AuthError`)와 자격증명 저장소 에러(`CredentialError`),
//! 비밀번호 해시 에러(`PasswordError`)를 정의합니다.
//! 모든 에러는 현재 요청에 대해 종결적이며 내부에서 재시도하지 않습니다.

use thiserror::Error;

/// 비밀번호 해싱 에러.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("비밀번호 해싱 실패")]
    HashingFailed,
    /// 저장된 해시가 PHC 형식이 아님 (저장 데이터 손상)
    #[error("잘못된 해시 형식")]
    InvalidHashFormat,
}

/// 자격증명 저장소 에러.
///
/// `NotFound`와 `WrongPassword`는 내부적으로 구분되지만
/// 외부 응답에서는 같은 메시지로 노출됩니다 (사용자 열거 방지).
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("잘못된 자격증명")]
    NotFound,
    #[error("잘못된 자격증명")]
    WrongPassword,
    #[error("이미 존재하는 사용자입니다")]
    AlreadyExists,
    #[error("자격증명 저장소 에러: {0}")]
    Storage(String),
}

/// 인증/인가 에러.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("인증 헤더가 없습니다")]
    MissingCredential,
    #[error("잘못된 Authorization 헤더 형식")]
    MalformedCredential,
    #[error("잘못된 토큰 형식")]
    MalformedToken,
    #[error("토큰 서명이 유효하지 않습니다")]
    InvalidSignature,
    #[error("토큰이 만료되었습니다")]
    ExpiredToken,
    #[error("권한이 부족합니다")]
    InsufficientRole,

    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// 저장된 해시 손상. 잘못된 비밀번호와 구분되는 데이터 무결성 오류.
    #[error("자격증명 데이터 무결성 오류")]
    Hashing(#[from] PasswordError),

    #[error("알 수 없는 역할: {0}")]
    InvalidRole(String),
    #[error("토큰 유효 기간은 1초 이상이어야 합니다")]
    InvalidTtl,
    #[error("토큰 발급 대상이 유효하지 않습니다: {0}")]
    InvalidIdentity(String),
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    #[error("설정 에러: {0}")]
    Config(String),
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 인증 작업을 위한 Result 타입.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// HTTP 상태 코드 분류.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingCredential | Self::MalformedCredential | Self::InsufficientRole => 403,
            Self::MalformedToken | Self::InvalidSignature | Self::ExpiredToken => 401,
            Self::Credential(CredentialError::NotFound | CredentialError::WrongPassword) => 401,
            Self::Credential(CredentialError::AlreadyExists) => 422,
            Self::InvalidRole(_)
            | Self::InvalidTtl
            | Self::InvalidIdentity(_)
            | Self::InvalidInput(_) => 400,
            Self::Credential(CredentialError::Storage(_))
            | Self::Hashing(_)
            | Self::Config(_)
            | Self::Internal(_) => 500,
        }
    }

    /// API 응답용 에러 코드.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::MalformedCredential => "MALFORMED_CREDENTIAL",
            Self::MalformedToken => "MALFORMED_TOKEN",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::ExpiredToken => "TOKEN_EXPIRED",
            Self::InsufficientRole => "INSUFFICIENT_ROLE",
            Self::Credential(CredentialError::NotFound | CredentialError::WrongPassword) => {
                "INVALID_CREDENTIALS"
            }
            Self::Credential(CredentialError::AlreadyExists) => "ALREADY_EXISTS",
            Self::Credential(CredentialError::Storage(_)) => "STORAGE_ERROR",
            Self::Hashing(_) => "CREDENTIAL_INTEGRITY",
            Self::InvalidRole(_) => "INVALID_ROLE",
            Self::InvalidTtl => "INVALID_TTL",
            Self::InvalidIdentity(_) => "INVALID_IDENTITY",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Config(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 외부에 노출할 메시지.
    ///
    /// 서버 측 에러는 내부 상세를 숨깁니다.
    pub fn public_message(&self) -> String {
        match self {
            Self::Credential(CredentialError::Storage(_)) | Self::Config(_) | Self::Internal(_) => {
                "내부 서버 에러".to_string()
            }
            other => other.to_string(),
        }
    }

    /// 토큰 검증 단계에서 발생한 거부인지 확인.
    pub fn is_token_failure(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken | Self::InvalidSignature | Self::ExpiredToken
        )
    }
}
