//! # Tokengate Core
//!
//! 토큰 기반 인증과 역할 기반 접근 제어의 핵심 로직을 제공합니다.
//!
//! - 비밀번호 해싱 (Argon2id)
//! - 서명된 액세스 토큰 발급 및 검증 (HS256)
//! - 역할 집합과 인가 판정
//! - 요청 경계 인증 게이트
//! - 자격증명 저장소 인터페이스와 인증 서비스
//!
//! HTTP 프레임워크에 의존하지 않으며, 라우팅 통합은 `tokengate-api`가 담당합니다.

pub mod config;
pub mod error;
pub mod gate;
pub mod identity;
pub mod jwt;
pub mod logging;
pub mod password;
pub mod roles;
pub mod service;
pub mod store;

pub use config::{AuthConfig, DeploymentMode, MAX_TOKEN_TTL};
pub use error::{AuthError, AuthResult, CredentialError, PasswordError};
pub use gate::{parse_authorization, AuthenticationGate, GateDecision};
pub use identity::{authorize, AuthorizationDecision, DecisionReason, Identity};
pub use jwt::{Claims, TokenGrant, TokenIssuer, TokenVerifier, TOKEN_TYPE};
pub use logging::{init_logging, init_logging_from_env, LogConfig, LogFormat};
pub use password::{PasswordDigest, PasswordHasher};
pub use roles::{RequiredRoles, Role, RoleSet, ANYONE};
pub use service::AuthService;
pub use store::{CredentialStore, InMemoryCredentialStore, StoredCredential};
