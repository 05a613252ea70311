//! JWT 토큰 발급 및 검증.
//!
//! 토큰은 `header.payload.signature` 형식이며 각 구간은 base64url(패딩 없음)입니다.
//! 서명은 `header.payload` 문자열에 대한 HMAC-SHA256입니다.
//!
//! 검증은 다음 순서로 수행되며 어느 단계든 실패하면 거부합니다:
//! 1. 구조 파싱 (`MalformedToken`)
//! 2. 서명 재계산 및 상수 시간 비교 (`InvalidSignature`)
//! 3. 만료 확인, `exp <= now`이면 만료 (`ExpiredToken`)
//! 4. 클레임에서 신원 추출
//!
//! 검증 중 저장소 조회는 없습니다. 역할은 발급 시점의 값이 그대로 사용됩니다.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::identity::Identity;
use crate::roles::RoleSet;

type HmacSha256 = Hmac<Sha256>;

/// 응답에 쓰이는 토큰 타입.
pub const TOKEN_TYPE: &str = "Bearer";

/// JWT 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 사용자 식별자
    pub sub: String,
    /// Issuer - 발급자
    pub iss: String,
    /// 역할 (쉼표로 연결된 문자열)
    pub roles: RoleSet,
    /// Issued At (Unix timestamp, 초)
    pub iat: i64,
    /// Expiration (Unix timestamp, 초)
    pub exp: i64,
    /// JWT ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    /// 주어진 시각 기준 만료 여부.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    /// 클레임에서 신원 추출.
    pub fn identity(&self) -> Identity {
        Identity::new(self.sub.clone(), self.roles.clone())
    }
}

/// 발급된 토큰.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    /// 서명된 토큰 문자열
    pub access_token: String,
    /// 토큰 타입 (항상 "Bearer")
    pub token_type: String,
    /// 유효 기간 (초)
    pub expires_in: i64,
    /// 토큰 대상
    pub subject: String,
}

/// 토큰 발급기.
///
/// 상태가 없으며 변경되지 않는 설정만 읽습니다.
#[derive(Clone)]
pub struct TokenIssuer {
    config: Arc<AuthConfig>,
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        let key = EncodingKey::from_secret(config.secret_bytes());
        Self { config, key }
    }

    /// 현재 시각으로 토큰 발급.
    pub fn issue(&self, identity: &Identity) -> AuthResult<TokenGrant> {
        self.issue_at(identity, Utc::now())
    }

    /// 지정한 시각으로 토큰 발급.
    ///
    /// 발급 시각은 초 단위로 절삭되며 `exp = iat + ttl`입니다.
    ///
    /// # Errors
    ///
    /// subject가 비어 있거나 역할 집합이 비어 있으면 `InvalidIdentity`.
    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> AuthResult<TokenGrant> {
        if identity.subject.trim().is_empty() {
            return Err(AuthError::InvalidIdentity("empty subject".to_string()));
        }
        if identity.roles.is_empty() {
            return Err(AuthError::InvalidIdentity(format!(
                "{} has no roles",
                identity.subject
            )));
        }

        let ttl = self.config.ttl_secs();
        let iat = now.timestamp();
        let exp = iat.checked_add(ttl).ok_or(AuthError::InvalidTtl)?;
        let claims = Claims {
            sub: identity.subject.clone(),
            iss: self.config.issuer.clone(),
            roles: identity.roles.clone(),
            iat,
            exp,
            jti: Some(uuid::Uuid::new_v4().to_string()),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| AuthError::Internal(format!("token encoding failed: {}", e)))?;

        tracing::debug!(
            subject = %claims.sub,
            roles = %claims.roles,
            exp = claims.exp,
            "Token issued"
        );

        Ok(TokenGrant {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: ttl,
            subject: claims.sub,
        })
    }
}

/// 토큰 검증기.
#[derive(Clone)]
pub struct TokenVerifier {
    config: Arc<AuthConfig>,
}

impl TokenVerifier {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self { config }
    }

    /// 현재 시각 기준 검증.
    pub fn verify(&self, token: &str) -> AuthResult<Identity> {
        self.verify_at(token, Utc::now())
    }

    /// 지정한 시각 기준 검증.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<Identity> {
        self.decode_at(token, now).map(|claims| claims.identity())
    }

    /// 지정한 시각 기준으로 검증하고 전체 클레임을 반환.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<Claims> {
        let (signing_input, signature) = split_token(token)?;

        self.verify_signature(signing_input, &signature)?;

        let header = jsonwebtoken::decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        if header.alg != Algorithm::HS256 {
            return Err(AuthError::MalformedToken);
        }

        let claims = decode_claims(signing_input)?;
        if claims.is_expired_at(now) {
            tracing::debug!(subject = %claims.sub, exp = claims.exp, "Token expired");
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims)
    }

    fn verify_signature(&self, signing_input: &str, signature: &[u8]) -> AuthResult<()> {
        let mut mac = HmacSha256::new_from_slice(self.config.secret_bytes())
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        mac.update(signing_input.as_bytes());

        // verify_slice는 상수 시간 비교
        mac.verify_slice(signature)
            .map_err(|_| AuthError::InvalidSignature)
    }
}

/// 토큰을 서명 대상(`header.payload`)과 서명 바이트로 분리.
fn split_token(token: &str) -> AuthResult<(&str, Vec<u8>)> {
    let (signing_input, signature) = token.rsplit_once('.').ok_or(AuthError::MalformedToken)?;
    let (header, payload) = signing_input
        .split_once('.')
        .ok_or(AuthError::MalformedToken)?;

    if header.is_empty() || payload.is_empty() || signature.is_empty() || payload.contains('.') {
        return Err(AuthError::MalformedToken);
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| AuthError::MalformedToken)?;

    Ok((signing_input, signature))
}

fn decode_claims(signing_input: &str) -> AuthResult<Claims> {
    let payload = signing_input
        .split_once('.')
        .map(|(_, payload)| payload)
        .ok_or(AuthError::MalformedToken)?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| AuthError::MalformedToken)?;

    serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::Role;
    use chrono::{Duration, TimeZone};
    use std::time::Duration as StdDuration;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn config(ttl_secs: u64) -> Arc<AuthConfig> {
        Arc::new(AuthConfig::new(TEST_SECRET, "test-issuer", StdDuration::from_secs(ttl_secs)).unwrap())
    }

    fn alice() -> Identity {
        Identity::new("alice", RoleSet::single(Role::User))
    }

    fn issued_at() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_issue_and_verify_token() {
        let config = config(60);
        let grant = TokenIssuer::new(config.clone()).issue(&alice()).unwrap();

        assert_eq!(grant.token_type, "Bearer");
        assert_eq!(grant.expires_in, 60);
        assert_eq!(grant.access_token.split('.').count(), 3);

        let identity = TokenVerifier::new(config).verify(&grant.access_token).unwrap();
        assert_eq!(identity, alice());
    }

    #[test]
    fn test_claims_on_the_wire() {
        let config = config(1800);
        let identity = Identity::new("bob", [Role::Admin, Role::User].into_iter().collect());
        let grant = TokenIssuer::new(config.clone())
            .issue_at(&identity, issued_at())
            .unwrap();

        let payload = grant.access_token.split('.').nth(1).unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();

        assert_eq!(json["sub"], "bob");
        assert_eq!(json["iss"], "test-issuer");
        assert_eq!(json["roles"], "user,admin");
        assert_eq!(json["iat"], 1_700_000_000);
        assert_eq!(json["exp"], 1_700_001_800);
    }

    #[test]
    fn test_expiry_boundary() {
        let config = config(60);
        let grant = TokenIssuer::new(config.clone())
            .issue_at(&alice(), issued_at())
            .unwrap();
        let verifier = TokenVerifier::new(config);

        assert!(verifier.verify_at(&grant.access_token, issued_at()).is_ok());
        assert!(verifier
            .verify_at(&grant.access_token, issued_at() + Duration::seconds(59))
            .is_ok());
        assert!(matches!(
            verifier.verify_at(&grant.access_token, issued_at() + Duration::seconds(60)),
            Err(AuthError::ExpiredToken)
        ));
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let grant = TokenIssuer::new(config(60)).issue(&alice()).unwrap();
        let other = Arc::new(
            AuthConfig::new(
                "wrong-secret-key-for-testing-minimum-32-chars",
                "test-issuer",
                StdDuration::from_secs(60),
            )
            .unwrap(),
        );

        assert!(matches!(
            TokenVerifier::new(other).verify(&grant.access_token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_signature_checked_before_expiry() {
        let config = config(60);
        let grant = TokenIssuer::new(config.clone())
            .issue_at(&alice(), issued_at())
            .unwrap();
        let (rest, _) = grant.access_token.rsplit_once('.').unwrap();
        let forged = format!("{}.{}", rest, URL_SAFE_NO_PAD.encode([0u8; 32]));

        // 만료된 시각이어도 서명 오류가 먼저
        let later = issued_at() + Duration::days(1);
        assert!(matches!(
            TokenVerifier::new(config).verify_at(&forged, later),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_malformed_structure() {
        let verifier = TokenVerifier::new(config(60));

        for token in ["", "abc", "a.b", "a.b.c.d", ".b.c", "a..c", "a.b.", "a.b.!!!"] {
            assert!(
                matches!(verifier.verify(token), Err(AuthError::MalformedToken)),
                "{token:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_forged_role_claim_is_rejected() {
        let config = config(60);
        let grant = TokenIssuer::new(config.clone()).issue(&alice()).unwrap();
        let mut parts: Vec<&str> = grant.access_token.split('.').collect();

        let payload = String::from_utf8(URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        let escalated = URL_SAFE_NO_PAD.encode(payload.replace("\"user\"", "\"user,admin\""));
        parts[1] = &escalated;

        assert!(matches!(
            TokenVerifier::new(config).verify(&parts.join(".")),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_issue_requires_subject_and_roles() {
        let issuer = TokenIssuer::new(config(60));

        let no_subject = Identity::new(" ", RoleSet::single(Role::User));
        assert!(matches!(issuer.issue(&no_subject), Err(AuthError::InvalidIdentity(_))));

        let no_roles = Identity::new("alice", RoleSet::new());
        assert!(matches!(issuer.issue(&no_roles), Err(AuthError::InvalidIdentity(_))));
    }
}
