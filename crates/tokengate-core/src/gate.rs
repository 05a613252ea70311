//! 요청 경계 인증 게이트.
//!
//! 요청마다 독립적으로 평가되며 요청 간 상태나 캐시는 없습니다.
//!
//! 1. 라우트가 열려 있으면 신원 없이 허용
//! 2. Authorization 헤더가 없으면 `MissingCredential`
//! 3. `<scheme> <token>` 형식이 아니면 `MalformedCredential`
//! 4. 토큰 검증 실패는 해당 종류로 거부
//! 5. 역할 불일치는 `InsufficientRole`
//! 6. 통과하면 신원을 붙여 허용

use chrono::{DateTime, Utc};

use crate::error::AuthError;
use crate::identity::{authorize, Identity};
use crate::jwt::{TokenVerifier, TOKEN_TYPE};
use crate::roles::RequiredRoles;

/// 게이트 평가 결과.
#[derive(Debug)]
pub enum GateDecision {
    /// 허용. 열린 라우트에서는 신원이 없습니다.
    Allowed(Option<Identity>),
    /// 거부
    Rejected(AuthError),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }

    pub fn into_result(self) -> Result<Option<Identity>, AuthError> {
        match self {
            Self::Allowed(identity) => Ok(identity),
            Self::Rejected(err) => Err(err),
        }
    }
}

/// Authorization 헤더에서 Bearer 토큰 추출.
///
/// 두 번째 공백 구분 필드를 토큰으로 사용합니다.
/// scheme은 `Bearer`여야 하며 대소문자는 무시합니다.
pub fn parse_authorization(header: &str) -> Result<&str, AuthError> {
    let mut fields = header.split(' ');
    let scheme = fields.next().unwrap_or_default();
    let token = fields.next().unwrap_or_default();

    if !scheme.eq_ignore_ascii_case(TOKEN_TYPE) || token.is_empty() || fields.next().is_some() {
        return Err(AuthError::MalformedCredential);
    }

    Ok(token)
}

/// 인증 게이트.
#[derive(Clone)]
pub struct AuthenticationGate {
    verifier: TokenVerifier,
}

impl AuthenticationGate {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }

    /// 현재 시각 기준 평가.
    pub fn evaluate(&self, authorization: Option<&str>, required: &RequiredRoles) -> GateDecision {
        self.evaluate_at(authorization, required, Utc::now())
    }

    /// 지정한 시각 기준 평가.
    pub fn evaluate_at(
        &self,
        authorization: Option<&str>,
        required: &RequiredRoles,
        now: DateTime<Utc>,
    ) -> GateDecision {
        if required.is_open() {
            return GateDecision::Allowed(None);
        }

        match self.check(authorization, required, now) {
            Ok(identity) => GateDecision::Allowed(Some(identity)),
            Err(err) => {
                tracing::debug!(code = err.error_code(), required = %required, "Request rejected");
                GateDecision::Rejected(err)
            }
        }
    }

    fn check(
        &self,
        authorization: Option<&str>,
        required: &RequiredRoles,
        now: DateTime<Utc>,
    ) -> Result<Identity, AuthError> {
        let header = authorization.ok_or(AuthError::MissingCredential)?;
        let token = parse_authorization(header)?;
        let identity = self.verifier.verify_at(token, now)?;

        let decision = authorize(Some(&identity), required);
        if !decision.granted {
            tracing::info!(
                subject = %identity.subject,
                roles = %identity.roles,
                required = %required,
                "Insufficient role"
            );
            return Err(AuthError::InsufficientRole);
        }

        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::jwt::TokenIssuer;
    use crate::roles::{Role, RoleSet};
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn setup() -> (TokenIssuer, AuthenticationGate) {
        let config = Arc::new(AuthConfig::development());
        (
            TokenIssuer::new(config.clone()),
            AuthenticationGate::new(TokenVerifier::new(config)),
        )
    }

    fn bearer(roles: &[Role]) -> (String, DateTime<Utc>) {
        let (issuer, _) = setup();
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let identity = Identity::new("alice", roles.iter().copied().collect::<RoleSet>());
        let grant = issuer.issue_at(&identity, now).unwrap();
        (format!("Bearer {}", grant.access_token), now)
    }

    fn admin_only() -> RequiredRoles {
        RequiredRoles::any_of([Role::Admin])
    }

    #[test]
    fn test_parse_authorization() {
        assert_eq!(parse_authorization("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert_eq!(parse_authorization("bearer abc").unwrap(), "abc");

        for header in ["Bearer ", "Bearer", "", "abc.def.ghi", "Basic abc", "Bearer a b"] {
            assert!(
                matches!(parse_authorization(header), Err(AuthError::MalformedCredential)),
                "{header:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_open_route_passes_without_header() {
        let (_, gate) = setup();
        let decision = gate.evaluate(None, &RequiredRoles::anyone());
        assert!(matches!(decision, GateDecision::Allowed(None)));
    }

    #[test]
    fn test_open_route_ignores_garbage_header() {
        let (_, gate) = setup();
        let decision = gate.evaluate(Some("garbage"), &RequiredRoles::anyone());
        assert!(matches!(decision, GateDecision::Allowed(None)));
    }

    #[test]
    fn test_missing_header() {
        let (_, gate) = setup();
        let decision = gate.evaluate(None, &admin_only());
        assert!(matches!(decision, GateDecision::Rejected(AuthError::MissingCredential)));
    }

    #[test]
    fn test_empty_bearer_token() {
        let (_, gate) = setup();
        let decision = gate.evaluate(Some("Bearer "), &admin_only());
        assert!(matches!(decision, GateDecision::Rejected(AuthError::MalformedCredential)));
    }

    #[test]
    fn test_insufficient_role() {
        let (_, gate) = setup();
        let (header, now) = bearer(&[Role::User]);

        let decision = gate.evaluate_at(Some(&header), &admin_only(), now);
        assert!(matches!(decision, GateDecision::Rejected(AuthError::InsufficientRole)));
    }

    #[test]
    fn test_allowed_attaches_identity() {
        let (_, gate) = setup();
        let (header, now) = bearer(&[Role::User, Role::Admin]);

        let identity = gate
            .evaluate_at(Some(&header), &admin_only(), now)
            .into_result()
            .unwrap()
            .unwrap();
        assert_eq!(identity.subject, "alice");
        assert!(identity.has_role(Role::Admin));
    }

    #[test]
    fn test_expired_token() {
        let (_, gate) = setup();
        let (header, now) = bearer(&[Role::Admin]);

        let decision = gate.evaluate_at(Some(&header), &admin_only(), now + Duration::minutes(31));
        assert!(matches!(decision, GateDecision::Rejected(AuthError::ExpiredToken)));
    }

    #[test]
    fn test_verifier_failure_precedes_authorization() {
        let (_, gate) = setup();
        let decision = gate.evaluate(Some("Bearer not-a-token"), &admin_only());
        assert!(matches!(decision, GateDecision::Rejected(AuthError::MalformedToken)));
    }
}
