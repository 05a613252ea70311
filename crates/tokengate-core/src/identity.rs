//! 검증된 신원과 인가 결정.

use serde::{Deserialize, Serialize};

use crate::roles::{RequiredRoles, Role, RoleSet};

/// 검증된 사용자 신원.
///
/// 요청 처리 중에는 읽기 전용으로만 사용됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// 사용자 식별자
    pub subject: String,
    /// 사용자 역할
    pub roles: RoleSet,
}

impl Identity {
    pub fn new(subject: impl Into<String>, roles: RoleSet) -> Self {
        Self {
            subject: subject.into(),
            roles,
        }
    }

    /// 특정 역할 보유 여부.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }
}

/// 인가 결정 사유.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    /// 라우트가 누구에게나 열려 있음
    OpenRoute,
    /// 요구 역할 중 하나와 일치
    RoleMatched(Role),
    /// 신원 없음
    Anonymous,
    /// 일치하는 역할 없음
    NoMatchingRole,
}

/// 인가 결정. 저장되지 않는 일회성 값입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationDecision {
    pub granted: bool,
    pub reason: DecisionReason,
}

impl AuthorizationDecision {
    fn grant(reason: DecisionReason) -> Self {
        Self {
            granted: true,
            reason,
        }
    }

    fn deny(reason: DecisionReason) -> Self {
        Self {
            granted: false,
            reason,
        }
    }
}

/// 인가 판정.
///
/// 열린 라우트는 익명 요청을 포함해 항상 허용합니다.
/// 그 외에는 신원의 역할과 요구 역할의 교집합이 비어있지 않으면 허용합니다 (OR).
/// 부수 효과가 없는 순수 함수입니다.
pub fn authorize(identity: Option<&Identity>, required: &RequiredRoles) -> AuthorizationDecision {
    let required = match required {
        RequiredRoles::Open => return AuthorizationDecision::grant(DecisionReason::OpenRoute),
        RequiredRoles::AnyOf(roles) => roles,
    };

    let Some(identity) = identity else {
        return AuthorizationDecision::deny(DecisionReason::Anonymous);
    };

    match identity.roles.first_shared(required) {
        Some(role) => AuthorizationDecision::grant(DecisionReason::RoleMatched(role)),
        None => AuthorizationDecision::deny(DecisionReason::NoMatchingRole),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(roles: &[Role]) -> Identity {
        Identity::new("alice", roles.iter().copied().collect())
    }

    #[test]
    fn test_open_route_grants_everyone() {
        let open = RequiredRoles::anyone();

        assert!(authorize(None, &open).granted);
        assert!(authorize(Some(&identity(&[])), &open).granted);
        assert!(authorize(Some(&identity(&[Role::Admin])), &open).granted);
        assert_eq!(authorize(None, &open).reason, DecisionReason::OpenRoute);
    }

    #[test]
    fn test_any_role_matches() {
        let required = RequiredRoles::any_of([Role::Instructor, Role::Admin]);

        let decision = authorize(Some(&identity(&[Role::User, Role::Instructor])), &required);
        assert!(decision.granted);
        assert_eq!(decision.reason, DecisionReason::RoleMatched(Role::Instructor));

        assert!(authorize(Some(&identity(&[Role::Admin])), &required).granted);
    }

    #[test]
    fn test_no_matching_role_denied() {
        let required = RequiredRoles::any_of([Role::Admin]);

        let decision = authorize(Some(&identity(&[Role::User])), &required);
        assert!(!decision.granted);
        assert_eq!(decision.reason, DecisionReason::NoMatchingRole);

        assert!(!authorize(Some(&identity(&[])), &required).granted);
    }

    #[test]
    fn test_anonymous_denied_on_protected_route() {
        let required = RequiredRoles::any_of([Role::User]);
        assert_eq!(authorize(None, &required).reason, DecisionReason::Anonymous);
    }

    #[test]
    fn test_required_roles_from_uppercase_names() {
        let required = RequiredRoles::parse(["ADMIN"]).unwrap();

        assert!(authorize(Some(&identity(&[Role::Admin])), &required).granted);
        assert!(!authorize(Some(&identity(&[Role::User])), &required).granted);
    }
}
