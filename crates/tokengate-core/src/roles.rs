//! 역할 기반 접근 제어 (RBAC) 타입.
//!
//! 사용자 역할, 역할 집합, 라우트별 요구 역할 정의.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AuthError;

/// 라우트 선언에서 "누구나 접근 가능"을 뜻하는 표식.
pub const ANYONE: &str = "anyone";

/// 역할 집합의 직렬화 구분자.
const ROLE_DELIMITER: char = ',';

/// 사용자 역할.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 일반 사용자 - 가입 시 기본 역할
    User,
    /// 강사
    Instructor,
    /// 관리자
    Admin,
}

impl Role {
    /// 역할 이름 (소문자).
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
        }
    }

    /// 문자열에서 역할 파싱 (대소문자 무시).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "user" => Some(Role::User),
            "instructor" => Some(Role::Instructor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| AuthError::InvalidRole(s.to_string()))
    }
}

/// 정렬된 역할 집합.
///
/// 토큰의 `roles` 클레임은 쉼표로 연결된 단일 문자열입니다.
/// 인코딩은 소문자 이름을 정렬 순서로 연결하며 빈 집합은 `""`입니다.
/// 디코딩은 알 수 없는 이름과 빈 항목을 거부합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    /// 빈 집합.
    pub fn new() -> Self {
        Self::default()
    }

    /// 단일 역할 집합.
    pub fn single(role: Role) -> Self {
        Self(BTreeSet::from([role]))
    }

    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    /// 두 집합에 공통으로 속한 첫 번째 역할.
    pub fn first_shared(&self, other: &RoleSet) -> Option<Role> {
        self.0.intersection(&other.0).next().copied()
    }

    /// 와이어 형식으로 인코딩.
    pub fn encode(&self) -> String {
        self.0
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// 와이어 형식에서 디코딩.
    ///
    /// # Errors
    ///
    /// 빈 항목(`"admin,,user"`)이나 알 수 없는 역할이 있으면 `InvalidRole`.
    pub fn decode(encoded: &str) -> Result<Self, AuthError> {
        if encoded.trim().is_empty() {
            return Ok(Self::new());
        }

        encoded
            .split(ROLE_DELIMITER)
            .map(|name| {
                if name.trim().is_empty() {
                    Err(AuthError::InvalidRole(encoded.to_string()))
                } else {
                    name.parse::<Role>()
                }
            })
            .collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for RoleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        RoleSet::decode(&encoded).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for RoleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.encode())
    }
}

/// 라우트가 요구하는 역할.
///
/// `Open`은 익명 요청까지 허용하는 표식이고,
/// `AnyOf`는 나열된 역할 중 하나만 있으면 허용합니다 (OR).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredRoles {
    Open,
    AnyOf(RoleSet),
}

impl RequiredRoles {
    /// 누구나 접근 가능.
    pub fn anyone() -> Self {
        Self::Open
    }

    /// 주어진 역할 중 하나를 요구. 빈 목록은 `Open`.
    pub fn any_of(roles: impl IntoIterator<Item = Role>) -> Self {
        let set: RoleSet = roles.into_iter().collect();
        if set.is_empty() {
            Self::Open
        } else {
            Self::AnyOf(set)
        }
    }

    /// 라우트 선언 문자열에서 파싱.
    ///
    /// `anyone`이 하나라도 있으면 `Open`입니다. 대소문자는 무시합니다.
    pub fn parse<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self, AuthError> {
        let mut set = RoleSet::new();

        for name in names {
            if name.trim().eq_ignore_ascii_case(ANYONE) {
                return Ok(Self::Open);
            }
            set.insert(name.parse()?);
        }

        Ok(Self::any_of(set.iter()))
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl std::fmt::Display for RequiredRoles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => f.write_str(ANYONE),
            Self::AnyOf(roles) => write!(f, "{}", roles),
        }
    }
}
