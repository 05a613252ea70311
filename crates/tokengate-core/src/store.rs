//! 자격증명 저장소.
//!
//! 영속 계층이 구현하는 인터페이스입니다. 평문 비밀번호는 저장소를 통과하지 않으며
//! 해시는 교체만 되고 제자리에서 수정되지 않습니다.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::CredentialError;
use crate::identity::Identity;
use crate::password::PasswordDigest;
use crate::roles::{Role, RoleSet};

/// 저장된 자격증명.
#[derive(Debug, Clone)]
pub struct StoredCredential {
    /// 사용자 식별자 (변경 불가)
    pub subject: String,
    /// 비밀번호 해시
    pub password_hash: PasswordDigest,
    /// 역할
    pub roles: RoleSet,
    /// 비밀번호 재설정 요청 시각
    pub reset_requested_at: Option<DateTime<Utc>>,
}

impl StoredCredential {
    /// 가입 시 기본 역할(`user`)로 생성.
    pub fn new(subject: impl Into<String>, password_hash: PasswordDigest) -> Self {
        Self {
            subject: subject.into(),
            password_hash,
            roles: RoleSet::single(Role::User),
            reset_requested_at: None,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.subject.clone(), self.roles.clone())
    }
}

/// 자격증명 저장소 트레이트.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 식별자로 조회.
    async fn find(&self, subject: &str) -> Result<Option<StoredCredential>, CredentialError>;

    /// 새 자격증명 저장. 이미 있으면 `AlreadyExists`.
    async fn insert(&self, credential: StoredCredential) -> Result<(), CredentialError>;

    /// 해시 교체. 재설정 표식도 지웁니다.
    async fn replace_hash(
        &self,
        subject: &str,
        password_hash: PasswordDigest,
    ) -> Result<(), CredentialError>;

    /// 역할 추가 후 갱신된 역할 집합 반환.
    async fn add_role(&self, subject: &str, role: Role) -> Result<RoleSet, CredentialError>;

    /// 재설정 요청 시각 기록.
    async fn mark_reset_requested(
        &self,
        subject: &str,
        at: DateTime<Utc>,
    ) -> Result<(), CredentialError>;

    /// 삭제.
    async fn remove(&self, subject: &str) -> Result<(), CredentialError>;
}

/// 메모리 기반 저장소.
///
/// 테스트와 단일 프로세스 실행용입니다.
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    credentials: Arc<RwLock<HashMap<String, StoredCredential>>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 사용자 수.
    pub async fn len(&self) -> usize {
        self.credentials.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.credentials.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find(&self, subject: &str) -> Result<Option<StoredCredential>, CredentialError> {
        Ok(self.credentials.read().await.get(subject).cloned())
    }

    async fn insert(&self, credential: StoredCredential) -> Result<(), CredentialError> {
        let mut credentials = self.credentials.write().await;
        if credentials.contains_key(&credential.subject) {
            return Err(CredentialError::AlreadyExists);
        }
        credentials.insert(credential.subject.clone(), credential);
        Ok(())
    }

    async fn replace_hash(
        &self,
        subject: &str,
        password_hash: PasswordDigest,
    ) -> Result<(), CredentialError> {
        let mut credentials = self.credentials.write().await;
        let credential = credentials.get_mut(subject).ok_or(CredentialError::NotFound)?;
        credential.password_hash = password_hash;
        credential.reset_requested_at = None;
        Ok(())
    }

    async fn add_role(&self, subject: &str, role: Role) -> Result<RoleSet, CredentialError> {
        let mut credentials = self.credentials.write().await;
        let credential = credentials.get_mut(subject).ok_or(CredentialError::NotFound)?;
        credential.roles.insert(role);
        Ok(credential.roles.clone())
    }

    async fn mark_reset_requested(
        &self,
        subject: &str,
        at: DateTime<Utc>,
    ) -> Result<(), CredentialError> {
        let mut credentials = self.credentials.write().await;
        let credential = credentials.get_mut(subject).ok_or(CredentialError::NotFound)?;
        credential.reset_requested_at = Some(at);
        Ok(())
    }

    async fn remove(&self, subject: &str) -> Result<(), CredentialError> {
        self.credentials
            .write()
            .await
            .remove(subject)
            .map(|_| ())
            .ok_or(CredentialError::NotFound)
    }
}
