//! 로그인/가입 경로의 인증 서비스.
//!
//! 자격증명 검증, 비밀번호 변경, 역할 부여를 저장소 위에 조합합니다.
//! 비밀번호 해싱은 CPU 비용이 크므로 blocking 스레드에서 수행합니다.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info};

use crate::error::{AuthError, AuthResult, CredentialError, PasswordError};
use crate::identity::Identity;
use crate::jwt::{TokenGrant, TokenIssuer};
use crate::password::{PasswordDigest, PasswordHasher};
use crate::roles::Role;
use crate::store::{CredentialStore, StoredCredential};

/// 인증 서비스.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
    /// 존재하지 않는 사용자 검증 시에도 같은 비용을 쓰기 위한 해시
    decoy: PasswordDigest,
}

impl AuthService {
    /// # Errors
    ///
    /// 비교용 해시 생성에 실패하면 `Hashing`.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        issuer: TokenIssuer,
    ) -> AuthResult<Self> {
        let decoy = hasher.hash("tokengate-decoy-password")?;

        Ok(Self {
            store,
            hasher,
            issuer,
            decoy,
        })
    }

    /// 신규 사용자 가입 후 토큰 발급.
    ///
    /// 기본 역할은 `user`입니다.
    pub async fn register(&self, subject: &str, password: &str) -> AuthResult<TokenGrant> {
        if subject.trim().is_empty() {
            return Err(AuthError::InvalidInput("subject must not be empty".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::InvalidInput("password must not be empty".to_string()));
        }

        let digest = self.hash(password).await?;
        let credential = StoredCredential::new(subject, digest);
        let identity = credential.identity();

        self.store.insert(credential).await?;
        info!(subject = %subject, "User registered");

        self.issuer.issue(&identity)
    }

    /// 자격증명 검증.
    ///
    /// 사용자 없음과 비밀번호 불일치는 서로 다른 `CredentialError`이지만
    /// 외부 응답에서는 구분되지 않습니다.
    pub async fn verify_credential(&self, subject: &str, password: &str) -> AuthResult<Identity> {
        let Some(credential) = self.store.find(subject).await? else {
            // 응답 시간으로 사용자 존재 여부가 드러나지 않도록 동일한 비용 지불
            let _ = self.check_password(password, self.decoy.clone()).await;
            debug!(subject = %subject, "Credential check failed: unknown subject");
            return Err(CredentialError::NotFound.into());
        };

        match self.check_password(password, credential.password_hash.clone()).await {
            Ok(true) => Ok(credential.identity()),
            Ok(false) => {
                debug!(subject = %subject, "Credential check failed: wrong password");
                Err(CredentialError::WrongPassword.into())
            }
            Err(err) => {
                error!(subject = %subject, "Stored password hash is corrupted");
                Err(err)
            }
        }
    }

    /// 로그인 후 토큰 발급.
    pub async fn login(&self, subject: &str, password: &str) -> AuthResult<TokenGrant> {
        let identity = self.verify_credential(subject, password).await?;
        let grant = self.issuer.issue(&identity)?;
        info!(subject = %subject, "Login succeeded");
        Ok(grant)
    }

    /// 비밀번호 해시 교체.
    pub async fn update_credential(&self, subject: &str, new_password: &str) -> AuthResult<()> {
        if new_password.is_empty() {
            return Err(AuthError::InvalidInput("password must not be empty".to_string()));
        }

        let digest = self.hash(new_password).await?;
        self.store.replace_hash(subject, digest).await?;
        info!(subject = %subject, "Password updated");
        Ok(())
    }

    /// 현재 비밀번호 확인 후 변경하고 새 토큰 발급.
    pub async fn reset_password(
        &self,
        subject: &str,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<TokenGrant> {
        let identity = self.verify_credential(subject, current_password).await?;
        self.update_credential(subject, new_password).await?;
        self.issuer.issue(&identity)
    }

    /// 비밀번호 재설정 요청 기록.
    ///
    /// 알림 발송은 외부에서 처리합니다. 사용자 존재 여부와 관계없이 성공합니다.
    pub async fn request_password_reset(&self, subject: &str) -> AuthResult<()> {
        match self.store.mark_reset_requested(subject, Utc::now()).await {
            Ok(()) => {
                info!(subject = %subject, "Password reset requested");
                Ok(())
            }
            Err(CredentialError::NotFound) => {
                debug!(subject = %subject, "Password reset requested for unknown subject");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// 역할 부여.
    ///
    /// 이미 발급된 토큰에는 반영되지 않고 다음 발급부터 적용됩니다.
    pub async fn assign_role(&self, subject: &str, role: Role) -> AuthResult<Identity> {
        let roles = self.store.add_role(subject, role).await?;
        info!(subject = %subject, role = %role, "Role assigned");
        Ok(Identity::new(subject, roles))
    }

    /// 계정 삭제.
    pub async fn delete_account(&self, subject: &str) -> AuthResult<()> {
        self.store.remove(subject).await?;
        info!(subject = %subject, "Account deleted");
        Ok(())
    }

    async fn hash(&self, plaintext: &str) -> AuthResult<PasswordDigest> {
        let hasher = self.hasher.clone();
        let plaintext = plaintext.to_owned();

        let digest = tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        digest.map_err(|_| AuthError::Internal("password hashing failed".to_string()))
    }

    async fn check_password(&self, plaintext: &str, stored: PasswordDigest) -> AuthResult<bool> {
        let hasher = self.hasher.clone();
        let plaintext = plaintext.to_owned();

        let matched = tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &stored))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        matched.map_err(AuthError::Hashing)
    }
}
