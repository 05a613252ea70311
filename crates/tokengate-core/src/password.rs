//! 비밀번호 해싱 유틸리티.
//!
//! Argon2id 기반 비밀번호 해싱 및 검증.
//! 솔트는 호출마다 새로 생성되어 PHC 문자열 안에 포함됩니다.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::error::PasswordError;

/// 저장된 비밀번호 해시 (PHC 형식).
///
/// `Debug` 출력에서 해시 값을 숨깁니다.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// 저장소에서 읽은 PHC 문자열을 감쌉니다.
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    /// 저장용 PHC 문자열.
    pub fn as_phc(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordDigest([REDACTED])")
    }
}

/// Argon2id 비밀번호 해셔.
///
/// 상태를 갖지 않으므로 여러 작업에서 동시에 사용해도 안전합니다.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl PasswordHasher {
    /// 비용 파라미터를 지정하여 생성.
    ///
    /// # Arguments
    ///
    /// * `m_cost` - 메모리 비용 (KiB)
    /// * `t_cost` - 반복 횟수
    /// * `p_cost` - 병렬도
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, PasswordError> {
        let params =
            Params::new(m_cost, t_cost, p_cost, None).map_err(|_| PasswordError::HashingFailed)?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// 비밀번호 해싱.
    ///
    /// # Returns
    ///
    /// 솔트가 포함된 PHC 형식 해시
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let digest = PasswordHasher::default().hash("my_secure_password")?;
    /// // "$argon2id$v=19$m=19456,t=2,p=1$..."
    /// ```
    pub fn hash(&self, plaintext: &str) -> Result<PasswordDigest, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|_| PasswordError::HashingFailed)?;

        Ok(PasswordDigest(hash.to_string()))
    }

    /// 비밀번호 검증.
    ///
    /// 저장된 해시에 포함된 솔트와 파라미터로 다시 계산하여 비교합니다.
    /// 비교는 상수 시간으로 수행됩니다.
    ///
    /// # Returns
    ///
    /// 일치하면 `Ok(true)`, 불일치하면 `Ok(false)`.
    /// 저장된 해시가 손상된 경우에만 `Err(InvalidHashFormat)`.
    pub fn verify(&self, plaintext: &str, stored: &PasswordDigest) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(stored.as_phc()).map_err(|_| PasswordError::InvalidHashFormat)?;

        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(_) => Err(PasswordError::InvalidHashFormat),
        }
    }
}
