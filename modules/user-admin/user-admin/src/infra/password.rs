use argon2::Argon2;
use argon2::password_hash::{PasswordHasher as _, SaltString};
use async_trait::async_trait;
use rand::RngCore;

use crate::domain::error::DomainError;
use crate::domain::ports::PasswordHasher;

/// Argon2id hasher producing PHC strings. Hashing runs on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

fn hash_blocking(plain: &str) -> Result<String, DomainError> {
    let mut salt_bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| DomainError::internal(format!("salt encoding failed: {e}")))?;

    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DomainError::internal(format!("password hashing failed: {e}")))
}

#[async_trait]
impl PasswordHasher for Argon2Hasher {
    async fn hash(&self, plain: String) -> Result<String, DomainError> {
        tokio::task::spawn_blocking(move || hash_blocking(&plain))
            .await
            .map_err(|e| DomainError::internal(format!("hashing task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::PasswordVerifier;
    use argon2::password_hash::PasswordHash;

    #[tokio::test]
    async fn produces_verifiable_phc_strings() {
        let hash = Argon2Hasher.hash("correct horse".to_owned()).await.unwrap();
        assert!(hash.starts_with("$argon2id$"));

        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"correct horse", &parsed)
                .is_ok()
        );
        assert!(Argon2::default().verify_password(b"wrong", &parsed).is_err());
    }

    #[tokio::test]
    async fn salts_differ_between_calls() {
        let a = Argon2Hasher.hash("same".to_owned()).await.unwrap();
        let b = Argon2Hasher.hash("same".to_owned()).await.unwrap();
        assert_ne!(a, b);
    }
}
