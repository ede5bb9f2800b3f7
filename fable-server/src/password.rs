use anyhow::{Context, Result};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordVerifier};

/// Hash a password with Argon2 and a fresh random salt.
///
/// Hashing is CPU-bound, so it runs on the blocking pool rather than a
/// runtime worker thread.
pub async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password_sync(&password))
        .await
        .context("Password hashing task failed")?
}

/// Verify a password against a stored Argon2 hash
pub async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(hash.as_str())
            .map_err(|_| anyhow::anyhow!("Stored credential hash is malformed"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .context("Password verification task failed")?
}

/// Synchronous variant for startup-time use (seeding demo accounts)
pub fn hash_password_sync(password: &str) -> Result<String> {
    let salt = SaltString::generate(rand::thread_rng());
    let hash = PasswordHash::generate(Argon2::default(), password, salt.as_salt())
        .map_err(|_| anyhow::anyhow!("Failed to hash password"))?;
    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_then_verify() {
        let hash = hash_password("hunter2".to_string()).await.unwrap();
        assert_ne!(hash, "hunter2");

        assert!(verify_password("hunter2".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password("hunter3".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_is_an_error() {
        let result = verify_password("whatever".to_string(), "not-a-hash".to_string()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_same_password_salts_differently() {
        let a = hash_password_sync("hunter2").unwrap();
        let b = hash_password_sync("hunter2").unwrap();
        assert_ne!(a, b);
    }
}
