/// Password hashing and verification
///
/// bcrypt with a random per-password salt. Verification goes through
/// bcrypt's own comparison, never a raw string compare. The async variants
/// move the CPU-bound work onto tokio's blocking pool.

use bcrypt::{hash, verify};

use crate::error::AppError;

/// Hash a password with bcrypt at `cost`
///
/// # Errors
/// Returns error if bcrypt rejects the cost or fails to hash
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost).map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// # Errors
/// Returns error if the stored hash is malformed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_password() {
        let password = "Abcdef1!";
        let hash = hash_password(password, TEST_COST).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn test_same_password_gets_fresh_salt() {
        let first = hash_password("Abcdef1!", TEST_COST).unwrap();
        let second = hash_password("Abcdef1!", TEST_COST).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("Abcdef1!", TEST_COST).unwrap();

        assert!(verify_password("Abcdef1!", &hash).unwrap());
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("Abcdef1!", TEST_COST).unwrap();

        assert!(!verify_password("Abcdef1?", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash() {
        assert!(verify_password("Abcdef1!", "plaintext").is_err());
    }

    #[test]
    fn test_invalid_cost() {
        assert!(hash_password("Abcdef1!", 2).is_err());
    }

    #[tokio::test]
    async fn test_blocking_round_trip() {
        let hash = hash_password_blocking("Abcdef1!".to_string(), TEST_COST)
            .await
            .unwrap();

        assert!(verify_password_blocking("Abcdef1!".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password_blocking("nope".to_string(), hash).await.unwrap());
    }
}
