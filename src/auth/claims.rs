/// Session token claims
///
/// Payload of a session token: the account's identity plus an absolute
/// expiry (RFC 7519 `exp`).

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Principal, Role};
use crate::error::AuthError;

/// Identity a session is minted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSubject {
    pub subject_id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl From<&Principal> for SessionSubject {
    fn from(p: &Principal) -> Self {
        Self {
            subject_id: p.id,
            email: p.email.clone(),
            first_name: p.first_name.clone(),
            last_name: p.last_name.clone(),
            role: p.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (account id as a string)
    pub sub: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create claims expiring `ttl` from now
    pub fn new(subject: &SessionSubject, ttl: Duration) -> Self {
        Self {
            sub: subject.subject_id.to_string(),
            email: subject.email.clone(),
            first_name: subject.first_name.clone(),
            last_name: subject.last_name.clone(),
            role: subject.role,
            exp: (Utc::now() + ttl).timestamp(),
        }
    }

    /// Extract the account id from `sub`
    ///
    /// # Errors
    /// `TokenInvalid` if `sub` is not numeric
    pub fn subject_id(&self) -> Result<i64, AuthError> {
        self.sub.parse().map_err(|_| AuthError::TokenInvalid)
    }

    pub fn is_expired(&self) -> bool {
        self.exp < Utc::now().timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> SessionSubject {
        SessionSubject {
            subject_id: 42,
            email: "test@example.com".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            role: Role::Instructor,
        }
    }

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new(&subject(), Duration::hours(1));

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.role, Role::Instructor);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_subject_id_extraction() {
        let claims = Claims::new(&subject(), Duration::hours(1));
        assert_eq!(claims.subject_id(), Ok(42));
    }

    #[test]
    fn test_invalid_subject_id() {
        let mut claims = Claims::new(&subject(), Duration::hours(1));
        claims.sub = "not-a-number".to_string();

        assert_eq!(claims.subject_id(), Err(AuthError::TokenInvalid));
    }

    #[test]
    fn test_negative_ttl_is_expired() {
        let claims = Claims::new(&subject(), Duration::seconds(-1));
        assert!(claims.is_expired());
    }

    #[test]
    fn test_payload_field_names() {
        let json = serde_json::to_value(Claims::new(&subject(), Duration::hours(1))).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();

        assert_eq!(keys, ["email", "exp", "first_name", "last_name", "role", "sub"]);
        assert_eq!(json["role"], "instructor");
    }
}
