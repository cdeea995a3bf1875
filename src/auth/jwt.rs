/// Session token issuance and verification
///
/// Tokens are compact HS256 JWS strings signed with the process-wide secret.
/// Verification is stateless: signature plus `exp`, with no leeway.

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::{Claims, SessionSubject};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Mints and checks session tokens for one signing secret.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    default_ttl: Duration,
}

impl SessionIssuer {
    pub fn new(config: &JwtSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            default_ttl: Duration::seconds(config.session_ttl_seconds),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Issue a token valid for the configured ttl
    pub fn issue(&self, subject: &SessionSubject) -> Result<String, AppError> {
        self.issue_with_ttl(subject, self.default_ttl)
    }

    /// Issue a token valid for `ttl`. A negative ttl yields an already
    /// expired token.
    ///
    /// # Errors
    /// Returns error if token encoding fails
    pub fn issue_with_ttl(&self, subject: &SessionSubject, ttl: Duration) -> Result<String, AppError> {
        let claims = Claims::new(subject, ttl);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Validate a token and return its claims
    ///
    /// # Errors
    /// `TokenExpired` once `exp` has passed; `TokenInvalid` for anything
    /// malformed, tampered with, or signed with another secret
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    tracing::warn!("Session token rejected: {}", e);
                    AuthError::TokenInvalid
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            session_ttl_seconds: 24 * 60 * 60,
        }
    }

    fn subject() -> SessionSubject {
        SessionSubject {
            subject_id: 7,
            email: "test@example.com".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            role: Role::Student,
        }
    }

    #[test]
    fn test_issue_and_verify_token() {
        let issuer = SessionIssuer::new(&get_test_config());

        let token = issuer.issue(&subject()).expect("Failed to generate token");
        let claims = issuer.verify(&token).expect("Failed to validate token");

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.first_name, "Grace");
        assert_eq!(claims.last_name, "Hopper");
        assert_eq!(claims.role, Role::Student);
    }

    #[test]
    fn test_default_ttl_is_one_day() {
        let issuer = SessionIssuer::new(&get_test_config());
        let before = chrono::Utc::now().timestamp();

        let token = issuer.issue(&subject()).unwrap();
        let claims = issuer.verify(&token).unwrap();

        assert!(claims.exp >= before + 86_400);
        assert!(claims.exp <= chrono::Utc::now().timestamp() + 86_400);
    }

    #[test]
    fn test_token_has_three_segments() {
        let issuer = SessionIssuer::new(&get_test_config());
        let token = issuer.issue(&subject()).unwrap();

        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_expired_token() {
        let issuer = SessionIssuer::new(&get_test_config());
        let token = issuer
            .issue_with_ttl(&subject(), Duration::seconds(-1))
            .unwrap();

        assert_eq!(issuer.verify(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn test_invalid_token() {
        let issuer = SessionIssuer::new(&get_test_config());

        assert_eq!(issuer.verify("invalid.token.here"), Err(AuthError::TokenInvalid));
        assert_eq!(issuer.verify(""), Err(AuthError::TokenInvalid));
    }

    #[test]
    fn test_tampered_token() {
        let issuer = SessionIssuer::new(&get_test_config());
        let token = issuer.issue(&subject()).unwrap();

        let tampered = format!("{}X", token);

        assert_eq!(issuer.verify(&tampered), Err(AuthError::TokenInvalid));
    }

    #[test]
    fn test_wrong_secret() {
        let issuer = SessionIssuer::new(&get_test_config());
        let token = issuer.issue(&subject()).unwrap();

        let mut other = get_test_config();
        other.secret = "another-secret-key-at-least-32-characters".to_string();

        assert_eq!(
            SessionIssuer::new(&other).verify(&token),
            Err(AuthError::TokenInvalid)
        );
    }
}
