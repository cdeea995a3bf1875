/// Application error handling
///
/// Every failure the services can produce is folded into [`AppError`]:
/// 1. Policy violations on input (`ValidationError`)
/// 2. Store failures, with the backend cause kept for logs (`DatabaseError`)
/// 3. Credential and session-token failures (`AuthError`)
/// 4. Configuration problems detected at startup (`ConfigError`)
///
/// Each variant maps to a stable `(StatusCode, code)` pair for the HTTP layer.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::fmt;
use thiserror::Error;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Password policy rules, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    TooShort,
    MissingDigit,
    MissingLetter,
    MissingSpecial,
}

impl fmt::Display for PasswordRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordRule::TooShort => write!(f, "password must be at least 8 characters long"),
            PasswordRule::MissingDigit => write!(f, "password must contain at least one digit"),
            PasswordRule::MissingLetter => write!(f, "password must contain at least one letter"),
            PasswordRule::MissingSpecial => {
                write!(f, "password must contain at least one special character")
            }
        }
    }
}

/// Validation errors for input data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is empty")]
    EmptyField(String),
    #[error("{0} is too long (maximum {1} characters)")]
    TooLong(String, usize),
    #[error("{0}")]
    WeakPassword(PasswordRule),
    #[error("invalid email format")]
    InvalidEmail,
    #[error("{field} is not an attribute of {role} accounts")]
    UnsupportedField {
        field: &'static str,
        role: &'static str,
    },
}

/// Record store errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("duplicate entry: {0}")]
    UniqueConstraintViolation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("query error: {0}")]
    QueryExecution(String),
    #[error("database connection error: {0}")]
    ConnectionPool(String),
    #[error("database error: {0}")]
    UnexpectedError(String),
}

/// Postgres SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                    let constraint = db_err
                        .constraint()
                        .map(str::to_string)
                        .unwrap_or_else(|| db_err.message().to_string());
                    DatabaseError::UniqueConstraintViolation(constraint)
                } else {
                    DatabaseError::QueryExecution(db_err.message().to_string())
                }
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionPool(err.to_string())
            }
            _ => DatabaseError::UnexpectedError(err.to_string()),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required config: {0}")]
    MissingRequired(String),
    #[error("invalid config value: {0}")]
    InvalidValue(String),
    #[error("config load error: {0}")]
    Load(#[from] config::ConfigError),
}

/// Authentication errors
///
/// `InvalidCredentials` covers both "unknown email" and "wrong password".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token has expired")]
    TokenExpired,
    #[error("invalid token")]
    TokenInvalid,
    #[error("missing authentication token")]
    MissingToken,
    #[error("token role is not allowed here")]
    RoleNotAllowed,
}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("email {0} is already registered")]
    DuplicateEmail(String),
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] DatabaseError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Store(DatabaseError::from(err))
    }
}

impl AppError {
    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::DuplicateEmail(_) => "DUPLICATE_EMAIL",
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::Auth(e) => match e {
                AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
                AuthError::TokenExpired => "TOKEN_EXPIRED",
                AuthError::TokenInvalid => "TOKEN_INVALID",
                AuthError::MissingToken => "MISSING_TOKEN",
                AuthError::RoleNotAllowed => "ROLE_NOT_ALLOWED",
            },
            AppError::Store(DatabaseError::ConnectionPool(_)) => "SERVICE_UNAVAILABLE",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to hand to a client. Store, config and internal causes
    /// are replaced by a generic text.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::DuplicateEmail(_) => "Email already registered".to_string(),
            AppError::NotFound { .. } => self.to_string(),
            AppError::Auth(AuthError::InvalidCredentials) => {
                "Invalid email or password".to_string()
            }
            AppError::Auth(e) => e.to_string(),
            AppError::Store(DatabaseError::ConnectionPool(_)) => {
                "Database service temporarily unavailable".to_string()
            }
            AppError::Store(_) => "Database error occurred".to_string(),
            AppError::Config(_) => "Server configuration error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    pub status: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Converts errors to HTTP responses with matching log output
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let status = ResponseError::status_code(self);
        let response = ErrorResponse::new(
            request_id.to_string(),
            self.public_message(),
            self.code().to_string(),
            status.as_u16(),
        );
        (status, response)
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Validation error");
            }
            AppError::DuplicateEmail(_) => {
                tracing::warn!(request_id = request_id, "Duplicate email registration attempt");
            }
            AppError::NotFound { entity, id } => {
                tracing::info!(request_id = request_id, entity = entity, id = id, "Record not found");
            }
            AppError::Auth(AuthError::InvalidCredentials) => {
                tracing::warn!(request_id = request_id, "Invalid credentials attempt");
            }
            AppError::Auth(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Authentication error");
            }
            AppError::Store(e) => {
                tracing::error!(request_id = request_id, error = %e, "Store error");
            }
            AppError::Config(e) => {
                tracing::error!(request_id = request_id, error = %e, "Configuration error");
            }
            AppError::Internal(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Internal error");
            }
        }
    }
}

/// The logger's id for the current request, or a fresh one outside a request.
fn request_id() -> String {
    crate::logger::current_request_id().unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = request_id();
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateEmail(_) => StatusCode::CONFLICT,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Auth(AuthError::RoleNotAllowed) => StatusCode::FORBIDDEN,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Store(DatabaseError::ConnectionPool(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Error context for logging within a single service operation
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub operation: String,
    pub account_id: Option<i64>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: request_id(),
            operation: operation.into(),
            account_id: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_account_id(mut self, account_id: i64) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn log_error(&self, error: &AppError) {
        match error {
            AppError::Store(_) | AppError::Config(_) | AppError::Internal(_) => {
                tracing::error!(
                    request_id = %self.request_id,
                    operation = %self.operation,
                    account_id = ?self.account_id,
                    error = %error,
                    "Operation failed"
                );
            }
            _ => {
                tracing::warn!(
                    request_id = %self.request_id,
                    operation = %self.operation,
                    account_id = ?self.account_id,
                    error = %error,
                    "Operation rejected"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("email".to_string());
        assert_eq!(err.to_string(), "email is empty");

        let err = ValidationError::WeakPassword(PasswordRule::MissingDigit);
        assert_eq!(err.to_string(), "password must contain at least one digit");
    }

    #[test]
    fn test_app_error_conversion() {
        let app_err: AppError = ValidationError::InvalidEmail.into();
        assert!(matches!(app_err, AppError::Validation(ValidationError::InvalidEmail)));

        let app_err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(app_err, AppError::Store(DatabaseError::NotFound(_))));
    }

    #[test]
    fn test_status_and_code_pairs() {
        let cases: Vec<(AppError, u16, &str)> = vec![
            (ValidationError::InvalidEmail.into(), 400, "VALIDATION_ERROR"),
            (AppError::DuplicateEmail("a@b.com".into()), 409, "DUPLICATE_EMAIL"),
            (AppError::NotFound { entity: "student", id: 7 }, 404, "NOT_FOUND"),
            (AuthError::InvalidCredentials.into(), 401, "INVALID_CREDENTIALS"),
            (AuthError::TokenExpired.into(), 401, "TOKEN_EXPIRED"),
            (AuthError::TokenInvalid.into(), 401, "TOKEN_INVALID"),
            (AuthError::RoleNotAllowed.into(), 403, "ROLE_NOT_ALLOWED"),
            (DatabaseError::QueryExecution("boom".into()).into(), 500, "STORE_ERROR"),
            (DatabaseError::ConnectionPool("down".into()).into(), 503, "SERVICE_UNAVAILABLE"),
        ];

        for (err, status, code) in cases {
            assert_eq!(ResponseError::status_code(&err).as_u16(), status, "{:?}", err);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn test_store_error_message_is_generic() {
        let err: AppError =
            DatabaseError::QueryExecution("relation \"students\" does not exist".into()).into();
        let (_, response) = <AppError as ErrorHandler>::error_response(&err, "req-1");

        assert_eq!(response.message, "Database error occurred");
        assert!(!response.message.contains("students"));
    }

    #[test]
    fn test_error_response_creation() {
        let response = ErrorResponse::new(
            "test-123".to_string(),
            "Test error".to_string(),
            "TEST_ERROR".to_string(),
            400,
        );

        assert_eq!(response.error_id, "test-123");
        assert_eq!(response.code, "TEST_ERROR");
        assert_eq!(response.status, 400);
    }

    #[test]
    fn test_error_context_creation() {
        let ctx = ErrorContext::new("register");
        assert_eq!(ctx.operation, "register");
        assert!(ctx.account_id.is_none());

        let ctx = ctx.with_account_id(42);
        assert_eq!(ctx.account_id, Some(42));
    }
}
