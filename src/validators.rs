/// Credential policy checks applied before any account write.
///
/// - Password strength: length, digit, letter, special character
/// - Email shape: single-line `local@domain.tld`, syntax only
/// - Required text fields: non-blank, bounded length

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{PasswordRule, ValidationError};

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_NAME_LENGTH: usize = 256;

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").expect("valid email regex");
    static ref DIGIT_REGEX: Regex = Regex::new(r"\d").expect("valid digit regex");
    static ref LETTER_REGEX: Regex = Regex::new(r"[A-Za-z]").expect("valid letter regex");
    static ref SPECIAL_REGEX: Regex =
        Regex::new(r#"[!@#$%^&*(),.?":{}|<>]"#).expect("valid special character regex");
}

/// Every password rule the input breaks, in priority order.
pub fn password_violations(password: &str) -> Vec<PasswordRule> {
    let mut violations = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        violations.push(PasswordRule::TooShort);
    }
    if !DIGIT_REGEX.is_match(password) {
        violations.push(PasswordRule::MissingDigit);
    }
    if !LETTER_REGEX.is_match(password) {
        violations.push(PasswordRule::MissingLetter);
    }
    if !SPECIAL_REGEX.is_match(password) {
        violations.push(PasswordRule::MissingSpecial);
    }

    violations
}

/// Validates password strength, reporting the first rule that fails.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    match password_violations(password).first() {
        Some(rule) => Err(ValidationError::WeakPassword(*rule)),
        None => Ok(()),
    }
}

/// Validates email syntax. No normalization is applied; the address is
/// stored exactly as given.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

/// Validates a required free-text field such as a first name or a course title.
pub fn validate_required_text(field: &str, value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong(field.to_string(), MAX_NAME_LENGTH));
    }

    Ok(())
}
