/// Authentication module
///
/// Handles session token issuance/verification and password hashing.

mod claims;
mod jwt;
mod password;

pub use claims::{Claims, SessionSubject};
pub use jwt::SessionIssuer;
pub use password::{hash_password, hash_password_blocking, verify_password, verify_password_blocking};
