/// Account service
///
/// Registration, partial update, login and lookups for one role. The three
/// roles share this implementation; only the [`Role`] differs.

use chrono::Utc;
use std::sync::Arc;

use crate::auth::{
    hash_password_blocking, verify_password_blocking, Claims, SessionIssuer, SessionSubject,
};
use crate::domain::{
    NewPrincipal, Principal, PrincipalChanges, PrincipalRecord, PublicProfile, Role,
    SessionResponse, DEFAULT_ACCOUNT_STATUS,
};
use crate::error::{AppError, AuthError, DatabaseError, ErrorContext, ValidationError};
use crate::listing::{ListParams, Page};
use crate::store::AccountStore;
use crate::validators::{validate_email, validate_password, validate_required_text};

#[derive(Clone)]
pub struct AccountService {
    role: Role,
    store: Arc<dyn AccountStore>,
    sessions: SessionIssuer,
    bcrypt_cost: u32,
}

impl AccountService {
    pub fn new(
        role: Role,
        store: Arc<dyn AccountStore>,
        sessions: SessionIssuer,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            role,
            store,
            sessions,
            bcrypt_cost,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Create an account.
    ///
    /// # Errors
    /// - `Validation` for bad names, email, password or unsupported profile fields
    /// - `DuplicateEmail` if the email is already registered for this role
    /// - `Store` if persistence fails
    pub async fn register(&self, input: NewPrincipal) -> Result<Principal, AppError> {
        let context = ErrorContext::new(format!("{}_registration", self.role));

        validate_required_text("first_name", &input.first_name)?;
        validate_required_text("last_name", &input.last_name)?;
        validate_email(&input.email)?;
        if input.password.is_empty() {
            return Err(ValidationError::EmptyField("password".to_string()).into());
        }
        validate_password(&input.password)?;
        input.profile.ensure_supported_by(self.role)?;

        if self
            .store
            .find_by_email(self.role, &input.email)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateEmail(input.email));
        }

        let password_hash = hash_password_blocking(input.password, self.bcrypt_cost).await?;

        let account_status = input
            .account_status
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ACCOUNT_STATUS.to_string());

        let record = PrincipalRecord {
            role: self.role,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email: input.email.clone(),
            password_hash,
            profile: input.profile,
            account_status,
            email_verified: input.email_verified.unwrap_or(false),
        };

        let principal = self
            .store
            .create(record)
            .await
            .map_err(|e| store_failure(&context, e, &input.email))?;

        tracing::info!(
            request_id = %context.request_id,
            role = %self.role,
            account_id = principal.id,
            "Account registered"
        );

        Ok(principal)
    }

    /// Apply a partial update. Fields absent from `changes` keep their value.
    ///
    /// # Errors
    /// - `Validation` for any supplied field that fails its rule
    /// - `NotFound` if no account has `id`
    /// - `DuplicateEmail` if the new email belongs to another account
    pub async fn update(&self, id: i64, changes: PrincipalChanges) -> Result<Principal, AppError> {
        let context = ErrorContext::new(format!("{}_update", self.role)).with_account_id(id);

        if let Some(first_name) = &changes.first_name {
            validate_required_text("first_name", first_name)?;
        }
        if let Some(last_name) = &changes.last_name {
            validate_required_text("last_name", last_name)?;
        }
        if let Some(email) = &changes.email {
            validate_email(email)?;
        }
        if let Some(password) = changes.new_password() {
            validate_password(password)?;
        }
        if let Some(status) = &changes.account_status {
            validate_required_text("account_status", status)?;
        }
        changes.profile.ensure_supported_by(self.role)?;

        let mut principal = self.get(id).await?;

        if let Some(email) = &changes.email {
            if *email != principal.email {
                if let Some(owner) = self.store.find_by_email(self.role, email).await? {
                    if owner.id != id {
                        return Err(AppError::DuplicateEmail(email.clone()));
                    }
                }
            }
        }

        if let Some(password) = changes.new_password() {
            principal.password_hash =
                hash_password_blocking(password.to_string(), self.bcrypt_cost).await?;
            principal.password_last_change = Some(Utc::now());
        }

        let PrincipalChanges {
            first_name,
            last_name,
            email,
            password: _,
            profile,
            account_status,
            email_verified,
        } = changes;

        if let Some(first_name) = first_name {
            principal.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = last_name {
            principal.last_name = last_name.trim().to_string();
        }
        if let Some(email) = email {
            principal.email = email;
        }
        if let Some(status) = account_status {
            principal.account_status = status.trim().to_string();
        }
        if let Some(verified) = email_verified {
            principal.email_verified = verified;
        }
        principal.profile.apply(profile);

        let updated = match self.store.update(&principal).await {
            Ok(updated) => updated,
            Err(DatabaseError::NotFound(_)) => {
                return Err(AppError::NotFound {
                    entity: self.role.as_str(),
                    id,
                })
            }
            Err(e) => return Err(store_failure(&context, e, &principal.email)),
        };

        tracing::info!(
            request_id = %context.request_id,
            role = %self.role,
            account_id = id,
            "Account updated"
        );

        Ok(updated)
    }

    /// Check credentials and mint a session.
    ///
    /// # Errors
    /// `Auth(InvalidCredentials)` for an unknown email and for a wrong
    /// password alike.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionResponse, AppError> {
        let context = ErrorContext::new(format!("{}_login", self.role));

        let principal = match self.store.find_by_email(self.role, email).await? {
            Some(principal) => principal,
            None => return Err(AuthError::InvalidCredentials.into()),
        };

        let verified =
            match verify_password_blocking(password.to_string(), principal.password_hash.clone())
                .await
            {
                Ok(verified) => verified,
                Err(e) => {
                    tracing::error!(
                        request_id = %context.request_id,
                        role = %self.role,
                        account_id = principal.id,
                        error = %e,
                        "Stored password hash could not be checked"
                    );
                    false
                }
            };
        if !verified {
            return Err(AuthError::InvalidCredentials.into());
        }

        if let Err(e) = self
            .store
            .record_login(self.role, principal.id, Utc::now())
            .await
        {
            tracing::warn!(
                request_id = %context.request_id,
                role = %self.role,
                account_id = principal.id,
                error = %e,
                "Failed to record last login"
            );
        }

        let token = self.sessions.issue(&SessionSubject::from(&principal))?;

        tracing::info!(
            request_id = %context.request_id,
            role = %self.role,
            account_id = principal.id,
            "Account logged in"
        );

        Ok(SessionResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.sessions.default_ttl().num_seconds(),
            user: PublicProfile::from(&principal),
        })
    }

    pub async fn get(&self, id: i64) -> Result<Principal, AppError> {
        self.store
            .find_by_id(self.role, id)
            .await?
            .ok_or(AppError::NotFound {
                entity: self.role.as_str(),
                id,
            })
    }

    pub async fn list(&self, params: &ListParams) -> Result<Page<Principal>, AppError> {
        let query = params.resolve(self.role.spec().sort_fields);
        let total_count = self.store.count(self.role, None).await?;
        let (items, filtered_count) = self.store.find_many(self.role, &query).await?;

        Ok(Page {
            items,
            total_count,
            filtered_count,
            page: query.page,
            per_page: query.per_page,
        })
    }

    /// Account id a verified token speaks for, provided it was issued for
    /// this role.
    pub fn subject_of(&self, claims: &Claims) -> Result<i64, AppError> {
        if claims.role != self.role {
            return Err(AuthError::RoleNotAllowed.into());
        }
        Ok(claims.subject_id()?)
    }

    /// The account behind a verified token.
    pub async fn current(&self, claims: &Claims) -> Result<Principal, AppError> {
        let id = self.subject_of(claims)?;
        self.get(id).await
    }
}

fn store_failure(context: &ErrorContext, err: DatabaseError, email: &str) -> AppError {
    let err = match err {
        DatabaseError::UniqueConstraintViolation(_) => AppError::DuplicateEmail(email.to_string()),
        other => AppError::Store(other),
    };
    context.log_error(&err);
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::JwtSettings;
    use crate::domain::Profile;
    use crate::store::InMemoryStore;

    fn service(role: Role) -> AccountService {
        let sessions = SessionIssuer::new(&JwtSettings {
            secret: "unit-test-secret-unit-test-secret".to_string(),
            session_ttl_seconds: 3600,
        });
        AccountService::new(role, Arc::new(InMemoryStore::new()), sessions, 4)
    }

    fn new_principal(email: &str) -> NewPrincipal {
        NewPrincipal {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            password: "Abcdef1!".to_string(),
            profile: Profile::default(),
            account_status: None,
            email_verified: None,
        }
    }

    #[tokio::test]
    async fn test_register_applies_defaults_and_hashes() {
        let service = service(Role::Student);

        let principal = service.register(new_principal("ada@example.com")).await.unwrap();

        assert_eq!(principal.account_status, "active");
        assert!(!principal.email_verified);
        assert!(principal.last_login.is_none());
        assert_ne!(principal.password_hash, "Abcdef1!");
        assert!(principal.password_hash.starts_with("$2"));
    }

    #[tokio::test]
    async fn test_register_rejects_empty_password() {
        let service = service(Role::Student);
        let mut input = new_principal("ada@example.com");
        input.password = String::new();

        let err = service.register(input).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Validation(ValidationError::EmptyField(ref f)) if f == "password"
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_field_of_another_role() {
        let service = service(Role::Admin);
        let mut input = new_principal("ada@example.com");
        input.profile.bio = Some("hello".to_string());

        let err = service.register(input).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Validation(ValidationError::UnsupportedField { field: "bio", .. })
        ));
    }

    #[tokio::test]
    async fn test_current_rejects_token_of_another_role() {
        let students = service(Role::Student);
        let principal = students.register(new_principal("ada@example.com")).await.unwrap();
        let session = students.login("ada@example.com", "Abcdef1!").await.unwrap();
        let claims = students.sessions.verify(&session.token).unwrap();

        assert_eq!(students.current(&claims).await.unwrap().id, principal.id);

        let admins = service(Role::Admin);
        assert!(matches!(
            admins.current(&claims).await,
            Err(AppError::Auth(AuthError::RoleNotAllowed))
        ));
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let service = service(Role::Instructor);

        let err = service
            .update(7, PrincipalChanges::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::NotFound {
                entity: "instructor",
                id: 7
            }
        ));
    }
}
