//! Accounts (students, instructors, admins) and their input/output shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::{ProfileField, Role};
use crate::error::ValidationError;

pub const DEFAULT_ACCOUNT_STATUS: &str = "active";

/// Optional profile attributes.
///
/// Used both as stored state and as a change set: `None` in a change set means
/// "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub future_goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expertise_area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_of_experience: Option<i32>,
}

impl Profile {
    /// Text slot for a field; `None` for the numeric `year_of_experience`.
    pub fn text(&self, field: ProfileField) -> Option<&str> {
        match field {
            ProfileField::PhoneNumber => self.phone_number.as_deref(),
            ProfileField::ProfileImage => self.profile_image.as_deref(),
            ProfileField::Bio => self.bio.as_deref(),
            ProfileField::Gender => self.gender.as_deref(),
            ProfileField::Dob => self.dob.as_deref(),
            ProfileField::City => self.city.as_deref(),
            ProfileField::Country => self.country.as_deref(),
            ProfileField::FutureGoal => self.future_goal.as_deref(),
            ProfileField::AccountType => self.account_type.as_deref(),
            ProfileField::Qualification => self.qualification.as_deref(),
            ProfileField::ExpertiseArea => self.expertise_area.as_deref(),
            ProfileField::YearOfExperience => None,
        }
    }

    pub fn text_mut(&mut self, field: ProfileField) -> Option<&mut Option<String>> {
        match field {
            ProfileField::PhoneNumber => Some(&mut self.phone_number),
            ProfileField::ProfileImage => Some(&mut self.profile_image),
            ProfileField::Bio => Some(&mut self.bio),
            ProfileField::Gender => Some(&mut self.gender),
            ProfileField::Dob => Some(&mut self.dob),
            ProfileField::City => Some(&mut self.city),
            ProfileField::Country => Some(&mut self.country),
            ProfileField::FutureGoal => Some(&mut self.future_goal),
            ProfileField::AccountType => Some(&mut self.account_type),
            ProfileField::Qualification => Some(&mut self.qualification),
            ProfileField::ExpertiseArea => Some(&mut self.expertise_area),
            ProfileField::YearOfExperience => None,
        }
    }

    pub fn is_supplied(&self, field: ProfileField) -> bool {
        match field {
            ProfileField::YearOfExperience => self.year_of_experience.is_some(),
            text => self.text(text).is_some(),
        }
    }

    /// Fails on the first supplied field the role's table does not carry.
    pub fn ensure_supported_by(&self, role: Role) -> Result<(), ValidationError> {
        match ProfileField::ALL
            .into_iter()
            .find(|field| self.is_supplied(*field) && !role.supports(*field))
        {
            Some(field) => Err(ValidationError::UnsupportedField {
                field: field.column(),
                role: role.as_str(),
            }),
            None => Ok(()),
        }
    }

    /// Overwrites every field that `changes` supplies; leaves the rest alone.
    pub fn apply(&mut self, changes: Profile) {
        let Profile {
            phone_number,
            profile_image,
            bio,
            gender,
            dob,
            city,
            country,
            future_goal,
            account_type,
            qualification,
            expertise_area,
            year_of_experience,
        } = changes;

        overwrite(&mut self.phone_number, phone_number);
        overwrite(&mut self.profile_image, profile_image);
        overwrite(&mut self.bio, bio);
        overwrite(&mut self.gender, gender);
        overwrite(&mut self.dob, dob);
        overwrite(&mut self.city, city);
        overwrite(&mut self.country, country);
        overwrite(&mut self.future_goal, future_goal);
        overwrite(&mut self.account_type, account_type);
        overwrite(&mut self.qualification, qualification);
        overwrite(&mut self.expertise_area, expertise_area);
        overwrite(&mut self.year_of_experience, year_of_experience);
    }
}

fn overwrite<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// A stored account. `password_hash` never leaves the process; external
/// projections go through [`PrincipalView`] or [`PublicProfile`].
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub id: i64,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub profile: Profile,
    pub account_status: String,
    pub email_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub password_last_change: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPrincipal {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(default)]
    pub account_status: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
}

/// Partial update input. Absent and `null` both mean "leave unchanged";
/// an empty password is treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PrincipalChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(flatten)]
    pub profile: Profile,
    pub account_status: Option<String>,
    pub email_verified: Option<bool>,
}

impl PrincipalChanges {
    /// The new password, if one was actually supplied.
    pub fn new_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

/// What a store needs to create an account; ids and timestamps are
/// store-assigned.
#[derive(Debug, Clone)]
pub struct PrincipalRecord {
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub profile: Profile,
    pub account_status: String,
    pub email_verified: bool,
}

/// Full account projection without the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalView {
    pub id: i64,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(flatten)]
    pub profile: Profile,
    pub account_status: String,
    pub email_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub password_last_change: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Principal> for PrincipalView {
    fn from(p: Principal) -> Self {
        Self {
            id: p.id,
            role: p.role,
            first_name: p.first_name,
            last_name: p.last_name,
            email: p.email,
            profile: p.profile,
            account_status: p.account_status,
            email_verified: p.email_verified,
            last_login: p.last_login,
            password_last_change: p.password_last_change,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Reduced projection returned with a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub profile_image: Option<String>,
}

impl From<&Principal> for PublicProfile {
    fn from(p: &Principal) -> Self {
        Self {
            id: p.id,
            first_name: p.first_name.clone(),
            last_name: p.last_name.clone(),
            email: p.email.clone(),
            role: p.role,
            profile_image: p.profile.profile_image.clone(),
        }
    }
}

/// Successful login result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user: PublicProfile,
}
