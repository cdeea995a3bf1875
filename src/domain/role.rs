//! Account roles and the per-role table layout.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Optional profile attributes. Each role's table carries a subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    PhoneNumber,
    ProfileImage,
    Bio,
    Gender,
    Dob,
    City,
    Country,
    FutureGoal,
    AccountType,
    Qualification,
    ExpertiseArea,
    YearOfExperience,
}

impl ProfileField {
    pub const ALL: [ProfileField; 12] = [
        ProfileField::PhoneNumber,
        ProfileField::ProfileImage,
        ProfileField::Bio,
        ProfileField::Gender,
        ProfileField::Dob,
        ProfileField::City,
        ProfileField::Country,
        ProfileField::FutureGoal,
        ProfileField::AccountType,
        ProfileField::Qualification,
        ProfileField::ExpertiseArea,
        ProfileField::YearOfExperience,
    ];

    /// Column (and JSON) name.
    pub fn column(&self) -> &'static str {
        match self {
            ProfileField::PhoneNumber => "phone_number",
            ProfileField::ProfileImage => "profile_image",
            ProfileField::Bio => "bio",
            ProfileField::Gender => "gender",
            ProfileField::Dob => "dob",
            ProfileField::City => "city",
            ProfileField::Country => "country",
            ProfileField::FutureGoal => "future_goal",
            ProfileField::AccountType => "account_type",
            ProfileField::Qualification => "qualification",
            ProfileField::ExpertiseArea => "expertise_area",
            ProfileField::YearOfExperience => "year_of_experience",
        }
    }
}

/// Table layout and listing rules for one role.
#[derive(Debug)]
pub struct RoleSpec {
    pub table: &'static str,
    pub id_column: &'static str,
    pub profile_fields: &'static [ProfileField],
    /// Allowed sort columns; the first one is the default.
    pub sort_fields: &'static [&'static str],
}

/// Columns searched by account listings.
pub const ACCOUNT_SEARCH_FIELDS: &[&str] = &["first_name", "last_name", "email"];

static STUDENT: RoleSpec = RoleSpec {
    table: "students",
    id_column: "id",
    profile_fields: &[
        ProfileField::PhoneNumber,
        ProfileField::Dob,
        ProfileField::Gender,
        ProfileField::Country,
        ProfileField::City,
        ProfileField::Bio,
        ProfileField::ProfileImage,
        ProfileField::FutureGoal,
    ],
    sort_fields: &["id", "first_name", "last_name", "email", "created_at", "updated_at"],
};

static INSTRUCTOR: RoleSpec = RoleSpec {
    table: "instructors",
    id_column: "instructor_id",
    profile_fields: &[
        ProfileField::PhoneNumber,
        ProfileField::Gender,
        ProfileField::Dob,
        ProfileField::Bio,
        ProfileField::ProfileImage,
        ProfileField::City,
        ProfileField::Country,
        ProfileField::AccountType,
        ProfileField::Qualification,
        ProfileField::ExpertiseArea,
        ProfileField::YearOfExperience,
    ],
    sort_fields: &[
        "instructor_id",
        "first_name",
        "last_name",
        "email",
        "account_status",
        "created_at",
        "updated_at",
    ],
};

static ADMIN: RoleSpec = RoleSpec {
    table: "admins",
    id_column: "admin_id",
    profile_fields: &[ProfileField::PhoneNumber, ProfileField::ProfileImage],
    sort_fields: &[
        "admin_id",
        "first_name",
        "last_name",
        "email",
        "account_status",
        "created_at",
        "updated_at",
    ],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Instructor,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Instructor, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
        }
    }

    /// URL scope the role's endpoints live under.
    pub fn scope(&self) -> &'static str {
        match self {
            Role::Student => "/students",
            Role::Instructor => "/instructors",
            Role::Admin => "/admins",
        }
    }

    pub fn spec(&self) -> &'static RoleSpec {
        match self {
            Role::Student => &STUDENT,
            Role::Instructor => &INSTRUCTOR,
            Role::Admin => &ADMIN,
        }
    }

    pub fn supports(&self, field: ProfileField) -> bool {
        self.spec().profile_fields.contains(&field)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "instructor" => Ok(Role::Instructor),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}
