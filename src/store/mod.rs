//! Record store abstraction.
//!
//! Services only talk to these traits. `PgStore` backs them with PostgreSQL;
//! `InMemoryStore` keeps everything in process memory.
//!
//! A store must report a duplicate email as
//! [`DatabaseError::UniqueConstraintViolation`] so the service can turn it
//! into a duplicate-email failure even when its own pre-check raced.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Course, CourseRecord, Principal, PrincipalRecord, Role};
use crate::error::DatabaseError;
use crate::listing::ListQuery;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, role: Role, id: i64) -> Result<Option<Principal>, DatabaseError>;

    /// Exact, case-sensitive email lookup.
    async fn find_by_email(&self, role: Role, email: &str)
        -> Result<Option<Principal>, DatabaseError>;

    /// One page of accounts plus the number of accounts matching the search.
    async fn find_many(
        &self,
        role: Role,
        query: &ListQuery,
    ) -> Result<(Vec<Principal>, i64), DatabaseError>;

    async fn count(&self, role: Role, search: Option<&str>) -> Result<i64, DatabaseError>;

    async fn create(&self, record: PrincipalRecord) -> Result<Principal, DatabaseError>;

    /// Persists every mutable column of `principal`, refreshing `updated_at`.
    async fn update(&self, principal: &Principal) -> Result<Principal, DatabaseError>;

    async fn record_login(&self, role: Role, id: i64, at: DateTime<Utc>)
        -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait CourseStore: Send + Sync {
    async fn find_course(&self, id: i64) -> Result<Option<Course>, DatabaseError>;

    async fn find_courses(&self, query: &ListQuery) -> Result<(Vec<Course>, i64), DatabaseError>;

    async fn count_courses(&self, search: Option<&str>) -> Result<i64, DatabaseError>;

    async fn create_course(&self, record: CourseRecord) -> Result<Course, DatabaseError>;

    async fn update_course(&self, course: &Course) -> Result<Course, DatabaseError>;
}
