//! Process-local store with the same uniqueness and ordering rules as the
//! PostgreSQL tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{AccountStore, CourseStore};
use crate::domain::{Course, CourseRecord, Principal, PrincipalRecord, Role};
use crate::error::DatabaseError;
use crate::listing::{matches_search, ListQuery, SortOrder};

#[derive(Default)]
struct Tables {
    accounts: HashMap<Role, Vec<Principal>>,
    next_account_id: HashMap<Role, i64>,
    courses: Vec<Course>,
    next_course_id: i64,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

/// Sortable value extracted from a record.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum SortKey<'a> {
    Int(i64),
    Text(&'a str),
    Time(DateTime<Utc>),
}

fn account_sort_key<'a>(p: &'a Principal, field: &str) -> SortKey<'a> {
    match field {
        "first_name" => SortKey::Text(&p.first_name),
        "last_name" => SortKey::Text(&p.last_name),
        "email" => SortKey::Text(&p.email),
        "account_status" => SortKey::Text(&p.account_status),
        "created_at" => SortKey::Time(p.created_at),
        "updated_at" => SortKey::Time(p.updated_at),
        _ => SortKey::Int(p.id),
    }
}

fn course_sort_key<'a>(c: &'a Course, field: &str) -> SortKey<'a> {
    match field {
        "course_title" => SortKey::Text(&c.course_title),
        "course_status" => SortKey::Text(&c.course_status),
        "created_at" => SortKey::Time(c.created_at),
        "updated_at" => SortKey::Time(c.updated_at),
        _ => SortKey::Int(c.course_id),
    }
}

fn account_matches(p: &Principal, search: Option<&str>) -> bool {
    match search {
        Some(needle) => matches_search(
            needle,
            [Some(p.first_name.as_str()), Some(p.last_name.as_str()), Some(p.email.as_str())],
        ),
        None => true,
    }
}

fn course_matches(c: &Course, search: Option<&str>) -> bool {
    match search {
        Some(needle) => matches_search(
            needle,
            [
                Some(c.course_title.as_str()),
                Some(c.course_status.as_str()),
                c.details.course_level.as_deref(),
                c.details.course_language.as_deref(),
            ],
        ),
        None => true,
    }
}

/// Sorts by the key, ties broken by ascending id, then slices out the page.
fn paginate<T: Clone>(
    mut rows: Vec<&T>,
    query: &ListQuery,
    key: impl for<'a> Fn(&'a T, &str) -> SortKey<'a>,
    id: impl Fn(&T) -> i64,
) -> Vec<T> {
    rows.sort_by(|a, b| {
        let (a, b): (&T, &T) = (*a, *b);
        let ordering = key(a, query.sort_field).cmp(&key(b, query.sort_field));
        let ordering = match query.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        };
        match ordering {
            Ordering::Equal => id(a).cmp(&id(b)),
            other => other,
        }
    });

    let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(query.limit()).unwrap_or(0);
    rows.into_iter().skip(offset).take(limit).cloned().collect()
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, DatabaseError> {
        self.tables
            .read()
            .map_err(|_| DatabaseError::UnexpectedError("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, DatabaseError> {
        self.tables
            .write()
            .map_err(|_| DatabaseError::UnexpectedError("store lock poisoned".to_string()))
    }
}

fn email_taken(rows: &[Principal], email: &str, except_id: Option<i64>) -> bool {
    rows.iter()
        .any(|p| p.email == email && Some(p.id) != except_id)
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn find_by_id(&self, role: Role, id: i64) -> Result<Option<Principal>, DatabaseError> {
        let tables = self.read()?;
        Ok(tables
            .accounts
            .get(&role)
            .and_then(|rows| rows.iter().find(|p| p.id == id))
            .cloned())
    }

    async fn find_by_email(
        &self,
        role: Role,
        email: &str,
    ) -> Result<Option<Principal>, DatabaseError> {
        let tables = self.read()?;
        Ok(tables
            .accounts
            .get(&role)
            .and_then(|rows| rows.iter().find(|p| p.email == email))
            .cloned())
    }

    async fn find_many(
        &self,
        role: Role,
        query: &ListQuery,
    ) -> Result<(Vec<Principal>, i64), DatabaseError> {
        let tables = self.read()?;
        let matching: Vec<&Principal> = tables
            .accounts
            .get(&role)
            .map(|rows| {
                rows.iter()
                    .filter(|p| account_matches(p, query.search.as_deref()))
                    .collect()
            })
            .unwrap_or_default();

        let filtered_count = matching.len() as i64;
        let items = paginate(matching, query, account_sort_key, |p| p.id);
        Ok((items, filtered_count))
    }

    async fn count(&self, role: Role, search: Option<&str>) -> Result<i64, DatabaseError> {
        let tables = self.read()?;
        Ok(tables
            .accounts
            .get(&role)
            .map(|rows| rows.iter().filter(|p| account_matches(p, search)).count())
            .unwrap_or(0) as i64)
    }

    async fn create(&self, record: PrincipalRecord) -> Result<Principal, DatabaseError> {
        let mut tables = self.write()?;
        let role = record.role;

        if tables
            .accounts
            .get(&role)
            .map_or(false, |rows| email_taken(rows, &record.email, None))
        {
            return Err(DatabaseError::UniqueConstraintViolation(format!(
                "{}_email_key",
                role.spec().table
            )));
        }

        let next_id = tables.next_account_id.entry(role).or_insert(0);
        *next_id += 1;
        let id = *next_id;

        let now = Utc::now();
        let principal = Principal {
            id,
            role,
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            password_hash: record.password_hash,
            profile: record.profile,
            account_status: record.account_status,
            email_verified: record.email_verified,
            last_login: None,
            password_last_change: None,
            created_at: now,
            updated_at: now,
        };

        tables.accounts.entry(role).or_default().push(principal.clone());
        Ok(principal)
    }

    async fn update(&self, principal: &Principal) -> Result<Principal, DatabaseError> {
        let mut tables = self.write()?;
        let rows = tables.accounts.entry(principal.role).or_default();

        if email_taken(rows, &principal.email, Some(principal.id)) {
            return Err(DatabaseError::UniqueConstraintViolation(format!(
                "{}_email_key",
                principal.role.spec().table
            )));
        }

        let stored = rows
            .iter_mut()
            .find(|p| p.id == principal.id)
            .ok_or_else(|| {
                DatabaseError::NotFound(format!("{} {}", principal.role, principal.id))
            })?;

        let (created_at, last_login) = (stored.created_at, stored.last_login);
        *stored = principal.clone();
        stored.created_at = created_at;
        stored.last_login = last_login;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn record_login(
        &self,
        role: Role,
        id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let mut tables = self.write()?;
        let stored = tables
            .accounts
            .get_mut(&role)
            .and_then(|rows| rows.iter_mut().find(|p| p.id == id))
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {}", role, id)))?;

        stored.last_login = Some(at);
        Ok(())
    }
}

#[async_trait]
impl CourseStore for InMemoryStore {
    async fn find_course(&self, id: i64) -> Result<Option<Course>, DatabaseError> {
        let tables = self.read()?;
        Ok(tables.courses.iter().find(|c| c.course_id == id).cloned())
    }

    async fn find_courses(&self, query: &ListQuery) -> Result<(Vec<Course>, i64), DatabaseError> {
        let tables = self.read()?;
        let matching: Vec<&Course> = tables
            .courses
            .iter()
            .filter(|c| course_matches(c, query.search.as_deref()))
            .collect();

        let filtered_count = matching.len() as i64;
        let items = paginate(matching, query, course_sort_key, |c| c.course_id);
        Ok((items, filtered_count))
    }

    async fn count_courses(&self, search: Option<&str>) -> Result<i64, DatabaseError> {
        let tables = self.read()?;
        Ok(tables.courses.iter().filter(|c| course_matches(c, search)).count() as i64)
    }

    async fn create_course(&self, record: CourseRecord) -> Result<Course, DatabaseError> {
        let mut tables = self.write()?;
        tables.next_course_id += 1;

        let now = Utc::now();
        let course = Course {
            course_id: tables.next_course_id,
            course_title: record.course_title,
            details: record.details,
            totals: record.totals,
            course_status: record.course_status,
            created_at: now,
            updated_at: now,
        };

        tables.courses.push(course.clone());
        Ok(course)
    }

    async fn update_course(&self, course: &Course) -> Result<Course, DatabaseError> {
        let mut tables = self.write()?;
        let stored = tables
            .courses
            .iter_mut()
            .find(|c| c.course_id == course.course_id)
            .ok_or_else(|| DatabaseError::NotFound(format!("course {}", course.course_id)))?;

        let created_at = stored.created_at;
        *stored = course.clone();
        stored.created_at = created_at;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }
}
