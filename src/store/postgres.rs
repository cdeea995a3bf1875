/// PostgreSQL-backed store
///
/// One table per role (`students`, `instructors`, `admins`) plus `courses`.
/// Column lists are built from the role's [`RoleSpec`], so every identifier
/// spliced into SQL comes from a static allow-list; user input only ever
/// travels as a bind parameter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};

use super::{AccountStore, CourseStore};
use crate::domain::{
    Course, CourseDetails, CourseRecord, CourseTotals, Principal, PrincipalRecord, Profile,
    ProfileField, Role, RoleSpec, ACCOUNT_SEARCH_FIELDS, COURSE_SEARCH_FIELDS,
};
use crate::error::DatabaseError;
use crate::listing::{like_pattern, ListQuery};

const PASSWORD_COLUMN: &str = "password";

const COURSE_COLUMNS: &str = "course_id, course_title, course_description, course_thumbnail, \
     course_level, course_language, meta_title, meta_description, meta_keywords, \
     estimated_comp_time, course_duration, published_at, total_modules, total_lectures, \
     total_videos, total_resources, course_status, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// SQL builders
// ---------------------------------------------------------------------------

fn profile_columns(spec: &RoleSpec) -> Vec<&'static str> {
    spec.profile_fields.iter().map(|f| f.column()).collect()
}

fn account_columns(spec: &RoleSpec) -> String {
    let mut columns = vec![
        spec.id_column,
        "first_name",
        "last_name",
        "email",
        PASSWORD_COLUMN,
    ];
    columns.extend(profile_columns(spec));
    columns.extend([
        "account_status",
        "email_verified",
        "last_login",
        "password_last_change",
        "created_at",
        "updated_at",
    ]);
    columns.join(", ")
}

/// `(a ILIKE $n OR b ILIKE $n ...)`, one parameter reused for every column.
fn search_clause(fields: &[&str], param: usize) -> String {
    let terms: Vec<String> = fields
        .iter()
        .map(|field| format!("{} ILIKE ${}", field, param))
        .collect();
    format!("({})", terms.join(" OR "))
}

fn select_account_sql(spec: &RoleSpec, by_column: &str) -> String {
    format!(
        "SELECT {} FROM {} WHERE {} = $1",
        account_columns(spec),
        spec.table,
        by_column
    )
}

/// Paged listing. With a search the pattern is `$1`, followed by limit and
/// offset.
fn list_sql(
    table: &str,
    columns: &str,
    id_column: &str,
    search_fields: &[&str],
    query: &ListQuery,
) -> String {
    let (filter, next_param) = match query.search {
        Some(_) => (format!(" WHERE {}", search_clause(search_fields, 1)), 2),
        None => (String::new(), 1),
    };
    format!(
        "SELECT {} FROM {}{} ORDER BY {} {}, {} ASC LIMIT ${} OFFSET ${}",
        columns,
        table,
        filter,
        query.sort_field,
        query.sort_order.as_sql(),
        id_column,
        next_param,
        next_param + 1
    )
}

fn count_sql(table: &str, search_fields: &[&str], searching: bool) -> String {
    if searching {
        format!(
            "SELECT COUNT(*) FROM {} WHERE {}",
            table,
            search_clause(search_fields, 1)
        )
    } else {
        format!("SELECT COUNT(*) FROM {}", table)
    }
}

fn insert_account_sql(spec: &RoleSpec) -> String {
    let mut columns = vec!["first_name", "last_name", "email", PASSWORD_COLUMN];
    columns.extend(profile_columns(spec));
    columns.extend(["account_status", "email_verified"]);

    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        spec.table,
        columns.join(", "),
        placeholders.join(", "),
        account_columns(spec)
    )
}

fn update_account_sql(spec: &RoleSpec) -> String {
    let mut columns = vec!["first_name", "last_name", "email", PASSWORD_COLUMN];
    columns.extend(profile_columns(spec));
    columns.extend(["account_status", "email_verified", "password_last_change"]);

    let assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{} = ${}", column, i + 1))
        .collect();
    format!(
        "UPDATE {} SET {}, updated_at = now() WHERE {} = ${} RETURNING {}",
        spec.table,
        assignments.join(", "),
        spec.id_column,
        columns.len() + 1,
        account_columns(spec)
    )
}

// ---------------------------------------------------------------------------
// Binding and row mapping
// ---------------------------------------------------------------------------

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// Binds the role's profile columns, in `profile_fields` order.
fn bind_profile<'q>(mut query: PgQuery<'q>, spec: &RoleSpec, profile: &Profile) -> PgQuery<'q> {
    for field in spec.profile_fields {
        query = match field {
            ProfileField::YearOfExperience => query.bind(profile.year_of_experience),
            text => query.bind(profile.text(*text).map(str::to_string)),
        };
    }
    query
}

fn principal_from_row(role: Role, row: &PgRow) -> Result<Principal, sqlx::Error> {
    let spec = role.spec();
    let mut profile = Profile::default();
    for field in spec.profile_fields {
        if *field == ProfileField::YearOfExperience {
            profile.year_of_experience = row.try_get(field.column())?;
        } else if let Some(slot) = profile.text_mut(*field) {
            *slot = row.try_get(field.column())?;
        }
    }

    Ok(Principal {
        id: row.try_get(spec.id_column)?,
        role,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get(PASSWORD_COLUMN)?,
        profile,
        account_status: row.try_get("account_status")?,
        email_verified: row.try_get("email_verified")?,
        last_login: row.try_get("last_login")?,
        password_last_change: row.try_get("password_last_change")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn course_from_row(row: &PgRow) -> Result<Course, sqlx::Error> {
    Ok(Course {
        course_id: row.try_get("course_id")?,
        course_title: row.try_get("course_title")?,
        details: CourseDetails {
            course_description: row.try_get("course_description")?,
            course_thumbnail: row.try_get("course_thumbnail")?,
            course_level: row.try_get("course_level")?,
            course_language: row.try_get("course_language")?,
            meta_title: row.try_get("meta_title")?,
            meta_description: row.try_get("meta_description")?,
            meta_keywords: row.try_get("meta_keywords")?,
            estimated_comp_time: row.try_get("estimated_comp_time")?,
            course_duration: row.try_get("course_duration")?,
            published_at: row.try_get("published_at")?,
        },
        totals: CourseTotals {
            total_modules: row.try_get("total_modules")?,
            total_lectures: row.try_get("total_lectures")?,
            total_videos: row.try_get("total_videos")?,
            total_resources: row.try_get("total_resources")?,
        },
        course_status: row.try_get("course_status")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn bind_course_fields<'q>(
    query: PgQuery<'q>,
    title: &str,
    details: &CourseDetails,
    totals: &CourseTotals,
    status: &str,
) -> PgQuery<'q> {
    query
        .bind(title.to_string())
        .bind(details.course_description.clone())
        .bind(details.course_thumbnail.clone())
        .bind(details.course_level.clone())
        .bind(details.course_language.clone())
        .bind(details.meta_title.clone())
        .bind(details.meta_description.clone())
        .bind(details.meta_keywords.clone())
        .bind(details.estimated_comp_time)
        .bind(details.course_duration)
        .bind(details.published_at)
        .bind(totals.total_modules)
        .bind(totals.total_lectures)
        .bind(totals.total_videos)
        .bind(totals.total_resources)
        .bind(status.to_string())
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[async_trait]
impl AccountStore for PgStore {
    async fn find_by_id(&self, role: Role, id: i64) -> Result<Option<Principal>, DatabaseError> {
        let spec = role.spec();
        let sql = select_account_sql(spec, spec.id_column);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| principal_from_row(role, &r)).transpose()?)
    }

    async fn find_by_email(
        &self,
        role: Role,
        email: &str,
    ) -> Result<Option<Principal>, DatabaseError> {
        let sql = select_account_sql(role.spec(), "email");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| principal_from_row(role, &r)).transpose()?)
    }

    async fn find_many(
        &self,
        role: Role,
        query: &ListQuery,
    ) -> Result<(Vec<Principal>, i64), DatabaseError> {
        let spec = role.spec();
        let sql = list_sql(
            spec.table,
            &account_columns(spec),
            spec.id_column,
            ACCOUNT_SEARCH_FIELDS,
            query,
        );

        let mut select = sqlx::query(&sql);
        if let Some(search) = &query.search {
            select = select.bind(like_pattern(search));
        }
        let rows = select
            .bind(query.limit())
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .iter()
            .map(|r| principal_from_row(role, r))
            .collect::<Result<Vec<_>, _>>()?;
        let filtered_count = self.count(role, query.search.as_deref()).await?;
        Ok((items, filtered_count))
    }

    async fn count(&self, role: Role, search: Option<&str>) -> Result<i64, DatabaseError> {
        let sql = count_sql(role.spec().table, ACCOUNT_SEARCH_FIELDS, search.is_some());
        let mut select = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(search) = search {
            select = select.bind(like_pattern(search));
        }
        Ok(select.fetch_one(&self.pool).await?)
    }

    async fn create(&self, record: PrincipalRecord) -> Result<Principal, DatabaseError> {
        let spec = record.role.spec();
        let sql = insert_account_sql(spec);

        let insert = sqlx::query(&sql)
            .bind(record.first_name.clone())
            .bind(record.last_name.clone())
            .bind(record.email.clone())
            .bind(record.password_hash.clone());
        let row = bind_profile(insert, spec, &record.profile)
            .bind(record.account_status.clone())
            .bind(record.email_verified)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(role = %record.role, email = %record.email, "Account row inserted");
        Ok(principal_from_row(record.role, &row)?)
    }

    async fn update(&self, principal: &Principal) -> Result<Principal, DatabaseError> {
        let spec = principal.role.spec();
        let sql = update_account_sql(spec);

        let update = sqlx::query(&sql)
            .bind(principal.first_name.clone())
            .bind(principal.last_name.clone())
            .bind(principal.email.clone())
            .bind(principal.password_hash.clone());
        let row = bind_profile(update, spec, &principal.profile)
            .bind(principal.account_status.clone())
            .bind(principal.email_verified)
            .bind(principal.password_last_change)
            .bind(principal.id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                DatabaseError::NotFound(format!("{} {}", principal.role, principal.id))
            })?;

        Ok(principal_from_row(principal.role, &row)?)
    }

    async fn record_login(
        &self,
        role: Role,
        id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let spec = role.spec();
        let sql = format!(
            "UPDATE {} SET last_login = $1 WHERE {} = $2",
            spec.table, spec.id_column
        );
        let result = sqlx::query(&sql)
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("{} {}", role, id)));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Courses
// ---------------------------------------------------------------------------

#[async_trait]
impl CourseStore for PgStore {
    async fn find_course(&self, id: i64) -> Result<Option<Course>, DatabaseError> {
        let sql = format!("SELECT {} FROM courses WHERE course_id = $1", COURSE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| course_from_row(&r)).transpose()?)
    }

    async fn find_courses(&self, query: &ListQuery) -> Result<(Vec<Course>, i64), DatabaseError> {
        let sql = list_sql(
            "courses",
            COURSE_COLUMNS,
            "course_id",
            COURSE_SEARCH_FIELDS,
            query,
        );

        let mut select = sqlx::query(&sql);
        if let Some(search) = &query.search {
            select = select.bind(like_pattern(search));
        }
        let rows = select
            .bind(query.limit())
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .iter()
            .map(course_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        let filtered_count = self.count_courses(query.search.as_deref()).await?;
        Ok((items, filtered_count))
    }

    async fn count_courses(&self, search: Option<&str>) -> Result<i64, DatabaseError> {
        let sql = count_sql("courses", COURSE_SEARCH_FIELDS, search.is_some());
        let mut select = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(search) = search {
            select = select.bind(like_pattern(search));
        }
        Ok(select.fetch_one(&self.pool).await?)
    }

    async fn create_course(&self, record: CourseRecord) -> Result<Course, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO courses
            (course_title, course_description, course_thumbnail, course_level, course_language,
             meta_title, meta_description, meta_keywords, estimated_comp_time, course_duration,
             published_at, total_modules, total_lectures, total_videos, total_resources,
             course_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {}
            "#,
            COURSE_COLUMNS
        );

        let row = bind_course_fields(
            sqlx::query(&sql),
            &record.course_title,
            &record.details,
            &record.totals,
            &record.course_status,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(course_from_row(&row)?)
    }

    async fn update_course(&self, course: &Course) -> Result<Course, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE courses SET
            course_title = $1, course_description = $2, course_thumbnail = $3,
            course_level = $4, course_language = $5, meta_title = $6, meta_description = $7,
            meta_keywords = $8, estimated_comp_time = $9, course_duration = $10,
            published_at = $11, total_modules = $12, total_lectures = $13, total_videos = $14,
            total_resources = $15, course_status = $16, updated_at = now()
            WHERE course_id = $17
            RETURNING {}
            "#,
            COURSE_COLUMNS
        );

        let row = bind_course_fields(
            sqlx::query(&sql),
            &course.course_title,
            &course.details,
            &course.totals,
            &course.course_status,
        )
        .bind(course.course_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("course {}", course.course_id)))?;

        Ok(course_from_row(&row)?)
    }
}
