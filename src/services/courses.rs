use std::sync::Arc;

use crate::domain::{
    Course, CourseChanges, CourseRecord, CourseTotals, NewCourse, COURSE_SORT_FIELDS,
    DEFAULT_COURSE_STATUS,
};
use crate::error::{AppError, DatabaseError, ErrorContext};
use crate::listing::{ListParams, Page};
use crate::store::CourseStore;
use crate::validators::validate_required_text;

const ENTITY: &str = "course";

/// Course catalog operations.
#[derive(Clone)]
pub struct CourseService {
    store: Arc<dyn CourseStore>,
}

impl CourseService {
    pub fn new(store: Arc<dyn CourseStore>) -> Self {
        Self { store }
    }

    pub async fn create_course(&self, input: NewCourse) -> Result<Course, AppError> {
        let context = ErrorContext::new("course_creation");

        validate_required_text("course_title", &input.course_title)?;

        let course_status = match input.course_status {
            Some(status) => {
                validate_required_text("course_status", &status)?;
                status.trim().to_string()
            }
            None => DEFAULT_COURSE_STATUS.to_string(),
        };

        let record = CourseRecord {
            course_title: input.course_title.trim().to_string(),
            details: input.details,
            totals: CourseTotals {
                total_modules: input.total_modules.unwrap_or(0),
                total_lectures: input.total_lectures.unwrap_or(0),
                total_videos: input.total_videos.unwrap_or(0),
                total_resources: input.total_resources.unwrap_or(0),
            },
            course_status,
        };

        let course = self.store.create_course(record).await.map_err(|e| {
            let err = AppError::Store(e);
            context.log_error(&err);
            err
        })?;

        tracing::info!(
            request_id = %context.request_id,
            course_id = course.course_id,
            "Course created"
        );

        Ok(course)
    }

    /// Partial update; only supplied fields change.
    pub async fn update_course(&self, id: i64, changes: CourseChanges) -> Result<Course, AppError> {
        if let Some(title) = &changes.course_title {
            validate_required_text("course_title", title)?;
        }
        if let Some(status) = &changes.course_status {
            validate_required_text("course_status", status)?;
        }

        let mut course = self.get_course(id).await?;
        course.apply(changes);
        course.course_title = course.course_title.trim().to_string();
        course.course_status = course.course_status.trim().to_string();

        match self.store.update_course(&course).await {
            Ok(updated) => Ok(updated),
            Err(DatabaseError::NotFound(_)) => Err(AppError::NotFound { entity: ENTITY, id }),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_course(&self, id: i64) -> Result<Course, AppError> {
        self.store
            .find_course(id)
            .await?
            .ok_or(AppError::NotFound { entity: ENTITY, id })
    }

    pub async fn list_courses(&self, params: &ListParams) -> Result<Page<Course>, AppError> {
        let query = params.resolve(COURSE_SORT_FIELDS);
        let total_count = self.store.count_courses(None).await?;
        let (items, filtered_count) = self.store.find_courses(&query).await?;

        Ok(Page {
            items,
            total_count,
            filtered_count,
            page: query.page,
            per_page: query.per_page,
        })
    }
}
