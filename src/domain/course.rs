//! Courses: the auxiliary catalog records instructors publish.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_COURSE_STATUS: &str = "draft";

/// Allowed sort columns; the first one is the default.
pub const COURSE_SORT_FIELDS: &[&str] = &[
    "course_id",
    "course_title",
    "course_status",
    "created_at",
    "updated_at",
];

/// Columns searched by course listings.
pub const COURSE_SEARCH_FIELDS: &[&str] = &[
    "course_title",
    "course_status",
    "course_level",
    "course_language",
];

/// Descriptive course attributes, all optional. Doubles as a change set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseDetails {
    pub course_description: Option<String>,
    pub course_thumbnail: Option<String>,
    pub course_level: Option<String>,
    pub course_language: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub estimated_comp_time: Option<i32>,
    pub course_duration: Option<i32>,
    pub published_at: Option<DateTime<Utc>>,
}

impl CourseDetails {
    pub fn apply(&mut self, changes: CourseDetails) {
        let CourseDetails {
            course_description,
            course_thumbnail,
            course_level,
            course_language,
            meta_title,
            meta_description,
            meta_keywords,
            estimated_comp_time,
            course_duration,
            published_at,
        } = changes;

        overwrite(&mut self.course_description, course_description);
        overwrite(&mut self.course_thumbnail, course_thumbnail);
        overwrite(&mut self.course_level, course_level);
        overwrite(&mut self.course_language, course_language);
        overwrite(&mut self.meta_title, meta_title);
        overwrite(&mut self.meta_description, meta_description);
        overwrite(&mut self.meta_keywords, meta_keywords);
        overwrite(&mut self.estimated_comp_time, estimated_comp_time);
        overwrite(&mut self.course_duration, course_duration);
        overwrite(&mut self.published_at, published_at);
    }
}

fn overwrite<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Content counters kept on every course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseTotals {
    pub total_modules: i32,
    pub total_lectures: i32,
    pub total_videos: i32,
    pub total_resources: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub course_id: i64,
    pub course_title: String,
    #[serde(flatten)]
    pub details: CourseDetails,
    #[serde(flatten)]
    pub totals: CourseTotals,
    pub course_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Course creation input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
    pub course_title: String,
    #[serde(flatten)]
    pub details: CourseDetails,
    #[serde(default)]
    pub total_modules: Option<i32>,
    #[serde(default)]
    pub total_lectures: Option<i32>,
    #[serde(default)]
    pub total_videos: Option<i32>,
    #[serde(default)]
    pub total_resources: Option<i32>,
    #[serde(default)]
    pub course_status: Option<String>,
}

/// Partial course update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CourseChanges {
    pub course_title: Option<String>,
    #[serde(flatten)]
    pub details: CourseDetails,
    pub total_modules: Option<i32>,
    pub total_lectures: Option<i32>,
    pub total_videos: Option<i32>,
    pub total_resources: Option<i32>,
    pub course_status: Option<String>,
}

/// What a store needs to create a course.
#[derive(Debug, Clone)]
pub struct CourseRecord {
    pub course_title: String,
    pub details: CourseDetails,
    pub totals: CourseTotals,
    pub course_status: String,
}

impl Course {
    /// Applies a change set in place.
    pub fn apply(&mut self, changes: CourseChanges) {
        let CourseChanges {
            course_title,
            details,
            total_modules,
            total_lectures,
            total_videos,
            total_resources,
            course_status,
        } = changes;

        if let Some(title) = course_title {
            self.course_title = title;
        }
        self.details.apply(details);
        self.totals.total_modules = total_modules.unwrap_or(self.totals.total_modules);
        self.totals.total_lectures = total_lectures.unwrap_or(self.totals.total_lectures);
        self.totals.total_videos = total_videos.unwrap_or(self.totals.total_videos);
        self.totals.total_resources = total_resources.unwrap_or(self.totals.total_resources);
        if let Some(status) = course_status {
            self.course_status = status;
        }
    }
}
