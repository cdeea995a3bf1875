//! Domain records shared by the services, stores and routes.

mod course;
mod principal;
mod role;

pub use course::{
    Course, CourseChanges, CourseDetails, CourseRecord, CourseTotals, NewCourse,
    COURSE_SEARCH_FIELDS, COURSE_SORT_FIELDS, DEFAULT_COURSE_STATUS,
};
pub use principal::{
    NewPrincipal, Principal, PrincipalChanges, PrincipalRecord, PrincipalView, Profile,
    PublicProfile, SessionResponse, DEFAULT_ACCOUNT_STATUS,
};
pub use role::{ProfileField, Role, RoleSpec, ACCOUNT_SEARCH_FIELDS};
