/// Services module
///
/// Business operations over the record stores. Routes stay thin and call
/// into these.

mod accounts;
mod courses;

pub use accounts::AccountService;
pub use courses::CourseService;
