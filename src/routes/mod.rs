pub mod accounts;
pub mod courses;
mod health_check;

pub use health_check::health_check;
