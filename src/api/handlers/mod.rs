//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod enrollments;
pub mod health;
pub mod plans;
pub mod students;

pub use enrollments::{
    cancel_enrollment_handler, create_enrollment_handler, enrollment_list_handler,
};
pub use health::health_handler;
pub use plans::{create_plan_handler, delete_plan_handler, plan_list_handler, update_plan_handler};
pub use students::{create_student_handler, get_student_handler, update_student_handler};
