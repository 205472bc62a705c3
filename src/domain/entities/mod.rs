//! Core domain entities of the enrollment service.
//!
//! # Entity Types
//!
//! - [`Plan`] - A priced membership duration template
//! - [`Student`] - A gym member
//! - [`Enrollment`] - A student bound to a plan for a computed window
//! - [`User`] - An API operator, possibly an administrator
//!
//! Entities follow the same pattern throughout: separate `New*` structs for
//! creation and `*Patch` structs for partial updates.

pub mod enrollment;
pub mod plan;
pub mod student;
pub mod user;

pub use enrollment::{
    Enrollment, EnrollmentDetail, EnrollmentState, NewEnrollment, PlanSummary, StudentSummary,
};
pub use plan::{NewPlan, Plan, PlanPatch};
pub use student::{NewStudent, Student, StudentPatch};
pub use user::{NewUser, Principal, User};
