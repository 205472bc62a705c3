//! Business logic services for the application layer.

pub mod auth_service;
pub mod authorization_service;
pub mod enrollment_service;
pub mod plan_service;
pub mod student_service;

pub use auth_service::AuthService;
pub use authorization_service::{AuthorizationGate, UserAuthorizationGate};
pub use enrollment_service::{
    CreateEnrollmentInput, EnrollmentCreated, EnrollmentService, NotificationStatus,
};
pub use plan_service::{PlanInput, PlanService, PlanUpdateInput};
pub use student_service::{StudentInput, StudentService, StudentUpdateInput};
