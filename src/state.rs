//! Shared application state injected into every handler.

use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::application::services::{
    AuthService, AuthorizationGate, EnrollmentService, PlanService, StudentService,
    UserAuthorizationGate,
};
use crate::domain::clock::Clock;
use crate::domain::repositories::{
    EnrollmentRepository, PlanRepository, StudentRepository, TokenRepository, UserRepository,
};
use crate::infrastructure::memory::InMemoryDatabase;
use crate::infrastructure::persistence::{
    PgEnrollmentRepository, PgPlanRepository, PgStudentRepository, PgTokenRepository,
    PgUserRepository,
};
use crate::infrastructure::queue::JobQueue;

/// The set of repositories the services are built from.
#[derive(Clone)]
pub struct Repositories {
    pub students: Arc<dyn StudentRepository>,
    pub plans: Arc<dyn PlanRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenRepository>,
}

impl Repositories {
    pub fn postgres(pool: Arc<PgPool>) -> Self {
        Self {
            students: Arc::new(PgStudentRepository::new(pool.clone())),
            plans: Arc::new(PgPlanRepository::new(pool.clone())),
            enrollments: Arc::new(PgEnrollmentRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            tokens: Arc::new(PgTokenRepository::new(pool)),
        }
    }

    pub fn in_memory(db: &InMemoryDatabase) -> Self {
        Self {
            students: Arc::new(db.students()),
            plans: Arc::new(db.plans()),
            enrollments: Arc::new(db.enrollments()),
            users: Arc::new(db.users()),
            tokens: Arc::new(db.tokens()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub enrollment_service: Arc<EnrollmentService>,
    pub plan_service: Arc<PlanService>,
    pub student_service: Arc<StudentService>,
    pub auth_service: Arc<AuthService>,
    pub queue: Arc<dyn JobQueue>,
    /// Deadline applied to enrollment creation requests.
    pub request_timeout: Duration,
}

impl AppState {
    /// Wires the services on top of the given repositories and queue.
    pub fn new(
        repositories: Repositories,
        queue: Arc<dyn JobQueue>,
        clock: Arc<dyn Clock>,
        signing_secret: String,
        request_timeout: Duration,
    ) -> Self {
        let gate: Arc<dyn AuthorizationGate> =
            Arc::new(UserAuthorizationGate::new(repositories.users.clone()));

        let enrollment_service = Arc::new(EnrollmentService::new(
            repositories.students.clone(),
            repositories.plans.clone(),
            repositories.enrollments.clone(),
            gate.clone(),
            queue.clone(),
            clock,
        ));
        let plan_service = Arc::new(PlanService::new(repositories.plans.clone(), gate.clone()));
        let student_service = Arc::new(StudentService::new(repositories.students.clone(), gate));
        let auth_service = Arc::new(AuthService::new(repositories.tokens, signing_secret));

        Self {
            enrollment_service,
            plan_service,
            student_service,
            auth_service,
            queue,
            request_timeout,
        }
    }
}
