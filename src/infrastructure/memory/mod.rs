//! Thread-safe in-process implementations of the domain repositories.
//!
//! All repositories created from one [`InMemoryDatabase`] share the same tables,
//! so enrollments can be joined with their plan and student and plans still in
//! use cannot be deleted, exactly as with the PostgreSQL schema.
//!
//! Used for tests and for running the service without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::domain::entities::{
    Enrollment, EnrollmentDetail, NewEnrollment, NewPlan, NewStudent, NewUser, Plan, PlanPatch,
    Student, StudentPatch, User,
};
use crate::domain::repositories::{
    ApiToken, EnrollmentRepository, PlanRepository, StudentRepository, TokenRepository,
    UserRepository,
};
use crate::error::{AppError, Resource};

#[derive(Default)]
struct Tables {
    next_id: i64,
    students: BTreeMap<i64, Student>,
    plans: BTreeMap<i64, Plan>,
    enrollments: BTreeMap<i64, Enrollment>,
    users: BTreeMap<i64, User>,
    tokens: BTreeMap<i64, ApiToken>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn detail(&self, enrollment: &Enrollment) -> Option<EnrollmentDetail> {
        let plan = self.plans.get(&enrollment.plan_id)?;
        let student = self.students.get(&enrollment.student_id)?;
        Some(EnrollmentDetail::from_parts(enrollment, plan, student))
    }
}

/// Shared storage behind the in-memory repositories.
#[derive(Default, Clone)]
pub struct InMemoryDatabase {
    tables: Arc<RwLock<Tables>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with [`AppError::Persistence`] (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::persistence(
                "Database write failed",
                json!({ "reason": "writes disabled" }),
            ));
        }
        Ok(())
    }

    pub fn students(&self) -> InMemoryStudentRepository {
        InMemoryStudentRepository { db: self.clone() }
    }

    pub fn plans(&self) -> InMemoryPlanRepository {
        InMemoryPlanRepository { db: self.clone() }
    }

    pub fn enrollments(&self) -> InMemoryEnrollmentRepository {
        InMemoryEnrollmentRepository { db: self.clone() }
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository { db: self.clone() }
    }

    pub fn tokens(&self) -> InMemoryTokenRepository {
        InMemoryTokenRepository { db: self.clone() }
    }

    /// Number of stored enrollments.
    pub async fn enrollment_count(&self) -> usize {
        self.tables.read().await.enrollments.len()
    }
}

fn email_taken(email: &str) -> AppError {
    AppError::conflict(
        "A student with this email is already registered",
        json!({ "email": email }),
    )
}

#[derive(Clone)]
pub struct InMemoryStudentRepository {
    db: InMemoryDatabase,
}

#[async_trait]
impl StudentRepository for InMemoryStudentRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Student>, AppError> {
        Ok(self.db.tables.read().await.students.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Student>, AppError> {
        let tables = self.db.tables.read().await;
        Ok(tables.students.values().find(|s| s.email == email).cloned())
    }

    async fn create(&self, new_student: NewStudent) -> Result<Student, AppError> {
        self.db.check_writable()?;
        let mut tables = self.db.tables.write().await;

        if tables.students.values().any(|s| s.email == new_student.email) {
            return Err(email_taken(&new_student.email));
        }

        let student = Student {
            id: tables.next_id(),
            name: new_student.name,
            email: new_student.email,
            age: new_student.age,
            weight: new_student.weight,
            height: new_student.height,
            created_at: Utc::now(),
        };
        tables.students.insert(student.id, student.clone());
        Ok(student)
    }

    async fn update(&self, id: i64, patch: StudentPatch) -> Result<Student, AppError> {
        self.db.check_writable()?;
        let mut tables = self.db.tables.write().await;

        if let Some(email) = &patch.email
            && tables
                .students
                .values()
                .any(|s| s.id != id && &s.email == email)
        {
            return Err(email_taken(email));
        }

        let student = tables
            .students
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(Resource::Student, json!({ "id": id })))?;
        *student = patch.apply(student);
        Ok(student.clone())
    }
}

#[derive(Clone)]
pub struct InMemoryPlanRepository {
    db: InMemoryDatabase,
}

#[async_trait]
impl PlanRepository for InMemoryPlanRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Plan>, AppError> {
        Ok(self.db.tables.read().await.plans.get(&id).cloned())
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Plan>, AppError> {
        let tables = self.db.tables.read().await;
        let mut plans: Vec<Plan> = tables.plans.values().cloned().collect();
        plans.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(plans
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn create(&self, new_plan: NewPlan) -> Result<Plan, AppError> {
        self.db.check_writable()?;
        let mut tables = self.db.tables.write().await;

        let plan = Plan::new(
            tables.next_id(),
            new_plan.title,
            new_plan.duration_months,
            new_plan.monthly_price,
            Utc::now(),
        );
        tables.plans.insert(plan.id, plan.clone());
        Ok(plan)
    }

    async fn update(&self, id: i64, patch: PlanPatch) -> Result<Plan, AppError> {
        self.db.check_writable()?;
        let mut tables = self.db.tables.write().await;

        let plan = tables
            .plans
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(Resource::Plan, json!({ "id": id })))?;
        *plan = patch.apply(plan);
        Ok(plan.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        self.db.check_writable()?;
        let mut tables = self.db.tables.write().await;

        if tables.enrollments.values().any(|e| e.plan_id == id) {
            return Err(AppError::conflict(
                "Record is still referenced",
                json!({ "constraint": "enrollments_plan_id_fkey" }),
            ));
        }

        Ok(tables.plans.remove(&id).is_some())
    }
}

#[derive(Clone)]
pub struct InMemoryEnrollmentRepository {
    db: InMemoryDatabase,
}

#[async_trait]
impl EnrollmentRepository for InMemoryEnrollmentRepository {
    async fn create(&self, new_enrollment: NewEnrollment) -> Result<Enrollment, AppError> {
        self.db.check_writable()?;
        let mut tables = self.db.tables.write().await;

        if !tables.students.contains_key(&new_enrollment.student_id)
            || !tables.plans.contains_key(&new_enrollment.plan_id)
        {
            return Err(AppError::persistence(
                "Database write failed",
                json!({ "reason": "foreign key violation" }),
            ));
        }

        let enrollment = Enrollment {
            id: tables.next_id(),
            student_id: new_enrollment.student_id,
            plan_id: new_enrollment.plan_id,
            start_date: new_enrollment.start_date,
            end_date: new_enrollment.end_date,
            price: new_enrollment.price,
            cancelled_at: None,
            created_at: Utc::now(),
        };
        tables.enrollments.insert(enrollment.id, enrollment.clone());
        Ok(enrollment)
    }

    async fn find_detail_by_id(&self, id: i64) -> Result<Option<EnrollmentDetail>, AppError> {
        let tables = self.db.tables.read().await;
        Ok(tables.enrollments.get(&id).and_then(|e| tables.detail(e)))
    }

    async fn list_details(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<EnrollmentDetail>, AppError> {
        let tables = self.db.tables.read().await;
        let mut enrollments: Vec<&Enrollment> = tables.enrollments.values().collect();
        enrollments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(enrollments
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .filter_map(|e| tables.detail(e))
            .collect())
    }

    async fn cancel(
        &self,
        id: i64,
        cancelled_at: DateTime<Utc>,
    ) -> Result<Option<Enrollment>, AppError> {
        self.db.check_writable()?;
        let mut tables = self.db.tables.write().await;

        match tables.enrollments.get_mut(&id) {
            Some(enrollment) if enrollment.cancelled_at.is_none() => {
                enrollment.cancelled_at = Some(cancelled_at);
                Ok(Some(enrollment.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[derive(Clone)]
pub struct InMemoryUserRepository {
    db: InMemoryDatabase,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.db.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.db.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        self.db.check_writable()?;
        let mut tables = self.db.tables.write().await;

        if tables.users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "users_email_key" }),
            ));
        }

        let user = User {
            id: tables.next_id(),
            name: new_user.name,
            email: new_user.email,
            administrator: new_user.administrator,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[derive(Clone)]
pub struct InMemoryTokenRepository {
    db: InMemoryDatabase,
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn find_user_id(&self, token_hash: &str) -> Result<Option<i64>, AppError> {
        let tables = self.db.tables.read().await;
        Ok(tables
            .tokens
            .values()
            .find(|t| t.token_hash == token_hash && t.revoked_at.is_none())
            .map(|t| t.user_id))
    }

    async fn update_last_used(&self, _token_hash: &str) -> Result<(), AppError> {
        Ok(())
    }

    async fn create_token(
        &self,
        user_id: i64,
        name: &str,
        token_hash: &str,
    ) -> Result<ApiToken, AppError> {
        self.db.check_writable()?;
        let mut tables = self.db.tables.write().await;

        let token = ApiToken {
            id: tables.next_id(),
            user_id,
            name: name.to_string(),
            token_hash: token_hash.to_string(),
            created_at: Utc::now(),
            revoked_at: None,
        };
        tables.tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn list_tokens(&self) -> Result<Vec<ApiToken>, AppError> {
        Ok(self.db.tables.read().await.tokens.values().cloned().collect())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ApiToken>, AppError> {
        let tables = self.db.tables.read().await;
        Ok(tables.tokens.values().find(|t| t.name == name).cloned())
    }

    async fn revoke_token(&self, id: i64) -> Result<bool, AppError> {
        self.db.check_writable()?;
        let mut tables = self.db.tables.write().await;

        match tables.tokens.get_mut(&id) {
            Some(token) if token.revoked_at.is_none() => {
                token.revoked_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
