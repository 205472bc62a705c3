//! Student registration and profile updates.

use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::application::services::authorization_service::{
    AuthorizationGate, require_administrator,
};
use crate::domain::entities::{NewStudent, Principal, Student, StudentPatch};
use crate::domain::repositories::StudentRepository;
use crate::error::{AppError, Resource};

/// Input for registering a student. Every field is required.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct StudentInput {
    #[validate(required, length(min = 1, max = 120))]
    pub name: Option<String>,

    #[validate(required, email)]
    pub email: Option<String>,

    #[validate(required, range(min = 1, max = 150))]
    pub age: Option<i32>,

    #[validate(required, range(exclusive_min = 0.0))]
    pub weight: Option<f64>,

    #[validate(required, range(exclusive_min = 0.0))]
    pub height: Option<f64>,
}

/// Partial student update. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct StudentUpdateInput {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(range(min = 1, max = 150))]
    pub age: Option<i32>,

    #[validate(range(exclusive_min = 0.0))]
    pub weight: Option<f64>,

    #[validate(range(exclusive_min = 0.0))]
    pub height: Option<f64>,
}

pub struct StudentService {
    students: Arc<dyn StudentRepository>,
    gate: Arc<dyn AuthorizationGate>,
}

impl StudentService {
    pub fn new(students: Arc<dyn StudentRepository>, gate: Arc<dyn AuthorizationGate>) -> Self {
        Self { students, gate }
    }

    pub async fn get_student(&self, id: i64) -> Result<Student, AppError> {
        self.students
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(Resource::Student, json!({ "id": id })))
    }

    /// Registers a student.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the email is already registered.
    pub async fn create_student(
        &self,
        input: StudentInput,
        principal: Principal,
    ) -> Result<Student, AppError> {
        input.validate()?;
        require_administrator(self.gate.as_ref(), principal).await?;

        let (Some(name), Some(email), Some(age), Some(weight), Some(height)) = (
            input.name,
            input.email,
            input.age,
            input.weight,
            input.height,
        ) else {
            return Err(AppError::bad_request("Validation failed", json!({})));
        };

        if self.students.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict(
                "A student with this email is already registered",
                json!({ "email": email }),
            ));
        }

        let student = self
            .students
            .create(NewStudent {
                name,
                email,
                age,
                weight,
                height,
            })
            .await?;

        info!(student_id = student.id, "Student registered");
        Ok(student)
    }

    /// Updates a student's profile.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if the student does not exist
    /// - [`AppError::Conflict`] if the new email belongs to another student
    pub async fn update_student(
        &self,
        id: i64,
        input: StudentUpdateInput,
        principal: Principal,
    ) -> Result<Student, AppError> {
        input.validate()?;
        require_administrator(self.gate.as_ref(), principal).await?;

        let current = self.get_student(id).await?;

        if let Some(email) = input.email.as_deref()
            && email != current.email
            && self.students.find_by_email(email).await?.is_some()
        {
            return Err(AppError::conflict(
                "A student with this email is already registered",
                json!({ "email": email }),
            ));
        }

        let patch = StudentPatch {
            name: input.name,
            email: input.email,
            age: input.age,
            weight: input.weight,
            height: input.height,
        };

        let student = self.students.update(id, patch).await?;
        info!(student_id = id, "Student updated");
        Ok(student)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::authorization_service::MockAuthorizationGate;
    use crate::domain::repositories::MockStudentRepository;
    use chrono::Utc;

    fn gate(allowed: bool) -> Arc<MockAuthorizationGate> {
        let mut gate = MockAuthorizationGate::new();
        gate.expect_is_administrator().returning(move |_| allowed);
        Arc::new(gate)
    }

    fn diego() -> Student {
        Student {
            id: 3,
            name: "Diego Fernandes".to_string(),
            email: "diego@gym.local".to_string(),
            age: 23,
            weight: 60.5,
            height: 1.71,
            created_at: Utc::now(),
        }
    }

    fn input() -> StudentInput {
        StudentInput {
            name: Some("Diego Fernandes".to_string()),
            email: Some("diego@gym.local".to_string()),
            age: Some(23),
            weight: Some(60.5),
            height: Some(1.71),
        }
    }

    #[tokio::test]
    async fn test_create_student() {
        let mut repo = MockStudentRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));
        repo.expect_create().times(1).returning(|_| Ok(diego()));

        let service = StudentService::new(Arc::new(repo), gate(true));
        let student = service.create_student(input(), Principal(1)).await.unwrap();

        assert_eq!(student.id, 3);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let mut repo = MockStudentRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(Some(diego())));
        repo.expect_create().times(0);

        let service = StudentService::new(Arc::new(repo), gate(true));
        let result = service.create_student(input(), Principal(1)).await;

        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_invalid_email_is_rejected() {
        let service = StudentService::new(Arc::new(MockStudentRepository::new()), gate(true));
        let bad = StudentInput {
            email: Some("not-an-email".to_string()),
            ..input()
        };

        let result = service.create_student(bad, Principal(1)).await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_create_requires_administrator() {
        let mut repo = MockStudentRepository::new();
        repo.expect_create().times(0);

        let service = StudentService::new(Arc::new(repo), gate(false));
        let result = service.create_student(input(), Principal(2)).await;

        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_update_to_taken_email_conflicts() {
        let mut repo = MockStudentRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(Some(diego())));
        repo.expect_find_by_email().returning(|_| {
            Ok(Some(Student {
                id: 4,
                email: "other@gym.local".to_string(),
                ..diego()
            }))
        });
        repo.expect_update().times(0);

        let service = StudentService::new(Arc::new(repo), gate(true));
        let result = service
            .update_student(
                3,
                StudentUpdateInput {
                    email: Some("other@gym.local".to_string()),
                    ..Default::default()
                },
                Principal(1),
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_update_keeping_own_email() {
        let mut repo = MockStudentRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(Some(diego())));
        repo.expect_find_by_email().times(0);
        repo.expect_update()
            .withf(|id, patch| *id == 3 && patch.age == Some(24))
            .returning(|_, _| Ok(Student { age: 24, ..diego() }));

        let service = StudentService::new(Arc::new(repo), gate(true));
        let student = service
            .update_student(
                3,
                StudentUpdateInput {
                    email: Some("diego@gym.local".to_string()),
                    age: Some(24),
                    ..Default::default()
                },
                Principal(1),
            )
            .await
            .unwrap();

        assert_eq!(student.age, 24);
    }

    #[tokio::test]
    async fn test_get_missing_student() {
        let mut repo = MockStudentRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let service = StudentService::new(Arc::new(repo), gate(false));
        assert!(matches!(
            service.get_student(99).await,
            Err(AppError::NotFound { .. })
        ));
    }
}
