//! PostgreSQL implementation of student repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewStudent, Student, StudentPatch};
use crate::domain::repositories::StudentRepository;
use crate::error::{AppError, Resource};
use crate::utils::db_error::{is_unique_violation_on, map_write_error};

#[derive(sqlx::FromRow)]
struct StudentRow {
    id: i64,
    name: String,
    email: String,
    age: i32,
    weight: f64,
    height: f64,
    created_at: DateTime<Utc>,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Student {
            id: row.id,
            name: row.name,
            email: row.email,
            age: row.age,
            weight: row.weight,
            height: row.height,
            created_at: row.created_at,
        }
    }
}

fn map_student_write_error(e: sqlx::Error, email: &str) -> AppError {
    if is_unique_violation_on(&e, "students_email_key") {
        return AppError::conflict(
            "A student with this email is already registered",
            json!({ "email": email }),
        );
    }
    map_write_error(e)
}

/// PostgreSQL repository for students.
pub struct PgStudentRepository {
    pool: Arc<PgPool>,
}

impl PgStudentRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StudentRepository for PgStudentRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Student>, AppError> {
        let row = sqlx::query_as::<_, StudentRow>(
            r#"
            SELECT id, name, email, age, weight, height, created_at
            FROM students
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Student::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Student>, AppError> {
        let row = sqlx::query_as::<_, StudentRow>(
            r#"
            SELECT id, name, email, age, weight, height, created_at
            FROM students
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Student::from))
    }

    async fn create(&self, new_student: NewStudent) -> Result<Student, AppError> {
        let row = sqlx::query_as::<_, StudentRow>(
            r#"
            INSERT INTO students (name, email, age, weight, height)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, age, weight, height, created_at
            "#,
        )
        .bind(&new_student.name)
        .bind(&new_student.email)
        .bind(new_student.age)
        .bind(new_student.weight)
        .bind(new_student.height)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| map_student_write_error(e, &new_student.email))?;

        Ok(row.into())
    }

    async fn update(&self, id: i64, patch: StudentPatch) -> Result<Student, AppError> {
        let email = patch.email.clone().unwrap_or_default();

        let row = sqlx::query_as::<_, StudentRow>(
            r#"
            UPDATE students
            SET name       = COALESCE($2, name),
                email      = COALESCE($3, email),
                age        = COALESCE($4, age),
                weight     = COALESCE($5, weight),
                height     = COALESCE($6, height),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, age, weight, height, created_at
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.email)
        .bind(patch.age)
        .bind(patch.weight)
        .bind(patch.height)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| map_student_write_error(e, &email))?;

        row.map(Student::from)
            .ok_or_else(|| AppError::not_found(Resource::Student, json!({ "id": id })))
    }
}
