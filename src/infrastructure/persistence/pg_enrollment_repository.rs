//! PostgreSQL implementation of enrollment repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{
    Enrollment, EnrollmentDetail, NewEnrollment, PlanSummary, StudentSummary,
};
use crate::domain::repositories::EnrollmentRepository;
use crate::error::AppError;
use crate::utils::db_error::{map_insert_error, map_write_error};

const DETAIL_SELECT: &str = r#"
    SELECT e.id, e.start_date, e.end_date, e.price, e.cancelled_at, e.created_at,
           p.id              AS plan_id,
           p.title           AS plan_title,
           p.duration_months AS plan_duration_months,
           p.monthly_price   AS plan_monthly_price,
           s.id              AS student_id,
           s.name            AS student_name,
           s.email           AS student_email,
           s.age             AS student_age,
           s.weight          AS student_weight,
           s.height          AS student_height
    FROM enrollments e
    JOIN plans p    ON p.id = e.plan_id
    JOIN students s ON s.id = e.student_id
"#;

#[derive(sqlx::FromRow)]
struct EnrollmentRow {
    id: i64,
    student_id: i64,
    plan_id: i64,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    price: Decimal,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<EnrollmentRow> for Enrollment {
    fn from(row: EnrollmentRow) -> Self {
        Enrollment {
            id: row.id,
            student_id: row.student_id,
            plan_id: row.plan_id,
            start_date: row.start_date,
            end_date: row.end_date,
            price: row.price,
            cancelled_at: row.cancelled_at,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DetailRow {
    id: i64,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    price: Decimal,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    plan_id: i64,
    plan_title: String,
    plan_duration_months: i32,
    plan_monthly_price: Decimal,
    student_id: i64,
    student_name: String,
    student_email: String,
    student_age: i32,
    student_weight: f64,
    student_height: f64,
}

impl From<DetailRow> for EnrollmentDetail {
    fn from(row: DetailRow) -> Self {
        EnrollmentDetail {
            id: row.id,
            start_date: row.start_date,
            end_date: row.end_date,
            price: row.price,
            cancelled_at: row.cancelled_at,
            created_at: row.created_at,
            plan: PlanSummary {
                id: row.plan_id,
                title: row.plan_title,
                duration_months: row.plan_duration_months,
                monthly_price: row.plan_monthly_price,
            },
            student: StudentSummary {
                id: row.student_id,
                name: row.student_name,
                email: row.student_email,
                age: row.student_age,
                weight: row.student_weight,
                height: row.student_height,
            },
        }
    }
}

/// PostgreSQL repository for enrollments.
///
/// Every write is a single statement, so a row is either fully written or absent.
pub struct PgEnrollmentRepository {
    pool: Arc<PgPool>,
}

impl PgEnrollmentRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrollmentRepository for PgEnrollmentRepository {
    async fn create(&self, new_enrollment: NewEnrollment) -> Result<Enrollment, AppError> {
        let row = sqlx::query_as::<_, EnrollmentRow>(
            r#"
            INSERT INTO enrollments (student_id, plan_id, start_date, end_date, price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, student_id, plan_id, start_date, end_date, price, cancelled_at, created_at
            "#,
        )
        .bind(new_enrollment.student_id)
        .bind(new_enrollment.plan_id)
        .bind(new_enrollment.start_date)
        .bind(new_enrollment.end_date)
        .bind(new_enrollment.price)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(map_insert_error)?;

        Ok(row.into())
    }

    async fn find_detail_by_id(&self, id: i64) -> Result<Option<EnrollmentDetail>, AppError> {
        let sql = format!("{DETAIL_SELECT} WHERE e.id = $1");

        let row = sqlx::query_as::<_, DetailRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(EnrollmentDetail::from))
    }

    async fn list_details(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<EnrollmentDetail>, AppError> {
        let sql = format!("{DETAIL_SELECT} ORDER BY e.created_at ASC, e.id ASC LIMIT $1 OFFSET $2");

        let rows = sqlx::query_as::<_, DetailRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(EnrollmentDetail::from).collect())
    }

    async fn cancel(
        &self,
        id: i64,
        cancelled_at: DateTime<Utc>,
    ) -> Result<Option<Enrollment>, AppError> {
        let row = sqlx::query_as::<_, EnrollmentRow>(
            r#"
            UPDATE enrollments
            SET cancelled_at = $2
            WHERE id = $1
              AND cancelled_at IS NULL
            RETURNING id, student_id, plan_id, start_date, end_date, price, cancelled_at, created_at
            "#,
        )
        .bind(id)
        .bind(cancelled_at)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(map_write_error)?;

        Ok(row.map(Enrollment::from))
    }
}
