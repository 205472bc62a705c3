//! PostgreSQL implementation of plan repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewPlan, Plan, PlanPatch};
use crate::domain::repositories::PlanRepository;
use crate::error::{AppError, Resource};
use crate::utils::db_error::map_write_error;

#[derive(sqlx::FromRow)]
struct PlanRow {
    id: i64,
    title: String,
    duration_months: i32,
    monthly_price: Decimal,
    created_at: DateTime<Utc>,
}

impl From<PlanRow> for Plan {
    fn from(row: PlanRow) -> Self {
        Plan::new(
            row.id,
            row.title,
            row.duration_months,
            row.monthly_price,
            row.created_at,
        )
    }
}

/// PostgreSQL repository for pricing plans.
pub struct PgPlanRepository {
    pool: Arc<PgPool>,
}

impl PgPlanRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanRepository for PgPlanRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Plan>, AppError> {
        let row = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, title, duration_months, monthly_price, created_at
            FROM plans
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Plan::from))
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Plan>, AppError> {
        let rows = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, title, duration_months, monthly_price, created_at
            FROM plans
            ORDER BY created_at ASC, id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Plan::from).collect())
    }

    async fn create(&self, new_plan: NewPlan) -> Result<Plan, AppError> {
        let row = sqlx::query_as::<_, PlanRow>(
            r#"
            INSERT INTO plans (title, duration_months, monthly_price)
            VALUES ($1, $2, $3)
            RETURNING id, title, duration_months, monthly_price, created_at
            "#,
        )
        .bind(&new_plan.title)
        .bind(new_plan.duration_months)
        .bind(new_plan.monthly_price)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(map_write_error)?;

        Ok(row.into())
    }

    async fn update(&self, id: i64, patch: PlanPatch) -> Result<Plan, AppError> {
        let row = sqlx::query_as::<_, PlanRow>(
            r#"
            UPDATE plans
            SET title           = COALESCE($2, title),
                duration_months = COALESCE($3, duration_months),
                monthly_price   = COALESCE($4, monthly_price),
                updated_at      = NOW()
            WHERE id = $1
            RETURNING id, title, duration_months, monthly_price, created_at
            "#,
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.duration_months)
        .bind(patch.monthly_price)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(map_write_error)?;

        row.map(Plan::from)
            .ok_or_else(|| AppError::not_found(Resource::Plan, json!({ "id": id })))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM plans WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await
            .map_err(map_write_error)?;

        Ok(result.rows_affected() > 0)
    }
}
