use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;
use sqlx::PgPool;
use std::sync::Arc;

use gym_enrollment::domain::entities::{NewEnrollment, NewPlan, NewStudent, Plan, Student};
use gym_enrollment::domain::repositories::{
    EnrollmentRepository, PlanRepository, StudentRepository,
};
use gym_enrollment::error::AppError;
use gym_enrollment::infrastructure::persistence::{
    PgEnrollmentRepository, PgPlanRepository, PgStudentRepository,
};

fn at(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, 15, 0, 0).unwrap()
}

async fn seed(pool: &PgPool, email: &str) -> (Student, Plan) {
    let pool = Arc::new(pool.clone());

    let student = PgStudentRepository::new(pool.clone())
        .create(NewStudent {
            name: "Diego".to_string(),
            email: email.to_string(),
            age: 23,
            weight: 60.5,
            height: 1.71,
        })
        .await
        .unwrap();

    let plan = PgPlanRepository::new(pool)
        .create(NewPlan {
            title: "Gold".to_string(),
            duration_months: 3,
            monthly_price: dec!(109.90),
        })
        .await
        .unwrap();

    (student, plan)
}

fn new_enrollment(student: &Student, plan: &Plan) -> NewEnrollment {
    NewEnrollment {
        student_id: student.id,
        plan_id: plan.id,
        start_date: at(3, 10),
        end_date: at(6, 10),
        price: dec!(329.70),
    }
}

#[sqlx::test]
async fn test_create_enrollment(pool: PgPool) {
    let (student, plan) = seed(&pool, "diego@gym.local").await;
    let repo = PgEnrollmentRepository::new(Arc::new(pool));

    let enrollment = repo.create(new_enrollment(&student, &plan)).await.unwrap();

    assert!(enrollment.id > 0);
    assert_eq!(enrollment.student_id, student.id);
    assert_eq!(enrollment.plan_id, plan.id);
    assert_eq!(enrollment.start_date, at(3, 10));
    assert_eq!(enrollment.end_date, at(6, 10));
    assert_eq!(enrollment.price, dec!(329.70));
    assert!(enrollment.cancelled_at.is_none());
}

#[sqlx::test]
async fn test_create_with_missing_plan_is_persistence_failure(pool: PgPool) {
    let (student, plan) = seed(&pool, "diego@gym.local").await;
    let repo = PgEnrollmentRepository::new(Arc::new(pool.clone()));

    let result = repo
        .create(NewEnrollment {
            plan_id: plan.id + 1000,
            ..new_enrollment(&student, &plan)
        })
        .await;

    assert!(matches!(result, Err(AppError::Persistence { .. })));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM enrollments")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test]
async fn test_create_rejects_end_before_start(pool: PgPool) {
    let (student, plan) = seed(&pool, "diego@gym.local").await;
    let repo = PgEnrollmentRepository::new(Arc::new(pool));

    let result = repo
        .create(NewEnrollment {
            end_date: at(3, 10),
            ..new_enrollment(&student, &plan)
        })
        .await;

    assert!(matches!(result, Err(AppError::Persistence { .. })));
}

#[sqlx::test]
async fn test_find_detail_joins_plan_and_student(pool: PgPool) {
    let (student, plan) = seed(&pool, "diego@gym.local").await;
    let repo = PgEnrollmentRepository::new(Arc::new(pool));

    let enrollment = repo.create(new_enrollment(&student, &plan)).await.unwrap();
    let detail = repo.find_detail_by_id(enrollment.id).await.unwrap().unwrap();

    assert_eq!(detail.id, enrollment.id);
    assert_eq!(detail.price, dec!(329.70));
    assert_eq!(detail.plan.title, "Gold");
    assert_eq!(detail.plan.monthly_price, dec!(109.90));
    assert_eq!(detail.student.email, "diego@gym.local");
    assert_eq!(detail.student.weight, 60.5);

    assert!(repo.find_detail_by_id(enrollment.id + 1).await.unwrap().is_none());
}

#[sqlx::test]
async fn test_list_details_pages_in_creation_order(pool: PgPool) {
    let (student, plan) = seed(&pool, "diego@gym.local").await;
    let repo = PgEnrollmentRepository::new(Arc::new(pool));

    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(repo.create(new_enrollment(&student, &plan)).await.unwrap().id);
    }

    let first: Vec<i64> = repo
        .list_details(0, 2)
        .await
        .unwrap()
        .iter()
        .map(|d| d.id)
        .collect();
    let second: Vec<i64> = repo
        .list_details(2, 2)
        .await
        .unwrap()
        .iter()
        .map(|d| d.id)
        .collect();

    assert_eq!(first, ids[..2]);
    assert_eq!(second, ids[2..]);
    assert!(repo.list_details(4, 2).await.unwrap().is_empty());
}

#[sqlx::test]
async fn test_cancel_sets_timestamp_once(pool: PgPool) {
    let (student, plan) = seed(&pool, "diego@gym.local").await;
    let repo = PgEnrollmentRepository::new(Arc::new(pool.clone()));
    let enrollment = repo.create(new_enrollment(&student, &plan)).await.unwrap();

    let first = repo.cancel(enrollment.id, at(4, 1)).await.unwrap();
    assert_eq!(first.unwrap().cancelled_at, Some(at(4, 1)));

    let second = repo.cancel(enrollment.id, at(5, 1)).await.unwrap();
    assert!(second.is_none());

    let stored: Option<DateTime<Utc>> =
        sqlx::query_scalar("SELECT cancelled_at FROM enrollments WHERE id = $1")
            .bind(enrollment.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stored, Some(at(4, 1)));
}

#[sqlx::test]
async fn test_cancel_missing_enrollment(pool: PgPool) {
    let repo = PgEnrollmentRepository::new(Arc::new(pool));

    let result = repo.cancel(999, at(4, 1)).await.unwrap();

    assert!(result.is_none());
}
