#![allow(dead_code)]

use axum::routing::get;
use axum::{Router, middleware};
use axum_test::TestServer;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

use gym_enrollment::api;
use gym_enrollment::api::handlers::health_handler;
use gym_enrollment::api::middleware::auth;
use gym_enrollment::application::services::auth_service::hash_token;
use gym_enrollment::domain::clock::FixedClock;
use gym_enrollment::domain::entities::{NewPlan, NewStudent, NewUser, Plan, Student};
use gym_enrollment::domain::repositories::{
    PlanRepository, StudentRepository, TokenRepository, UserRepository,
};
use gym_enrollment::infrastructure::memory::InMemoryDatabase;
use gym_enrollment::infrastructure::queue::MemoryJobQueue;
use gym_enrollment::state::{AppState, Repositories};

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const MEMBER_TOKEN: &str = "member-token";

/// Everything a handler test needs: the server plus handles on its backends.
pub struct TestApp {
    pub server: TestServer,
    pub db: InMemoryDatabase,
    pub queue: Arc<MemoryJobQueue>,
    pub clock: Arc<FixedClock>,
}

/// 2024-01-01T00:00:00Z, the default "now" of every test app.
pub fn default_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Builds the `/health` + `/api` router on in-memory backends, with one
/// administrator (`ADMIN_TOKEN`) and one regular user (`MEMBER_TOKEN`).
pub async fn spawn_app() -> TestApp {
    let db = InMemoryDatabase::new();
    let queue = Arc::new(MemoryJobQueue::new());
    let clock = Arc::new(FixedClock::new(default_now()));

    seed_user(&db, "Admin", "admin@gym.local", true, ADMIN_TOKEN).await;
    seed_user(&db, "Member", "member@gym.local", false, MEMBER_TOKEN).await;

    let state = AppState::new(
        Repositories::in_memory(&db),
        queue.clone(),
        clock.clone(),
        SIGNING_SECRET.to_string(),
        Duration::from_secs(30),
    );

    let api_router = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    let app = Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .with_state(state);

    TestApp {
        server: TestServer::new(app).unwrap(),
        db,
        queue,
        clock,
    }
}

async fn seed_user(db: &InMemoryDatabase, name: &str, email: &str, admin: bool, token: &str) {
    let user = db
        .users()
        .create(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            administrator: admin,
        })
        .await
        .unwrap();

    db.tokens()
        .create_token(
            user.id,
            &format!("{name} token"),
            &hash_token(SIGNING_SECRET, token),
        )
        .await
        .unwrap();
}

pub async fn create_test_plan(
    db: &InMemoryDatabase,
    title: &str,
    duration_months: i32,
    monthly_price: Decimal,
) -> Plan {
    db.plans()
        .create(NewPlan {
            title: title.to_string(),
            duration_months,
            monthly_price,
        })
        .await
        .unwrap()
}

pub async fn create_test_student(db: &InMemoryDatabase, name: &str, email: &str) -> Student {
    db.students()
        .create(NewStudent {
            name: name.to_string(),
            email: email.to_string(),
            age: 30,
            weight: 70.5,
            height: 1.75,
        })
        .await
        .unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
