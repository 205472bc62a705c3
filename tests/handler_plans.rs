mod common;

use axum::http::StatusCode;
use common::{ADMIN_TOKEN, MEMBER_TOKEN, bearer};
use rust_decimal_macros::dec;
use serde_json::{Value, json};

#[tokio::test]
async fn test_list_plans_in_creation_order() {
    let app = common::spawn_app().await;
    common::create_test_plan(&app.db, "Monthly", 1, dec!(40)).await;
    common::create_test_plan(&app.db, "Yearly", 12, dec!(30)).await;

    let response = app
        .server
        .get("/api/plans")
        .add_header("Authorization", bearer(MEMBER_TOKEN))
        .await;

    response.assert_status_ok();

    let body = response.json::<Value>();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["title"], "Monthly");
    assert_eq!(items[1]["title"], "Yearly");
    assert_eq!(items[1]["total_price"], "360");
}

#[tokio::test]
async fn test_list_plans_rejects_page_zero() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .get("/api/plans?page=0")
        .add_header("Authorization", bearer(MEMBER_TOKEN))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_create_plan_success() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .post("/api/plans")
        .add_header("Authorization", bearer(ADMIN_TOKEN))
        .json(&json!({
            "title": "Quarter",
            "duration_months": 3,
            "monthly_price": "49.90"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body = response.json::<Value>();
    assert_eq!(body["title"], "Quarter");
    assert_eq!(body["duration_months"], 3);
    assert_eq!(body["total_price"], "149.70");
}

#[tokio::test]
async fn test_create_plan_validation_errors() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .post("/api/plans")
        .add_header("Authorization", bearer(ADMIN_TOKEN))
        .json(&json!({
            "title": "",
            "duration_months": 0,
            "monthly_price": "-1"
        }))
        .await;

    response.assert_status_bad_request();

    let fields = &response.json::<Value>()["error"]["details"]["fields"];
    assert!(fields.get("title").is_some());
    assert!(fields.get("duration_months").is_some());
    assert!(fields.get("monthly_price").is_some());
}

#[tokio::test]
async fn test_create_plan_rejects_oversized_price() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .post("/api/plans")
        .add_header("Authorization", bearer(ADMIN_TOKEN))
        .json(&json!({
            "title": "Forever",
            "duration_months": 12,
            "monthly_price": "79228162514264337593543950335"
        }))
        .await;

    response.assert_status_bad_request();

    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "validation_error");
    assert!(body["error"]["details"]["fields"].get("monthly_price").is_some());
}

#[tokio::test]
async fn test_create_plan_rejects_sub_cent_price() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .post("/api/plans")
        .add_header("Authorization", bearer(ADMIN_TOKEN))
        .json(&json!({
            "title": "Odd",
            "duration_months": 3,
            "monthly_price": "10.005"
        }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_create_plan_with_string_duration_is_validation_error() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .post("/api/plans")
        .add_header("Authorization", bearer(ADMIN_TOKEN))
        .json(&json!({
            "title": "Quarter",
            "duration_months": "three",
            "monthly_price": "50"
        }))
        .await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_create_plan_requires_administrator() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .post("/api/plans")
        .add_header("Authorization", bearer(MEMBER_TOKEN))
        .json(&json!({
            "title": "Quarter",
            "duration_months": 3,
            "monthly_price": "50"
        }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_update_plan_keeps_existing_enrollment_price() {
    let app = common::spawn_app().await;
    let plan = common::create_test_plan(&app.db, "Quarter", 3, dec!(50)).await;
    let student = common::create_test_student(&app.db, "Ana", "ana@example.com").await;

    app.server
        .post("/api/enrollments")
        .add_header("Authorization", bearer(ADMIN_TOKEN))
        .json(&json!({
            "student_id": student.id,
            "plan_id": plan.id,
            "start_date": "2024-03-10"
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .put(&format!("/api/plans/{}", plan.id))
        .add_header("Authorization", bearer(ADMIN_TOKEN))
        .json(&json!({ "monthly_price": "80" }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["total_price"], "240");

    let listed = app
        .server
        .get("/api/enrollments")
        .add_header("Authorization", bearer(ADMIN_TOKEN))
        .await
        .json::<Value>();
    assert_eq!(listed["items"][0]["price"], "150");
}

#[tokio::test]
async fn test_update_missing_plan() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .put("/api/plans/999")
        .add_header("Authorization", bearer(ADMIN_TOKEN))
        .json(&json!({ "title": "Renamed" }))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_delete_plan_success() {
    let app = common::spawn_app().await;
    let plan = common::create_test_plan(&app.db, "Quarter", 3, dec!(50)).await;

    app.server
        .delete(&format!("/api/plans/{}", plan.id))
        .add_header("Authorization", bearer(ADMIN_TOKEN))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    app.server
        .delete(&format!("/api/plans/{}", plan.id))
        .add_header("Authorization", bearer(ADMIN_TOKEN))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_delete_plan_in_use_is_conflict() {
    let app = common::spawn_app().await;
    let plan = common::create_test_plan(&app.db, "Quarter", 3, dec!(50)).await;
    let student = common::create_test_student(&app.db, "Ana", "ana@example.com").await;

    app.server
        .post("/api/enrollments")
        .add_header("Authorization", bearer(ADMIN_TOKEN))
        .json(&json!({
            "student_id": student.id,
            "plan_id": plan.id,
            "start_date": "2024-03-10"
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .delete(&format!("/api/plans/{}", plan.id))
        .add_header("Authorization", bearer(ADMIN_TOKEN))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["error"]["code"], "conflict");
}

#[tokio::test]
async fn test_delete_plan_requires_administrator() {
    let app = common::spawn_app().await;
    let plan = common::create_test_plan(&app.db, "Quarter", 3, dec!(50)).await;

    app.server
        .delete(&format!("/api/plans/{}", plan.id))
        .add_header("Authorization", bearer(MEMBER_TOKEN))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}
