/// Router tests that stop before the database
///
/// Authentication, role gates, request validation and response headers are
/// all decided before any query runs, so these use a pool that never
/// connects.

mod common;

use axum::http::StatusCode;
use common::{body_json, empty_request, json_request, offline_app, send, token_for};
use htmlquest_shared::models::user::UserRole;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = offline_app();

    let response = send(&app, empty_request("GET", "/api/project-hub", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = offline_app();

    let response = send(
        &app,
        empty_request("GET", "/api/ai-local/steps", Some("not.a.jwt")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_reject_other_roles() {
    let app = offline_app();

    for role in [UserRole::Student, UserRole::Supervisor] {
        let token = token_for(Uuid::new_v4(), role);
        let response = send(
            &app,
            empty_request("GET", "/api/admin/notifications", Some(&token)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "role {:?}", role);
    }

    let response = send(
        &app,
        empty_request("GET", "/api/admin/notifications/stream", None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_step_list_has_seven_steps() {
    let app = offline_app();
    let token = token_for(Uuid::new_v4(), UserRole::Student);

    let response = send(&app, empty_request("GET", "/api/ai-local/steps", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let steps = body.as_array().unwrap();
    assert_eq!(steps.len(), 7);
    assert_eq!(steps[0]["index"], 0);
    assert_eq!(steps[6]["index"], 6);
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = offline_app();
    let token = token_for(Uuid::new_v4(), UserRole::Student);

    let response = send(&app, empty_request("GET", "/api/ai-local/steps", Some(&token))).await;
    let headers = response.headers();

    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert!(headers.contains_key("content-security-policy"));
    assert!(!headers.contains_key("strict-transport-security"));
}

#[tokio::test]
async fn test_project_validation_errors() {
    let app = offline_app();
    let token = token_for(Uuid::new_v4(), UserRole::Student);

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/project-hub",
            Some(&token),
            json!({ "title": "", "github_link": "javascript:alert(1)" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["field"].as_str())
        .collect();
    assert!(fields.contains(&"title"));
    assert!(fields.contains(&"github_link"));
}

#[tokio::test]
async fn test_whitespace_only_text_is_rejected() {
    let app = offline_app();
    let token = token_for(Uuid::new_v4(), UserRole::Student);

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/project-hub",
            Some(&token),
            json!({ "title": "   " }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["title"]);

    let response = send(
        &app,
        json_request(
            "PUT",
            "/api/auth/profile",
            Some(&token),
            json!({ "name": " \t " }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let admin = token_for(Uuid::new_v4(), UserRole::Admin);
    let response = send(
        &app,
        json_request(
            "POST",
            "/api/admin/notifications",
            Some(&admin),
            json!({ "title": "  ", "body": "Back at noon" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_empty_submission_is_rejected() {
    let app = offline_app();
    let token = token_for(Uuid::new_v4(), UserRole::Student);

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/ai-local/evaluate-basic-project",
            Some(&token),
            json!({ "code": "" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_evaluation_role_checks() {
    let app = offline_app();
    let student_id = Uuid::new_v4();
    let token = token_for(student_id, UserRole::Student);

    let own = send(
        &app,
        json_request(
            "POST",
            "/api/evaluations",
            Some(&token),
            json!({
                "direction": "student_to_supervisor",
                "evaluatee_id": student_id,
                "rating": 5
            }),
        ),
    )
    .await;
    assert_eq!(own.status(), StatusCode::BAD_REQUEST);

    let wrong_direction = send(
        &app,
        json_request(
            "POST",
            "/api/evaluations",
            Some(&token),
            json!({
                "direction": "supervisor_to_student",
                "evaluatee_id": Uuid::new_v4(),
                "rating": 4
            }),
        ),
    )
    .await;
    assert_eq!(wrong_direction.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_self_registration_refused() {
    let app = offline_app();

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({
                "name": "Mallory",
                "email": "mallory@example.com",
                "password": "tag-soup-42",
                "role": "admin"
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
