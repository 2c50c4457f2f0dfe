// Routing, session and request validation checks that need no database

mod common;

use axum::http::{header, StatusCode};
use common::TestApp;
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = TestApp::without_database();

    for (method, uri) in [
        ("GET", "/api/pets"),
        ("GET", "/api/dashboard"),
        ("GET", "/api/profile"),
        ("GET", "/api/qr"),
        ("POST", "/account/toggle-email-subscription"),
    ] {
        let response = app.request(method, uri).send().await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{} {}", method, uri);

        let body: Value = response.json().await;
        assert_eq!(body, json!({ "error": "Unauthorized" }));
    }
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let app = TestApp::without_database();

    let response = app.get("/api/pets").bearer("not-a-jwt").send().await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_plans_are_public() {
    let app = TestApp::without_database();

    let response = app.get("/api/pets/subscriptions/plans").send().await;
    assert_eq!(response.status(), StatusCode::OK);

    let plans: Vec<Value> = response.json().await;
    let ids: Vec<&str> = plans.iter().filter_map(|p| p["id"].as_str()).collect();
    assert_eq!(ids, vec!["free", "pro", "ultra"]);
}

#[tokio::test]
async fn test_waitlist_requires_email() {
    let app = TestApp::without_database();

    let response = app.post("/api/waitlist").json(&json!({})).send().await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await;
    assert_eq!(body["error"], "Email is required");
}

#[tokio::test]
async fn test_create_pet_reports_missing_fields() {
    let app = TestApp::without_database();
    let token = app.token_for(Uuid::new_v4());

    let response = app
        .post("/api/pets")
        .bearer(&token)
        .json(&json!({ "name": "Rex" }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await;
    assert_eq!(body["error"], "Missing required fields");
    assert_eq!(
        body["requiredFields"],
        json!(["date_of_birth", "gender", "pet_type", "breed"])
    );
}

#[tokio::test]
async fn test_subscription_request_validation() {
    let app = TestApp::without_database();
    let token = app.token_for(Uuid::new_v4());

    let response = app
        .post("/api/pets/subscriptions")
        .bearer(&token)
        .json(&json!({}))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await;
    assert_eq!(body["requiredFields"], json!(["petId", "planType"]));

    let response = app
        .post("/api/pets/subscriptions")
        .bearer(&token)
        .json(&json!({ "petId": Uuid::new_v4(), "planType": "platinum" }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "Invalid plan type");
    assert_eq!(body["validValues"], json!(["free", "pro", "ultra"]));
}

#[tokio::test]
async fn test_password_form_echoes_values() {
    let app = TestApp::without_database();
    let token = app.token_for(Uuid::new_v4());

    let response = app
        .post("/account/update-password")
        .bearer(&token)
        .form(&[
            ("newPassword1", "secret1"),
            ("newPassword2", "secret2"),
            ("currentPassword", "old-password"),
        ])
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await;
    assert_eq!(body["success"], false);
    assert_eq!(body["errorMessage"], "The passwords don't match");
    assert_eq!(body["errorFields"], json!(["newPassword1", "newPassword2"]));
    assert_eq!(body["newPassword2"], "secret2");
}

#[tokio::test]
async fn test_onboarding_requires_a_pet() {
    let app = TestApp::without_database();
    let token = app.token_for(Uuid::new_v4());

    let response = app
        .post("/account/onboarding")
        .bearer(&token)
        .form(&[("firstName", "Alex"), ("lastName", "Morgan")])
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await;
    assert_eq!(body["errorMessage"], "At least one pet is required");
    assert_eq!(body["firstName"], "Alex");
}

#[tokio::test]
async fn test_delete_pet_form_requires_pet_id() {
    let app = TestApp::without_database();
    let token = app.token_for(Uuid::new_v4());

    let response = app
        .post("/account/delete-pet")
        .bearer(&token)
        .form(&[("confirmName", "Rex")])
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await;
    assert_eq!(body["errorFields"], json!(["petId"]));
}

#[tokio::test]
async fn test_health_reports_unreachable_database() {
    let app = TestApp::without_database();

    let response = app.get("/health").send().await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = response.json().await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["components"]["postgresql"]["status"], "unhealthy");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = TestApp::without_database();

    let response = app.get("/api/docs/openapi.json").send().await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await;
    assert_eq!(body["info"]["title"], "PetsQRCode API");
    assert!(body["paths"]["/api/pets/{id}"].is_object());
}

#[tokio::test]
async fn test_cors_preflight_for_allowed_origin() {
    let app = TestApp::without_database();

    let response = app
        .request("OPTIONS", "/api/pets")
        .header("origin", "https://petsqrcode.com")
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN).as_deref(),
        Some("https://petsqrcode.com")
    );

    let response = app
        .request("OPTIONS", "/api/pets")
        .header("origin", "https://evil.example")
        .send()
        .await;
    assert!(response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::without_database();

    let response = app.get("/api/does-not-exist").send().await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unreadable_json_body_is_a_json_error() {
    let app = TestApp::without_database();
    let token = app.token_for(Uuid::new_v4());
    let uri = format!("/api/pets/{}/contacts", Uuid::new_v4());

    let response = app
        .request("PUT", &uri)
        .bearer(&token)
        .raw_json("{ not json")
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response
        .header(header::CONTENT_TYPE)
        .is_some_and(|v| v.starts_with("application/json")));
    let body: Value = response.json().await;
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));

    // No body or content type at all
    let response = app
        .request("DELETE", &format!("/api/pets/{}/maintenance", Uuid::new_v4()))
        .bearer(&token)
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_subscription_update_requires_id() {
    let app = TestApp::without_database();
    let token = app.token_for(Uuid::new_v4());

    let response = app
        .request("PUT", "/api/pets/subscriptions")
        .bearer(&token)
        .json(&json!({ "planType": "pro" }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "Subscription ID is required");
    assert_eq!(body["fields"], json!(["subscriptionId"]));

    let response = app
        .request("DELETE", "/api/pets/subscriptions")
        .bearer(&token)
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "Subscription ID is required");
}
