// End-to-end pet flows against a real database.
// Each test returns early when TEST_DATABASE_URL is not set.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::{json, Value};
use serial_test::serial;
use uuid::Uuid;

fn new_pet(name: &str) -> Value {
    json!({
        "name": name,
        "date_of_birth": "2021-04-12",
        "gender": "male",
        "pet_type": "Dog",
        "breed": "Beagle"
    })
}

async fn create_pet(app: &TestApp, token: &str, name: &str) -> Value {
    let response = app
        .post("/api/pets")
        .bearer(token)
        .json(&new_pet(name))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await
}

#[tokio::test]
#[serial]
async fn test_pet_crud_and_ownership() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let owner = app.create_profile().await;
    let token = app.token_for(owner);

    let bella = create_pet(&app, &token, "Bella").await;
    create_pet(&app, &token, "Archie").await;

    let pets: Vec<Value> = app.get("/api/pets").bearer(&token).send().await.json().await;
    let names: Vec<&str> = pets.iter().filter_map(|p| p["name"].as_str()).collect();
    assert_eq!(names, vec!["Archie", "Bella"]);

    let bella_id = bella["id"].as_str().unwrap().to_string();
    let response = app
        .request("PUT", &format!("/api/pets/{}", bella_id))
        .bearer(&token)
        .json(&json!({ "bio": "Loves the beach", "breed": "  " }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await;
    assert_eq!(updated["bio"], "Loves the beach");
    assert_eq!(updated["breed"], "Beagle");

    // Another user's pet looks the same as a missing one
    let stranger = app.token_for(app.create_profile().await);
    let response = app
        .get(&format!("/api/pets/{}", bella_id))
        .bearer(&stranger)
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "Pet not found or access denied");

    let response = app
        .request("DELETE", &format!("/api/pets/{}", bella_id))
        .bearer(&token)
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await;
    assert_eq!(body, json!({ "success": true }));

    let response = app
        .get(&format!("/api/pets/{}", bella_id))
        .bearer(&token)
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn test_contacts_keep_one_primary_and_one_minimum() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let token = app.token_for(app.create_profile().await);
    let pet = create_pet(&app, &token, "Rex").await;
    let uri = format!("/api/pets/{}/contacts", pet["id"].as_str().unwrap());

    let contact = |name: &str, primary: bool| {
        json!({
            "full_name": name,
            "address": "1 Main St",
            "email": "contact@example.com",
            "phone_number": "+15550123",
            "is_primary": primary
        })
    };
    let first: Value = app
        .post(&uri)
        .bearer(&token)
        .json(&contact("Sam", true))
        .send()
        .await
        .json()
        .await;
    let second: Value = app
        .post(&uri)
        .bearer(&token)
        .json(&contact("Jo", true))
        .send()
        .await
        .json()
        .await;

    let contacts: Vec<Value> = app.get(&uri).bearer(&token).send().await.json().await;
    let primaries: Vec<&Value> = contacts.iter().filter(|c| c["is_primary"] == true).collect();
    assert_eq!(primaries.len(), 1);
    assert_eq!(primaries[0]["id"], second["id"]);

    let response = app
        .request("DELETE", &uri)
        .bearer(&token)
        .json(&json!({ "contactId": first["id"] }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request("DELETE", &uri)
        .bearer(&token)
        .json(&json!({ "contactId": second["id"] }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn test_maintenance_frequency_and_dashboard() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let token = app.token_for(app.create_profile().await);
    let pet = create_pet(&app, &token, "Milo").await;
    let uri = format!("/api/pets/{}/maintenance", pet["id"].as_str().unwrap());

    let response = app
        .post(&uri)
        .bearer(&token)
        .json(&json!({ "name": "Flea treatment", "frequency": "fortnightly", "start_date": "2024-01-01" }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await;
    assert!(body["validValues"].as_array().is_some_and(|v| !v.is_empty()));

    let response = app
        .post(&uri)
        .bearer(&token)
        .json(&json!({ "name": "Flea treatment", "frequency": "monthly", "start_date": "2024-01-01" }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let dashboard: Value = app.get("/api/dashboard").bearer(&token).send().await.json().await;
    assert_eq!(dashboard["selectedPet"]["id"], pet["id"]);
    let upcoming = dashboard["upcomingMaintenance"].as_array().unwrap();
    assert_eq!(upcoming.len(), 1);
}

#[tokio::test]
#[serial]
async fn test_second_veterinarian_conflicts() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let token = app.token_for(app.create_profile().await);
    let pet = create_pet(&app, &token, "Luna").await;
    let uri = format!("/api/pets/{}/veterinarian", pet["id"].as_str().unwrap());
    let vet = json!({
        "country": "US",
        "address": "2 Oak Ave",
        "email": "vet@example.com",
        "phone_number": "+15550999"
    });

    let response = app.post(&uri).bearer(&token).json(&vet).send().await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.post(&uri).bearer(&token).json(&vet).send().await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[serial]
async fn test_subscription_lifecycle() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let token = app.token_for(app.create_profile().await);
    let pet = create_pet(&app, &token, "Coco").await;
    let pet_id = pet["id"].as_str().unwrap().to_string();

    let response = app
        .post("/api/pets/subscriptions")
        .bearer(&token)
        .json(&json!({ "petId": pet_id, "planType": "pro" }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let subscription: Value = response.json().await;
    assert_eq!(subscription["plan_type"], "pro");
    assert_eq!(subscription["status"], "active");

    let response = app
        .request(
            "DELETE",
            &format!("/api/pets/subscriptions?id={}", subscription["id"].as_str().unwrap()),
        )
        .bearer(&token)
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let canceled: Value = response.json().await;
    assert_eq!(canceled["cancel_at_period_end"], true);

    let summaries: Vec<Value> = app
        .get("/api/pets/subscriptions")
        .bearer(&token)
        .send()
        .await
        .json()
        .await;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0]["subscription"]["id"], subscription["id"]);

    let other = app.token_for(Uuid::new_v4());
    let response = app
        .get(&format!("/api/pets/subscriptions/{}", pet_id))
        .bearer(&other)
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn test_sub_resources_hidden_from_other_users() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let token = app.token_for(app.create_profile().await);
    let pet = create_pet(&app, &token, "Pepper").await;
    let pet_id = pet["id"].as_str().unwrap().to_string();

    let contact: Value = app
        .post(&format!("/api/pets/{}/contacts", pet_id))
        .bearer(&token)
        .json(&json!({
            "full_name": "Sam",
            "address": "1 Main St",
            "email": "sam@example.com",
            "phone_number": "+15550123"
        }))
        .send()
        .await
        .json()
        .await;
    let item: Value = app
        .post(&format!("/api/pets/{}/maintenance", pet_id))
        .bearer(&token)
        .json(&json!({ "name": "Vaccination", "frequency": "annually", "start_date": "2024-01-01" }))
        .send()
        .await
        .json()
        .await;
    let vet: Value = app
        .post(&format!("/api/pets/{}/veterinarian", pet_id))
        .bearer(&token)
        .json(&json!({
            "country": "US",
            "address": "2 Oak Ave",
            "email": "vet@example.com",
            "phone_number": "+15550999"
        }))
        .send()
        .await
        .json()
        .await;

    let stranger = app.token_for(app.create_profile().await);
    let cases = [
        ("contacts", json!({ "contactId": contact["id"], "full_name": "Mallory" })),
        ("maintenance", json!({ "maintenanceId": item["id"], "name": "Mallory" })),
        ("veterinarian", json!({ "vetId": vet["id"], "country": "FR" })),
    ];
    for (resource, body) in cases {
        let uri = format!("/api/pets/{}/{}", pet_id, resource);
        for method in ["GET", "POST", "PUT", "DELETE"] {
            for payload in [body.clone(), json!({})] {
                let mut request = app.request(method, &uri).bearer(&stranger);
                if method != "GET" {
                    request = request.json(&payload);
                }
                let response = request.send().await;
                assert_eq!(
                    response.status(),
                    StatusCode::NOT_FOUND,
                    "{method} {resource} with {payload}"
                );
                let error: Value = response.json().await;
                assert_eq!(error["error"], "Pet not found or access denied");
            }
        }
    }

    // The owner still sees everything untouched
    let contacts: Vec<Value> = app
        .get(&format!("/api/pets/{}/contacts", pet_id))
        .bearer(&token)
        .send()
        .await
        .json()
        .await;
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0]["full_name"], "Sam");
}

#[tokio::test]
#[serial]
async fn test_owner_missing_body_id_is_reported() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let token = app.token_for(app.create_profile().await);
    let pet = create_pet(&app, &token, "Biscuit").await;
    let pet_id = pet["id"].as_str().unwrap().to_string();

    let cases = [
        ("contacts", "Contact ID is required", "contactId"),
        ("maintenance", "Maintenance ID is required", "maintenanceId"),
        ("veterinarian", "Veterinarian ID is required", "vetId"),
    ];
    for (resource, message, field) in cases {
        let uri = format!("/api/pets/{}/{}", pet_id, resource);
        for method in ["PUT", "DELETE"] {
            let response = app
                .request(method, &uri)
                .bearer(&token)
                .json(&json!({ "name": "ignored" }))
                .send()
                .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{method} {resource}");
            let body: Value = response.json().await;
            assert_eq!(body["error"], message);
            assert_eq!(body["fields"], json!([field]));
        }
    }
}

#[tokio::test]
#[serial]
async fn test_concurrent_primary_contacts_leave_one_primary() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let token = app.token_for(app.create_profile().await);
    let pet = create_pet(&app, &token, "Ziggy").await;
    let uri = format!("/api/pets/{}/contacts", pet["id"].as_str().unwrap());

    let contact = |name: &str| {
        json!({
            "full_name": name,
            "address": "1 Main St",
            "email": "contact@example.com",
            "phone_number": "+15550123",
            "is_primary": true
        })
    };
    let first_body = contact("Sam");
    let second_body = contact("Jo");
    let (first, second) = tokio::join!(
        app.post(&uri).bearer(&token).json(&first_body).send(),
        app.post(&uri).bearer(&token).json(&second_body).send(),
    );

    let mut created = 0;
    for response in [first, second] {
        match response.status() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => {
                let body: Value = response.json().await;
                assert_eq!(
                    body["error"],
                    "The primary contact was changed by another request, please try again"
                );
            },
            other => panic!("unexpected status {other}"),
        }
    }
    assert!(created >= 1);

    let contacts: Vec<Value> = app.get(&uri).bearer(&token).send().await.json().await;
    assert_eq!(contacts.len(), created);
    let primaries = contacts.iter().filter(|c| c["is_primary"] == true).count();
    assert_eq!(primaries, 1);
}
