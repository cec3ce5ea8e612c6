//! API integration tests against a running server.
//!
//! Start the server with JWT_SECRET=api-test-secret, load `seed-demo`, then
//! run with: cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};

use gymslots_server::models::{PrincipalClaims, Role};

const BASE_URL: &str = "http://localhost:8080/api/v1";
const SECRET: &str = "api-test-secret";

/// Helper to mint a token the way the access gate would
fn get_auth_token(role: Role, client_id: Option<i32>) -> String {
    let now = chrono::Utc::now().timestamp();
    PrincipalClaims {
        sub: "api-tests".to_string(),
        role,
        client_id,
        email: None,
        exp: now + 600,
        iat: now,
    }
    .create_token(SECRET)
    .expect("Failed to create token")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_ready_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[ignore]
async fn test_list_clients() {
    let client = Client::new();
    let token = get_auth_token(Role::Staff, None);

    let response = client
        .get(format!("{}/clients", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}

#[tokio::test]
#[ignore]
async fn test_occupancy_grid() {
    let client = Client::new();
    let token = get_auth_token(Role::Staff, None);

    let response = client
        .get(format!("{}/occupancy/1", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["weekday_name"], "Lunes");
    for equipment in body["equipment"].as_array().expect("No equipment array") {
        assert_eq!(equipment["slots"].as_array().map(|s| s.len()), Some(48));
    }
}

#[tokio::test]
#[ignore]
async fn test_book_and_cancel() {
    let client = Client::new();
    let token = get_auth_token(Role::Staff, None);

    let equipment: Value = client
        .get(format!("{}/equipment", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let equipment_id = equipment[0]["id"].as_i64().expect("No equipment seeded");

    let clients: Value = client
        .get(format!("{}/clients", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let client_id = clients[0]["id"].as_i64().expect("No client seeded");

    let booking = json!({
        "client_id": client_id,
        "equipment_id": equipment_id,
        "weekday": 5,
        "starts": ["23:00", "23:30"]
    });

    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .bearer_auth(&token)
        .json(&booking)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let created: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(created[1]["end_time"], "00:00");

    let conflict = client
        .post(format!("{}/reservations", BASE_URL))
        .bearer_auth(&token)
        .json(&booking)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(conflict.status(), 409);
    let body: Value = conflict.json().await.expect("Failed to parse response");
    assert_eq!(body["conflicts"], json!(["23:00", "23:30"]));

    for reservation in created.as_array().expect("No reservations") {
        let response = client
            .delete(format!("{}/reservations/{}", BASE_URL, reservation["id"]))
            .bearer_auth(&token)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 204);
    }
}

#[tokio::test]
#[ignore]
async fn test_unauthenticated_request() {
    let client = Client::new();

    let response = client
        .get(format!("{}/billing/delinquents", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}
