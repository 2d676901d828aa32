//! HTTP API integration tests.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};
use wordsprout::api::{AppState, SharedStore, build_router};
use wordsprout::config::ServerConfig;
use wordsprout_core::seed::seed;
use wordsprout_core::MemoryStore;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn server_and_state(rate_limit: u32) -> (TestServer, AppState) {
    let config = ServerConfig {
        rate_limit,
        ..ServerConfig::default()
    };
    let store: SharedStore = Box::new(MemoryStore::new());
    seed(&store).unwrap();
    let state = AppState::new(store, &config);
    let server = TestServer::new(build_router(state.clone(), &config).unwrap()).unwrap();
    (server, state)
}

fn server_with_limit(rate_limit: u32) -> TestServer {
    server_and_state(rate_limit).0
}

fn server() -> TestServer {
    server_with_limit(10_000)
}

async fn sign_up(server: &TestServer, email: &str) -> String {
    let response = server
        .post("/auth/sign-up")
        .json(&json!({ "name": "Parent", "email": email, "password": "secret1" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["token"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn add_child(server: &TestServer, token: &str, birth_date: &str) -> u64 {
    let response = server
        .post("/children")
        .authorization_bearer(token)
        .json(&json!({ "name": "Kid", "birth_date": birth_date }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["id"].as_u64().unwrap()
}

/// Ids of the first `n` level-0 words in the catalogue.
async fn level_zero_words(server: &TestServer, n: usize) -> Vec<u64> {
    let catalogue = server.get("/vocabulary").await.json::<Value>();
    let mut ids: Vec<u64> = catalogue
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|c| c["words"].as_array().unwrap().iter())
        .filter(|w| w["level"] == 0)
        .map(|w| w["id"].as_u64().unwrap())
        .collect();
    ids.sort_unstable();
    assert!(ids.len() >= n, "catalogue has only {} level-0 words", ids.len());
    ids.truncate(n);
    ids
}

async fn mark(server: &TestServer, token: &str, child: u64, word: u64, status: &str) -> Value {
    let response = server
        .put(&format!("/children/{}/words/{}", child, word))
        .authorization_bearer(token)
        .json(&json!({ "status": status }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}

// =============================================================================
// PUBLIC ENDPOINTS
// =============================================================================

#[tokio::test]
async fn test_health() {
    let server = server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "ok");
}

#[tokio::test]
async fn test_levels_lists_all_four() {
    let body = server().get("/levels").await.json::<Value>();
    let levels = body["levels"].as_array().unwrap();
    assert_eq!(levels.len(), 4);
    assert_eq!(levels[2]["name"], "Word Combinations");
    assert_eq!(body["guide"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_assess_by_vocabulary() {
    let server = server();
    let body = server
        .get("/levels/assess")
        .add_query_param("known_words", 55)
        .await
        .json::<Value>();
    assert_eq!(body["by_vocabulary"]["level"], 2);
    assert_eq!(body["by_vocabulary"]["source"], "vocabulary_size");
    assert!(body.get("by_age").is_none());
}

#[tokio::test]
async fn test_assess_rejects_bad_input() {
    let server = server();
    server
        .get("/levels/assess")
        .add_query_param("known_words", -1)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/levels/assess")
        .add_query_param("birth_date", "yesterday")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    let response = server.get("/levels/assess").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_exercises_by_level() {
    let server = server();
    let body = server
        .get("/exercises")
        .add_query_param("level", 1)
        .await
        .json::<Value>();
    let exercises = body.as_array().unwrap();
    assert!(!exercises.is_empty());
    assert!(exercises.iter().all(|e| e["level"] == 1));

    server
        .get("/exercises")
        .add_query_param("level", 9)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

// =============================================================================
// AUTH
// =============================================================================

#[tokio::test]
async fn test_children_require_auth() {
    let server = server();
    server
        .get("/children")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .get("/children")
        .authorization_bearer("not-a-session")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sign_up_sign_in_sign_out() {
    let server = server();
    sign_up(&server, "ana@example.com").await;

    server
        .post("/auth/sign-up")
        .json(&json!({ "name": "Ana", "email": "ana@example.com", "password": "secret1" }))
        .await
        .assert_status(StatusCode::CONFLICT);

    server
        .post("/auth/sign-in")
        .json(&json!({ "email": "ana@example.com", "password": "wrong!!" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .post("/auth/sign-in")
        .json(&json!({ "email": "ana@example.com", "password": "secret1" }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert!(body["user"].get("password_hash").is_none());
    let token = body["token"].as_str().unwrap().to_string();

    server
        .post("/auth/sign-out")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get("/children")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let server = server();
    let response = server
        .post("/auth/sign-up")
        .json(&json!({ "name": "No email" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());
}

// =============================================================================
// CHILDREN
// =============================================================================

#[tokio::test]
async fn test_add_child_seeds_level_from_age() {
    let server = server();
    let token = sign_up(&server, "p@example.com").await;

    let response = server
        .post("/children")
        .authorization_bearer(&token)
        .json(&json!({ "name": "Old enough", "birth_date": "2015-03-01" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let child = response.json::<Value>();
    assert_eq!(child["level"], 3);
    assert_eq!(child["level_source"], "age");

    server
        .post("/children")
        .authorization_bearer(&token)
        .json(&json!({ "name": "Future", "birth_date": "2999-01-01" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .post("/children")
        .authorization_bearer(&token)
        .json(&json!({ "name": "", "birth_date": "2020-01-01" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_children_are_scoped_to_parent() {
    let server = server();
    let alice = sign_up(&server, "alice@example.com").await;
    let bob = sign_up(&server, "bob@example.com").await;
    let child = add_child(&server, &alice, "2020-01-01").await;

    server
        .get(&format!("/children/{}", child))
        .authorization_bearer(&bob)
        .await
        .assert_status_not_found();
    server
        .delete(&format!("/children/{}", child))
        .authorization_bearer(&bob)
        .await
        .assert_status_not_found();

    let listed = server
        .get("/children")
        .authorization_bearer(&bob)
        .await
        .json::<Value>();
    assert!(listed.as_array().unwrap().is_empty());

    server
        .delete(&format!("/children/{}", child))
        .authorization_bearer(&alice)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get(&format!("/children/{}", child))
        .authorization_bearer(&alice)
        .await
        .assert_status_not_found();
}

// =============================================================================
// LEVEL RECOMPUTATION
// =============================================================================

#[tokio::test]
async fn test_marking_words_moves_level() {
    let server = server();
    let token = sign_up(&server, "p@example.com").await;
    let child = add_child(&server, &token, "2015-03-01").await;
    let words = level_zero_words(&server, 10).await;

    // Vocabulary size replaces the age-based level on the first mutation.
    let first = mark(&server, &token, child, words[0], "known").await;
    assert_eq!(first["previous"], 3);
    assert_eq!(first["current"], 0);
    assert_eq!(first["changed"], true);

    let mut last = first;
    for word in &words[1..] {
        last = mark(&server, &token, child, *word, "known").await;
    }
    assert_eq!(last["current"], 1);
    assert_eq!(last["changed"], true);
    assert_eq!(last["known_words"], 10);

    let removed = mark(&server, &token, child, words[0], "remove").await;
    assert_eq!(removed["previous"], 1);
    assert_eq!(removed["current"], 0);
    assert_eq!(removed["changed"], true);

    let again = mark(&server, &token, child, words[0], "remove").await;
    assert_eq!(again["changed"], false);
    assert_eq!(again["known_words"], 9);

    let vocabulary = server
        .get(&format!("/children/{}/vocabulary", child))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(vocabulary["total"], 9);
}

#[tokio::test]
async fn test_unknown_word_and_status() {
    let server = server();
    let token = sign_up(&server, "p@example.com").await;
    let child = add_child(&server, &token, "2020-01-01").await;
    let words = level_zero_words(&server, 1).await;

    server
        .put(&format!("/children/{}/words/{}", child, 999_999))
        .authorization_bearer(&token)
        .json(&json!({ "status": "known" }))
        .await
        .assert_status_not_found();
    server
        .put(&format!("/children/{}/words/{}", child, words[0]))
        .authorization_bearer(&token)
        .json(&json!({ "status": "forgotten" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_child_locks_released_after_requests() {
    let (server, state) = server_and_state(10_000);
    let token = sign_up(&server, "p@example.com").await;
    let child = add_child(&server, &token, "2020-01-01").await;
    let words = level_zero_words(&server, 1).await;

    for id in 1_000..1_050 {
        server
            .put(&format!("/children/{}/level", id))
            .authorization_bearer(&token)
            .json(&json!({ "level": 1 }))
            .await
            .assert_status_not_found();
        server
            .put(&format!("/children/{}/words/{}", id, words[0]))
            .authorization_bearer(&token)
            .json(&json!({ "status": "known" }))
            .await
            .assert_status_not_found();
    }
    assert_eq!(state.locks().tracked(), 0);

    mark(&server, &token, child, words[0], "known").await;
    server
        .delete(&format!("/children/{}", child))
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert_eq!(state.locks().tracked(), 0);
}

#[tokio::test]
async fn test_manual_override() {
    let server = server();
    let token = sign_up(&server, "p@example.com").await;
    let child = add_child(&server, &token, "2020-01-01").await;

    let response = server
        .put(&format!("/children/{}/level", child))
        .authorization_bearer(&token)
        .json(&json!({ "level": 1 }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["level"], 1);
    assert_eq!(body["level_source"], "manual_override");

    server
        .put(&format!("/children/{}/level", child))
        .authorization_bearer(&token)
        .json(&json!({ "level": 4 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

// =============================================================================
// EXERCISES & PROGRESS
// =============================================================================

#[tokio::test]
async fn test_record_exercise_and_progress() {
    let server = server();
    let token = sign_up(&server, "p@example.com").await;
    let child = add_child(&server, &token, "2020-01-01").await;

    let exercises = server
        .get("/exercises")
        .add_query_param("level", 0)
        .await
        .json::<Value>();
    let recognition = exercises
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["kind"] == "WORD_RECOGNITION")
        .unwrap()
        .clone();
    let correct_url = recognition["content"]["WORD_RECOGNITION"]["images"]
        .as_array()
        .unwrap()
        .iter()
        .find(|img| img["is_correct"] == true)
        .unwrap()["url"]
        .clone();
    let exercise_id = recognition["id"].as_u64().unwrap();

    let response = server
        .post(&format!("/children/{}/exercises/{}", child, exercise_id))
        .authorization_bearer(&token)
        .json(&json!({ "selected": [correct_url], "time_spent_secs": 20 }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let result = response.json::<Value>();
    assert_eq!(result["score"], 100);
    assert_eq!(result["status"], "COMPLETED");

    let progress = server
        .get(&format!("/children/{}/progress", child))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(progress["exercises_completed"], 1);
    assert_eq!(progress["average_score"], 100);
}

// =============================================================================
// RATE LIMITING
// =============================================================================

#[tokio::test]
async fn test_rate_limit_returns_429() {
    let server = server_with_limit(1);
    server.get("/health").await.assert_status_ok();
    server
        .get("/health")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}
