#![allow(dead_code)]

use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestResponse, TestServer};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use std::sync::Arc;
use zigzag::core::{AppState, Config, Mailer, MemoryMailer};

pub const TEST_PASSWORD: &str = "Password123";

/// Configurazione di test: rate limiting largo, i test che lo verificano
/// costruiscono la propria
pub fn test_config() -> Config {
    Config {
        jwt_secret: "ilmiobellissimosegretochevaassolutamentecambiato".to_string(),
        login_rate_per_minute: 1000,
        register_rate_per_minute: 1000,
        ..Config::default()
    }
}

/// Crea un AppState per i test
pub fn create_test_state(pool: SqlitePool) -> Arc<AppState> {
    Arc::new(AppState::new(pool, test_config()))
}

/// AppState che conserva le email inviate
pub fn create_test_state_with_mailer(
    pool: SqlitePool,
    config: Config,
) -> (Arc<AppState>, Arc<MemoryMailer>) {
    let mailer = Arc::new(MemoryMailer::default());
    let state = AppState::with_mailer(pool, config, mailer.clone() as Arc<dyn Mailer>);
    (Arc::new(state), mailer)
}

/// Crea un TestServer per i test
pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = zigzag::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Genera un JWT token per testing
pub fn create_test_jwt(user_id: i32, username: &str, jwt_secret: &str) -> String {
    zigzag::core::encode_jwt(username.to_string(), user_id, jwt_secret)
        .expect("Failed to create JWT token")
}

pub fn auth_header() -> HeaderName {
    HeaderName::from_static("authorization")
}

pub fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).expect("valid header value")
}

/// Utente registrato tramite API
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i32,
    pub username: String,
    pub token: String,
}

pub async fn register(server: &TestServer, username: &str) -> TestUser {
    let response = server
        .post("/api/register/")
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": TEST_PASSWORD,
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let body: Value = response.json();
    TestUser {
        id: body["user"]["id"].as_i64().expect("user id") as i32,
        username: username.to_string(),
        token: body["access"].as_str().expect("access token").to_string(),
    }
}

/// Crea una cerchia con i membri indicati e ne ritorna l'id
pub async fn create_circle(server: &TestServer, owner: &TestUser, name: &str, members: &[i32]) -> i32 {
    let response = server
        .post("/api/events/circles/")
        .add_header(auth_header(), bearer(&owner.token))
        .json(&json!({ "name": name, "member_ids": members }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["id"].as_i64().expect("circle id") as i32
}

pub async fn create_event(server: &TestServer, owner: &TestUser, body: Value) -> TestResponse {
    server
        .post("/api/events/event/")
        .add_header(auth_header(), bearer(&owner.token))
        .json(&body)
        .await
}

/// Evento condiviso (o no) con una cerchia, ritorna l'id
pub async fn create_event_in_circle(
    server: &TestServer,
    owner: &TestUser,
    circle_id: i32,
    shared: bool,
) -> String {
    let response = create_event(
        server,
        owner,
        json!({
            "title": "Aperitivo",
            "description": "Navigli",
            "start_time": "2030-06-01T18:00:00Z",
            "end_time": "2030-06-01T21:00:00Z",
            "circle_ids": [circle_id],
            "event_shared": shared,
        }),
    )
    .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["id"]
        .as_str()
        .expect("event id")
        .to_string()
}

/// Salva un indirizzo dell'utente e ne ritorna l'id
pub async fn create_address(server: &TestServer, owner: &TestUser, line: &str) -> i64 {
    let response = server
        .post("/api/events/user/addresses/")
        .add_header(auth_header(), bearer(&owner.token))
        .json(&json!({
            "address_line": line,
            "city": "Torino",
            "latitude": 45.07,
            "longitude": 7.68,
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["id"].as_i64().expect("address id")
}
