//! Web API Authentication Tests
//!
//! Integration tests for registration, login, logout and the auth gate.

use arquivista::file::Classifier;
use arquivista::{Config, Database, FileStore, WebServer};
use axum::http::header::{AUTHORIZATION, SET_COOKIE};
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::Value;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Create a test configuration.
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.web.host = "127.0.0.1".to_string();
    config.web.port = 0;
    config
}

/// Create a test server with an in-memory database and a temp upload root.
async fn create_test_server(config: Config) -> (TestServer, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let store = FileStore::new(temp_dir.path().join("uploads"), Classifier::default())
        .expect("Failed to create file store");

    let router = WebServer::new(&config, db, store)
        .expect("Failed to create web server")
        .router();

    let server = TestServer::new(router).expect("Failed to create test server");

    (server, temp_dir)
}

/// Helper to register an account and return the response body.
async fn register_account(server: &TestServer, username: &str, password: &str) -> Value {
    let response = server
        .post("/register")
        .form(&[("username", username), ("password", password)])
        .await;

    response.json::<Value>()
}

/// Get the session token from a login/register response.
fn get_token(response: &Value) -> String {
    response["data"]["token"].as_str().unwrap().to_string()
}

// ============================================================================
// Registration Tests
// ============================================================================

#[tokio::test]
async fn test_register_success() {
    let (server, _temp) = create_test_server(create_test_config()).await;

    let response = server
        .post("/register")
        .form(&[("username", "alice"), ("password", "password123")])
        .await;

    response.assert_status_ok();
    let set_cookie = response.header(SET_COOKIE);
    let set_cookie = set_cookie.to_str().unwrap();
    assert!(set_cookie.starts_with("arquivista_session="));
    assert!(set_cookie.contains("HttpOnly"));

    let body: Value = response.json();
    assert!(body["data"]["token"].is_string());
    assert_eq!(body["data"]["account"]["username"], "alice");
    assert!(body["data"]["account"]["id"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let (server, _temp) = create_test_server(create_test_config()).await;

    register_account(&server, "alice", "password123").await;

    let response = server
        .post("/register")
        .form(&[("username", "alice"), ("password", "another_password")])
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "CONFLICT");

    // The original password still works
    let response = server
        .post("/login")
        .form(&[("username", "alice"), ("password", "password123")])
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_register_usernames_are_case_sensitive() {
    let (server, _temp) = create_test_server(create_test_config()).await;

    let lower = register_account(&server, "alice", "password123").await;
    let upper = register_account(&server, "Alice", "password123").await;

    assert_ne!(
        lower["data"]["account"]["id"],
        upper["data"]["account"]["id"]
    );
}

#[tokio::test]
async fn test_register_validation_errors() {
    let (server, _temp) = create_test_server(create_test_config()).await;

    let response = server
        .post("/register")
        .form(&[("username", ""), ("password", "password123")])
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["details"]["username"].is_array());

    let response = server
        .post("/register")
        .form(&[("username", "alice"), ("password", "short")])
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert!(body["error"]["details"]["password"].is_array());
}

// ============================================================================
// Login Tests
// ============================================================================

#[tokio::test]
async fn test_login_success() {
    let (server, _temp) = create_test_server(create_test_config()).await;
    register_account(&server, "alice", "password123").await;

    let response = server
        .post("/login")
        .form(&[("username", "alice"), ("password", "password123")])
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let token = get_token(&body);

    let response = server
        .get("/me")
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["username"], "alice");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (server, _temp) = create_test_server(create_test_config()).await;
    register_account(&server, "alice", "password123").await;

    let wrong_password = server
        .post("/login")
        .form(&[("username", "alice"), ("password", "wrong_password")])
        .await;
    let unknown_user = server
        .post("/login")
        .form(&[("username", "mallory"), ("password", "password123")])
        .await;

    wrong_password.assert_status(StatusCode::UNAUTHORIZED);
    unknown_user.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.text(), unknown_user.text());
}

#[tokio::test]
async fn test_login_missing_fields() {
    let (server, _temp) = create_test_server(create_test_config()).await;

    let response = server
        .post("/login")
        .form(&[("username", "alice"), ("password", "")])
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_login_lockout_after_repeated_failures() {
    let mut config = create_test_config();
    config.auth.max_login_attempts = 2;
    let (server, _temp) = create_test_server(config).await;
    register_account(&server, "alice", "password123").await;

    for _ in 0..2 {
        server
            .post("/login")
            .form(&[("username", "alice"), ("password", "wrong_password")])
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    // Even the right password is refused while locked
    let response = server
        .post("/login")
        .form(&[("username", "alice"), ("password", "password123")])
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);

    // Other usernames are unaffected
    register_account(&server, "bob", "password123").await;
    server
        .post("/login")
        .form(&[("username", "bob"), ("password", "password123")])
        .await
        .assert_status_ok();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_logins_in_progress_do_not_stall_other_requests() {
    let (server, _temp) = create_test_server(create_test_config()).await;
    let alice = register_account(&server, "alice", "password123").await;
    let token = get_token(&alice);
    register_account(&server, "bob", "password123").await;

    let wrong_login = || async {
        server
            .post("/login")
            .form(&[("username", "bob"), ("password", "wrong_password")])
            .await
    };

    let logins = async {
        tokio::join!(wrong_login(), wrong_login(), wrong_login(), wrong_login());
        Instant::now()
    };

    let listing = async {
        // Let the logins reach password verification first
        tokio::time::sleep(Duration::from_millis(20)).await;
        let started = Instant::now();
        let response = server
            .get("/")
            .add_header(AUTHORIZATION, format!("Bearer {}", token))
            .await;
        (response, started.elapsed(), Instant::now())
    };

    let (logins_done, (response, listing_time, listing_done)) = tokio::join!(logins, listing);

    response.assert_status_ok();
    assert!(listing_done < logins_done);
    assert!(listing_time < Duration::from_secs(1));
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
async fn test_me_requires_login() {
    let (server, _temp) = create_test_server(create_test_config()).await;

    let response = server.get("/me").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .get("/me")
        .add_header(AUTHORIZATION, "Bearer not-a-session")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_cookie_authenticates() {
    let (server, _temp) = create_test_server(create_test_config()).await;

    let response = server
        .post("/register")
        .form(&[("username", "alice"), ("password", "password123")])
        .await;
    let cookie = response.cookie("arquivista_session");

    let response = server.get("/me").add_cookie(cookie).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["username"], "alice");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let (server, _temp) = create_test_server(create_test_config()).await;
    let body = register_account(&server, "alice", "password123").await;
    let token = get_token(&body);

    server
        .get("/me")
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .await
        .assert_status_ok();

    let response = server
        .post("/logout")
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .await;
    response.assert_status_ok();

    let response = server
        .get("/me")
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_session_is_ok() {
    let (server, _temp) = create_test_server(create_test_config()).await;

    server.post("/logout").await.assert_status_ok();
}

#[tokio::test]
async fn test_login_not_required_uses_local_account() {
    let mut config = create_test_config();
    config.auth.require_login = false;
    let (server, _temp) = create_test_server(config).await;

    let response = server.get("/me").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["id"], 0);
    assert_eq!(body["data"]["username"], "local");
}

#[tokio::test]
async fn test_health_check() {
    let (server, _temp) = create_test_server(create_test_config()).await;

    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}
