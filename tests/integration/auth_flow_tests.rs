//! HTTP-level tests of registration, login, logout and session resolution

use crate::test_utils::*;
use axum::http::{header, Method, Request, StatusCode};
use axum::body::Body;
use futures_util::future::join_all;
use luxe_backend::auth::{TokenIssuer, SESSION_COOKIE};
use luxe_backend::config::DeploymentMode;
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

fn registration(email: &str, password: &str) -> serde_json::Value {
    json!({ "name": "Monaco Guest", "email": email, "password": password })
}

#[tokio::test]
async fn test_register_sets_session_cookie() {
    let TestApp { app, .. } = setup_test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            registration("guest@example.com", "riviera-2024"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = set_cookie_for(&response, SESSION_COOKIE).expect("session cookie set");
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("Secure"));
    let token = cookie_value(&response, SESSION_COOKIE).unwrap();

    let body = body_json(response).await;
    assert_eq!(body, json!({ "success": true, "message": "Registration Successfully" }));
    assert!(!body.to_string().contains(&token));

    // the cookie is a working session
    let response = app
        .oneshot(empty_request("GET", "/auth/me", Some(&format!("{SESSION_COOKIE}={token}"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["email"], "guest@example.com");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_register_rejections() {
    let TestApp { app, .. } = setup_test_app();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/auth/register", json!({ "email": "a@example.com" }), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "success": false, "message": "All fields are required" })
    );

    let response = app
        .clone()
        .oneshot(json_request("POST", "/auth/register", registration("a@example.com", "12345"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "Password must be at least 6 characters"
    );

    let ok = app
        .clone()
        .oneshot(json_request("POST", "/auth/register", registration("a@example.com", "123456"), None))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request("POST", "/auth/register", registration("A@Example.com", "654321"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "User already exists");
}

#[tokio::test]
async fn test_malformed_body_is_a_validation_error() {
    let TestApp { app, .. } = setup_test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);

    let response = app.oneshot(empty_request("POST", "/auth/register", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_concurrent_registration_single_success() {
    let TestApp { app, .. } = setup_test_app();

    let attempts = (0..8).map(|i| {
        let app = app.clone();
        async move {
            app.oneshot(json_request(
                "POST",
                "/auth/register",
                registration("race@example.com", &format!("password-{i}")),
                None,
            ))
            .await
            .unwrap()
            .status()
        }
    });
    let statuses = join_all(attempts).await;

    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert!(statuses
        .iter()
        .all(|s| *s == StatusCode::OK || *s == StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn test_login_does_not_reveal_accounts() {
    let TestApp { app, .. } = setup_test_app();
    app.clone()
        .oneshot(json_request("POST", "/auth/register", registration("guest@example.com", "riviera-2024"), None))
        .await
        .unwrap();

    let unknown = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "email": "ghost@example.com", "password": "riviera-2024" }),
            None,
        ))
        .await
        .unwrap();
    let wrong = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "email": "guest@example.com", "password": "riviera-2025" }),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
    assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookie_for(&wrong, SESSION_COOKIE).is_none());
    assert_eq!(body_json(unknown).await, body_json(wrong).await);

    let ok = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "email": "GUEST@example.com", "password": "riviera-2024" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    assert!(cookie_value(&ok, SESSION_COOKIE).is_some());
    assert_eq!(body_json(ok).await["message"], "Login Successfully");
}

#[tokio::test]
async fn test_admin_login_scenario() {
    let TestApp { app, state } = setup_test_app();
    seed_admin(&state, "owner@example.com", "helipad-pass").await;
    app.clone()
        .oneshot(json_request("POST", "/auth/register", registration("guest@example.com", "riviera-2024"), None))
        .await
        .unwrap();

    let user_attempt = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login/admin",
            json!({ "email": "guest@example.com", "password": "riviera-2024" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(user_attempt.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookie_for(&user_attempt, SESSION_COOKIE).is_none());
    assert_eq!(body_json(user_attempt).await["message"], "Invalid Credentials");

    let admin_attempt = app
        .oneshot(json_request(
            "POST",
            "/auth/login/admin",
            json!({ "email": "owner@example.com", "password": "helipad-pass" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(admin_attempt.status(), StatusCode::OK);
    assert!(cookie_value(&admin_attempt, SESSION_COOKIE).is_some());
}

#[tokio::test]
async fn test_logout_without_session() {
    let TestApp { app, .. } = setup_test_app();

    let response = app.oneshot(empty_request("POST", "/auth/logout", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = set_cookie_for(&response, SESSION_COOKIE).expect("clearing cookie sent");
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
    assert_eq!(
        body_json(response).await,
        json!({ "success": true, "message": "Logout Successfully" })
    );
}

#[tokio::test]
async fn test_me_rejections() {
    let TestApp { app, state } = setup_test_app();

    let response = app.clone().oneshot(empty_request("GET", "/auth/me", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await,
        json!({ "success": false, "message": "Unauthorized Token" })
    );

    // token for an account that does not exist
    let orphan = state.auth.tokens().issue(luxe_common::UserId::new_v4()).unwrap();
    let response = app
        .clone()
        .oneshot(empty_request("GET", "/auth/me", Some(&format!("{SESSION_COOKIE}={orphan}"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // expired token for a real account
    let session = state
        .auth
        .register(luxe_common::RegisterRequest {
            name: Some("Old".into()),
            email: Some("old@example.com".into()),
            password: Some("old-password".into()),
        })
        .await
        .unwrap();
    let issuer = TokenIssuer::new(TEST_SECRET.as_bytes(), chrono::Duration::days(30));
    let expired = issuer
        .issue_at(session.user.id, chrono::Utc::now() - chrono::Duration::days(31))
        .unwrap();
    let response = app
        .oneshot(empty_request("GET", "/auth/me", Some(&format!("{SESSION_COOKIE}={expired}"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_production_cookie_flags() {
    let mut settings = test_settings();
    settings.mode = DeploymentMode::Production;
    let TestApp { app, .. } = setup_test_app_with_settings(settings);

    let response = app
        .oneshot(json_request("POST", "/auth/register", registration("prod@example.com", "riviera-2024"), None))
        .await
        .unwrap();
    let cookie = set_cookie_for(&response, SESSION_COOKIE).unwrap();
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Max-Age=2592000"));
}

#[tokio::test]
async fn test_accounts_persist_in_flat_files() {
    let dir = TempDir::new().unwrap();
    {
        let TestApp { app, .. } = setup_flat_file_app(&dir);
        let response = app
            .oneshot(json_request("POST", "/auth/register", registration("villa@example.com", "riviera-2024"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let TestApp { app, .. } = setup_flat_file_app(&dir);
    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "email": "villa@example.com", "password": "riviera-2024" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_recovers_from_truncated_email_index() {
    let dir = TempDir::new().unwrap();
    let TestApp { app, .. } = setup_flat_file_app(&dir);
    let response = app
        .clone()
        .oneshot(json_request("POST", "/auth/register", registration("villa@example.com", "riviera-2024"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // leave the store as a crash mid-claim would: no records, empty index entry
    let users = dir.path().join("users");
    for entry in std::fs::read_dir(&users).unwrap().flatten() {
        if entry.path().extension().is_some_and(|ext| ext == "json") {
            std::fs::remove_file(entry.path()).unwrap();
        }
    }
    for entry in std::fs::read_dir(users.join("by-email")).unwrap().flatten() {
        std::fs::write(entry.path(), b"").unwrap();
    }

    let TestApp { app, .. } = setup_flat_file_app(&dir);
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/auth/login",
                json!({ "email": "villa@example.com", "password": "riviera-2024" }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "Invalid Credentials");
    }

    let response = app
        .clone()
        .oneshot(json_request("POST", "/auth/register", registration("villa@example.com", "riviera-2025"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request("POST", "/auth/register", registration("villa@example.com", "riviera-2026"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "User already exists");
}

#[tokio::test]
async fn test_whitespace_password_round_trips() {
    let TestApp { app, .. } = setup_test_app();
    let response = app
        .clone()
        .oneshot(json_request("POST", "/auth/register", registration("space@example.com", "        "), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "email": "space@example.com", "password": "        " }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_cors() {
    let TestApp { app, .. } = setup_test_app();

    let response = app.clone().oneshot(empty_request("GET", "/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/auth/login")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(preflight).await.unwrap();
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}
