// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # API Integration Tests
//!
//! End-to-end HTTP flows over the full router and middleware stack.
//!
//! ## Test Categories
//!
//! - `test_session_*`: login, refresh, logout and cookies
//! - `test_gate_*`: token extraction and rejection
//! - `test_courses_*`: rule-driven listing, reads and updates

use axum::http::{header, Method};
use serde_json::json;

use campus_api::auth::{JwtConfig, TokenKind, TokenService};
use campus_bin::cli::AttackKind;
use campus_bin::commands::forge;
use campus_core::{resolve, IdentityStore};
use campus_tests::prelude::*;

const ACCESS_COOKIE: &str = "accessToken";
const REFRESH_COOKIE: &str = "refreshToken";

fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

// =============================================================================
// Session
// =============================================================================

#[tokio::test]
async fn test_session_health_is_public() {
    let app = TestApp::new();
    let response = app.send(TestRequest::get("/health")).await;

    assert_status(&response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_session_login_returns_pair_and_cookies() {
    let app = TestApp::new();
    let response = app
        .send(TestRequest::post("/login").json(json!({ "email": ADMIN.email, "password": ADMIN.password })))
        .await;

    assert_status(&response, StatusCode::OK);
    assert_eq!(response.body["tokenType"], "Bearer");
    assert_eq!(response.body["expiresIn"], 900);

    let tokens = Tokens::from_body(&response.body);
    assert_eq!(response.cookie_value(ACCESS_COOKIE).as_deref(), Some(tokens.access.as_str()));
    assert_eq!(response.cookie_value(REFRESH_COOKIE).as_deref(), Some(tokens.refresh.as_str()));

    let access = response.set_cookie(ACCESS_COOKIE).unwrap();
    assert!(access.contains("HttpOnly"));
    assert!(access.contains("Secure"));
    assert!(access.contains("SameSite=None"));
    assert!(access.contains("Path=/"));
    assert!(access.contains("Max-Age=900"));

    let refresh = response.set_cookie(REFRESH_COOKIE).unwrap();
    assert!(refresh.contains("Path=/refresh-token"));
}

#[tokio::test]
async fn test_session_bad_credentials() {
    let app = TestApp::new();

    let response = app
        .send(TestRequest::post("/login").json(json!({ "email": TEACHER1.email, "password": "wrong" })))
        .await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS");
    assert!(response.set_cookies().is_empty());

    let missing = app
        .send(TestRequest::post("/login").json(json!({ "email": TEACHER1.email })))
        .await;
    assert_error(&missing, StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_session_refresh_via_body() {
    let app = TestApp::new();
    let first = app.login(TEACHER1).await;

    let response = app
        .send(TestRequest::post("/refresh-token").json(json!({ "refreshToken": first.refresh })))
        .await;
    assert_status(&response, StatusCode::OK);

    let second = Tokens::from_body(&response.body);
    assert_ne!(second.refresh, first.refresh);
    assert!(response.set_cookie(ACCESS_COOKIE).is_some());

    let me = app.send(TestRequest::get("/me").bearer(&second.access)).await;
    assert_status(&me, StatusCode::OK);
    assert_eq!(me.body["id"], 2);
}

#[tokio::test]
async fn test_session_refresh_via_cookie() {
    let app = TestApp::new();
    let first = app.login(STUDENT1).await;

    let response = app
        .send(TestRequest::post("/refresh-token").cookie(REFRESH_COOKIE, &first.refresh))
        .await;
    assert_status(&response, StatusCode::OK);
}

#[tokio::test]
async fn test_session_refresh_requires_token() {
    let app = TestApp::new();

    let response = app.send(TestRequest::post("/refresh-token")).await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "TOKEN_NOT_PROVIDED");

    let garbage = app
        .send(TestRequest::post("/refresh-token").json(json!({ "refreshToken": "garbage" })))
        .await;
    assert_error(&garbage, StatusCode::UNAUTHORIZED, "INVALID_REFRESH_TOKEN");
}

#[tokio::test]
async fn test_session_rotated_refresh_expires_after_grace() {
    let app = TestApp::new();
    let first = app.login(TEACHER2).await;
    let body = json!({ "refreshToken": first.refresh });

    let rotated = app.send(TestRequest::post("/refresh-token").json(body.clone())).await;
    assert_status(&rotated, StatusCode::OK);

    let within = app.send(TestRequest::post("/refresh-token").json(body.clone())).await;
    assert_status(&within, StatusCode::OK);

    app.advance(61);
    let after = app.send(TestRequest::post("/refresh-token").json(body)).await;
    assert_error(&after, StatusCode::UNAUTHORIZED, "INVALID_REFRESH_TOKEN");
}

#[tokio::test]
async fn test_session_logout_clears_and_revokes() {
    let app = TestApp::new();
    let tokens = app.login(ADMIN).await;

    let response = app
        .send(
            TestRequest::post("/logout")
                .bearer(&tokens.access)
                .cookie(REFRESH_COOKIE, &tokens.refresh),
        )
        .await;
    assert_status(&response, StatusCode::NO_CONTENT);
    assert_cookies_cleared(&response, &[ACCESS_COOKIE, REFRESH_COOKIE]);

    let me = app.send(TestRequest::get("/me").bearer(&tokens.access)).await;
    assert_error(&me, StatusCode::UNAUTHORIZED, "INVALID_ACCESS_TOKEN");

    let refresh = app
        .send(TestRequest::post("/refresh-token").json(json!({ "refreshToken": tokens.refresh })))
        .await;
    assert_error(&refresh, StatusCode::UNAUTHORIZED, "INVALID_REFRESH_TOKEN");
}

#[tokio::test]
async fn test_session_logout_without_tokens_succeeds() {
    let app = TestApp::new();
    let response = app.send(TestRequest::post("/logout")).await;

    assert_status(&response, StatusCode::NO_CONTENT);
    assert_cookies_cleared(&response, &[ACCESS_COOKIE, REFRESH_COOKIE]);
}

// =============================================================================
// Gatekeeper
// =============================================================================

#[tokio::test]
async fn test_gate_requires_token() {
    let app = TestApp::new();

    for path in ["/me", "/courses", "/courses/1"] {
        let response = app.send(TestRequest::get(path)).await;
        assert_error(&response, StatusCode::UNAUTHORIZED, "TOKEN_NOT_PROVIDED");
    }
}

#[tokio::test]
async fn test_gate_accepts_bearer_and_cookie() {
    let app = TestApp::new();
    let tokens = app.login(STUDENT1).await;

    let bearer = app.send(TestRequest::get("/me").bearer(&tokens.access)).await;
    assert_status(&bearer, StatusCode::OK);
    assert_eq!(bearer.body["email"], STUDENT1.email);
    assert_eq!(bearer.body["roles"], json!(["Student"]));
    assert!(bearer.body["rules"].is_array());

    let cookie = app
        .send(TestRequest::get("/me").cookie(ACCESS_COOKIE, &tokens.access))
        .await;
    assert_status(&cookie, StatusCode::OK);
    assert_eq!(cookie.body["id"], 4);
}

#[tokio::test]
async fn test_gate_prefers_bearer_over_cookie() {
    let app = TestApp::new();
    let admin = app.login(ADMIN).await;
    let student = app.login(STUDENT1).await;

    let response = app
        .send(
            TestRequest::get("/me")
                .bearer(&admin.access)
                .cookie(ACCESS_COOKIE, &student.access),
        )
        .await;
    assert_eq!(response.body["id"], 1);
}

#[tokio::test]
async fn test_gate_rejects_refresh_token_as_access() {
    let app = TestApp::new();
    let tokens = app.login(TEACHER1).await;

    let response = app.send(TestRequest::get("/me").bearer(&tokens.refresh)).await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "INVALID_ACCESS_TOKEN");
}

#[tokio::test]
async fn test_gate_rejects_forged_tokens() {
    let app = TestApp::new();
    let genuine = app.login(STUDENT1).await.access;

    for kind in [AttackKind::None, AttackKind::AlgConfusion] {
        let forged = forge(kind, &genuine, PUBLIC_PEM).unwrap();
        let response = app.send(TestRequest::get("/courses").bearer(&forged)).await;
        assert_error(&response, StatusCode::UNAUTHORIZED, "INVALID_ACCESS_TOKEN");
    }
}

#[tokio::test]
async fn test_gate_rejects_foreign_signature() {
    let app = TestApp::new();
    let foreign = TokenService::new(JwtConfig::new(OTHER_PRIVATE_PEM, OTHER_PUBLIC_PEM)).unwrap();
    let subject = demo_identities().find_by_id(ADMIN.user_id()).await.unwrap().unwrap();
    let token = foreign
        .issue(&subject, &resolve(&subject).unwrap(), TokenKind::Access)
        .unwrap();

    let response = app.send(TestRequest::get("/courses").bearer(&token)).await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "INVALID_ACCESS_TOKEN");
}

#[tokio::test]
async fn test_gate_reports_expiry() {
    let app = TestApp::new();
    let tokens = app.state.auth().tokens();
    let subject = demo_identities().find_by_id(TEACHER1.user_id()).await.unwrap().unwrap();
    let mut claims = tokens.claims_for(&subject, &resolve(&subject).unwrap(), TokenKind::Access);
    claims.iat = now() - 7200;
    claims.exp = now() - 3600;
    let expired = tokens.sign(&claims).unwrap();

    let response = app.send(TestRequest::get("/me").bearer(&expired)).await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED");
}

#[tokio::test]
async fn test_gate_fails_closed_when_revocations_unavailable() {
    let clock = std::sync::Arc::new(campus_api::auth::ManualClock::starting_now());
    let store = std::sync::Arc::new(FlakyStore::new(clock.clone()));
    let app = TestApp::builder().clock(clock).revocation_store(store.clone()).build();
    let tokens = app.login(ADMIN).await;

    store.set_failing(true);
    let response = app.send(TestRequest::get("/courses").bearer(&tokens.access)).await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "INVALID_ACCESS_TOKEN");
}

#[tokio::test]
async fn test_gate_covers_unknown_routes() {
    let app = TestApp::new();

    let anonymous = app.send(TestRequest::get("/nowhere")).await;
    assert_error(&anonymous, StatusCode::UNAUTHORIZED, "TOKEN_NOT_PROVIDED");

    let tokens = app.login(ADMIN).await;
    let known = app.send(TestRequest::get("/nowhere").bearer(&tokens.access)).await;
    assert_status(&known, StatusCode::NOT_FOUND);
}

// =============================================================================
// Courses
// =============================================================================

#[tokio::test]
async fn test_courses_listing_follows_rules() {
    let app = TestApp::new();

    for (user, expected) in [
        (ADMIN, vec![1, 2, 3]),
        (TEACHER1, vec![1, 3]),
        (TEACHER2, vec![2]),
        (STUDENT1, vec![1]),
    ] {
        let tokens = app.login(user).await;
        let response = app.send(TestRequest::get("/courses").bearer(&tokens.access)).await;
        assert_status(&response, StatusCode::OK);
        assert_eq!(body_ids(&response), expected, "courses for {}", user.email);
    }
}

#[tokio::test]
async fn test_courses_read_single() {
    let app = TestApp::new();
    let student = app.login(STUDENT1).await;

    let enrolled = app.send(TestRequest::get("/courses/1").bearer(&student.access)).await;
    assert_status(&enrolled, StatusCode::OK);
    assert_eq!(enrolled.body["name"], "Algorithms");

    let dropped = app.send(TestRequest::get("/courses/2").bearer(&student.access)).await;
    assert_error(&dropped, StatusCode::FORBIDDEN, "FORBIDDEN");

    let missing = app.send(TestRequest::get("/courses/99").bearer(&student.access)).await;
    assert_error(&missing, StatusCode::NOT_FOUND, "NOT_FOUND");
}

#[tokio::test]
async fn test_courses_teacher_updates_description() {
    let app = TestApp::new();
    let teacher = app.login(TEACHER1).await;

    let response = app
        .send(
            TestRequest::patch("/courses/1")
                .bearer(&teacher.access)
                .json(json!({ "description": "Graphs and greed" })),
        )
        .await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(response.body["description"], "Graphs and greed");

    let read_back = app.send(TestRequest::get("/courses/1").bearer(&teacher.access)).await;
    assert_eq!(read_back.body["description"], "Graphs and greed");
}

#[tokio::test]
async fn test_courses_teacher_cannot_rename() {
    let app = TestApp::new();
    let teacher = app.login(TEACHER1).await;

    let response = app
        .send(
            TestRequest::patch("/courses/1")
                .bearer(&teacher.access)
                .json(json!({ "name": "Renamed", "description": "x" })),
        )
        .await;
    assert_error(&response, StatusCode::FORBIDDEN, "FORBIDDEN");

    let unchanged = app.send(TestRequest::get("/courses/1").bearer(&teacher.access)).await;
    assert_eq!(unchanged.body["name"], "Algorithms");
}

#[tokio::test]
async fn test_courses_teacher_cannot_touch_other_course() {
    let app = TestApp::new();
    let teacher = app.login(TEACHER2).await;

    let response = app
        .send(
            TestRequest::patch("/courses/1")
                .bearer(&teacher.access)
                .json(json!({ "description": "mine now" })),
        )
        .await;
    assert_error(&response, StatusCode::FORBIDDEN, "FORBIDDEN");
}

#[tokio::test]
async fn test_courses_student_cannot_update() {
    let app = TestApp::new();
    let student = app.login(STUDENT1).await;

    let response = app
        .send(
            TestRequest::patch("/courses/1")
                .bearer(&student.access)
                .json(json!({ "description": "x" })),
        )
        .await;
    assert_error(&response, StatusCode::FORBIDDEN, "FORBIDDEN");
}

#[tokio::test]
async fn test_courses_invalid_patches() {
    let app = TestApp::new();
    let admin = app.login(ADMIN).await;

    let unknown = app
        .send(
            TestRequest::patch("/courses/1")
                .bearer(&admin.access)
                .json(json!({ "teacher": 3 })),
        )
        .await;
    assert_error(&unknown, StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR");

    let empty = app
        .send(TestRequest::patch("/courses/1").bearer(&admin.access).json(json!({})))
        .await;
    assert_error(&empty, StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR");

    let admin_rename = app
        .send(
            TestRequest::patch("/courses/3")
                .bearer(&admin.access)
                .json(json!({ "name": "Code Generation" })),
        )
        .await;
    assert_status(&admin_rename, StatusCode::OK);
    assert_eq!(admin_rename.body["name"], "Code Generation");
}

#[tokio::test]
async fn test_courses_bad_path_id() {
    let app = TestApp::new();
    let admin = app.login(ADMIN).await;

    let response = app
        .send(TestRequest::new(Method::GET, "/courses/abc").bearer(&admin.access))
        .await;
    assert_error(&response, StatusCode::BAD_REQUEST, "BAD_REQUEST");
}

#[tokio::test]
async fn test_courses_cors_preflight() {
    let app = TestApp::new();
    let response = app
        .send(
            TestRequest::new(Method::OPTIONS, "/courses")
                .header(header::ORIGIN, "https://campus.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET"),
        )
        .await;

    assert!(response.headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
