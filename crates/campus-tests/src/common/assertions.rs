// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Assertion Helpers

use axum::http::StatusCode;

use super::harness::TestResponse;

/// Asserts the status, printing the body on mismatch.
#[track_caller]
pub fn assert_status(response: &TestResponse, expected: StatusCode) {
    assert_eq!(
        response.status, expected,
        "unexpected status, body: {}",
        response.body
    );
}

/// Asserts an error response with the given status and code.
#[track_caller]
pub fn assert_error(response: &TestResponse, status: StatusCode, code: &str) {
    assert_status(response, status);
    assert_eq!(
        response.error_code(),
        Some(code),
        "unexpected error body: {}",
        response.body
    );
    assert!(
        response.body["error"]["message"].is_string(),
        "error body without message: {}",
        response.body
    );
}

/// Ids of the objects in a JSON array body.
#[track_caller]
pub fn body_ids(response: &TestResponse) -> Vec<i64> {
    response
        .body
        .as_array()
        .unwrap_or_else(|| panic!("expected an array body, got {}", response.body))
        .iter()
        .map(|item| item["id"].as_i64().expect("numeric id"))
        .collect()
}

/// Asserts that both token cookies were expired.
#[track_caller]
pub fn assert_cookies_cleared(response: &TestResponse, names: &[&str]) {
    for name in names {
        let line = response
            .set_cookie(name)
            .unwrap_or_else(|| panic!("no Set-Cookie for {}", name));
        assert!(line.contains("Max-Age=0"), "{} not cleared: {}", name, line);
    }
}
