// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication handlers.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::auth::AuthError;
use crate::error::{ApiError, ApiResult, ValidationErrors};
use crate::extractors::{bearer_token, Auth, ValidatedJson};
use crate::response::{CurrentUserResponse, TokenResponse};
use crate::state::AppState;

// =============================================================================
// Login
// =============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email.
    #[serde(default)]
    pub email: String,
    /// Password.
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    fn validate(&self) -> ApiResult<()> {
        let mut errors = ValidationErrors::new();
        if self.email.trim().is_empty() {
            errors.add("email", "is required");
        }
        if self.password.is_empty() {
            errors.add("password", "is required");
        }
        errors.into_result(())
    }
}

/// POST /login
///
/// Checks credentials, returns a token pair and sets both token cookies.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    request.validate()?;

    let pair = state.auth().login(&request.email, &request.password).await?;

    let mut headers = HeaderMap::new();
    state.cookies.set_pair(&mut headers, &pair);
    Ok((headers, Json(TokenResponse::from(&pair))))
}

// =============================================================================
// Refresh Token
// =============================================================================

/// Optional body of refresh and logout requests.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token.
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
}

impl RefreshRequest {
    /// Parses an optional JSON body. An empty body is an empty request.
    fn parse(body: &[u8]) -> ApiResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(body)?)
    }

    fn token(self) -> Option<String> {
        self.refresh_token.filter(|token| !token.trim().is_empty())
    }
}

/// POST /refresh-token
///
/// The refresh token is taken from the body, then the bearer header, then
/// the refresh cookie. Rotates the pair and re-sets both cookies.
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let token = RefreshRequest::parse(&body)?
        .token()
        .or_else(|| bearer_token(&headers).map(str::to_string))
        .or_else(|| state.cookies.refresh_token(&headers))
        .ok_or(ApiError::Auth(AuthError::TokenNotProvided))?;

    let pair = state.auth().refresh(&token).await?;

    let mut response_headers = HeaderMap::new();
    state.cookies.set_pair(&mut response_headers, &pair);
    Ok((response_headers, Json(TokenResponse::from(&pair))))
}

// =============================================================================
// Logout
// =============================================================================

/// POST /logout
///
/// Revokes whichever tokens are present. Always 204 with both cookies
/// cleared.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let access = bearer_token(&headers)
        .map(str::to_string)
        .or_else(|| state.cookies.access_token(&headers));

    let refresh = match RefreshRequest::parse(&body) {
        Ok(request) => request.token(),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unreadable logout body");
            None
        }
    }
    .or_else(|| state.cookies.refresh_token(&headers));

    state.auth().logout(access.as_deref(), refresh.as_deref()).await;

    let mut response_headers = HeaderMap::new();
    state.cookies.clear(&mut response_headers);
    (StatusCode::NO_CONTENT, response_headers)
}

// =============================================================================
// Current User
// =============================================================================

/// GET /me
///
/// Returns the caller's identity and the rules carried by the token.
pub async fn current_user(Auth(ctx): Auth) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse::from(&ctx))
}

// =============================================================================
// Tests
// =============================================================================
