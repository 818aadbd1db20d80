// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token cookies.

use axum::http::{header, HeaderMap, HeaderValue};
use cookie::time::Duration as CookieDuration;
use cookie::Cookie;

use crate::auth::TokenPair;
use crate::config::CookieConfig;

/// Reads and writes the access and refresh token cookies.
#[derive(Debug, Clone)]
pub struct TokenCookies {
    config: CookieConfig,
}

impl TokenCookies {
    /// Creates the helper from configuration.
    pub fn new(config: CookieConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CookieConfig {
        &self.config
    }

    /// Reads the access token cookie.
    pub fn access_token(&self, headers: &HeaderMap) -> Option<String> {
        read_cookie(headers, &self.config.access_name)
    }

    /// Reads the refresh token cookie.
    pub fn refresh_token(&self, headers: &HeaderMap) -> Option<String> {
        read_cookie(headers, &self.config.refresh_name)
    }

    /// Appends `Set-Cookie` headers for a freshly issued pair.
    pub fn set_pair(&self, headers: &mut HeaderMap, pair: &TokenPair) {
        self.append(
            headers,
            &self.config.access_name,
            pair.access_token.clone(),
            &self.config.access_path,
            pair.access_expires_in,
        );
        self.append(
            headers,
            &self.config.refresh_name,
            pair.refresh_token.clone(),
            &self.config.refresh_path,
            pair.refresh_expires_in,
        );
    }

    /// Appends `Set-Cookie` headers that expire both cookies.
    pub fn clear(&self, headers: &mut HeaderMap) {
        self.append(headers, &self.config.access_name, String::new(), &self.config.access_path, 0);
        self.append(headers, &self.config.refresh_name, String::new(), &self.config.refresh_path, 0);
    }

    fn append(&self, headers: &mut HeaderMap, name: &str, value: String, path: &str, max_age: i64) {
        let cookie = Cookie::build((name.to_string(), value))
            .path(path.to_string())
            .http_only(true)
            .secure(self.config.secure)
            .same_site(self.config.same_site.into())
            .max_age(CookieDuration::seconds(max_age))
            .build();

        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(cookie = name, error = %e, "Cookie not encodable as header"),
        }
    }
}

/// Finds a cookie by name across all `Cookie` headers.
fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

// =============================================================================
// Tests
// =============================================================================
