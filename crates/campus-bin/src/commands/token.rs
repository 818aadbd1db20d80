// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `token` command.

use campus_api::auth::{decode_unverified, TokenKind, TokenService};
use campus_api::response::TokenResponse;
use campus_config::CampusConfig;
use serde_json::Value;

use crate::error::BinResult;
use crate::runtime::{api_config, build_state};

/// Logs in against the configured accounts and prints the token pair.
pub async fn issue(config: &CampusConfig, email: &str, password: &str) -> BinResult<()> {
    let state = build_state(config, config.identity.seed_demo).await?;
    let pair = state.auth().login(email, password).await?;

    println!("{}", serde_json::to_string_pretty(&TokenResponse::from(&pair))?);
    Ok(())
}

/// Verifies a token's signature, issuer and expiry and prints its claims.
///
/// Revocation is not checked; the blocklist lives in the running server.
pub async fn inspect(config: &CampusConfig, token: &str) -> BinResult<()> {
    let tokens = TokenService::new(api_config(config)?.jwt)?;
    let kind = claimed_kind(token);
    let claims = tokens.verify(token, kind)?;

    let mut output = serde_json::to_value(&claims)?;
    if let Value::Object(map) = &mut output {
        if let Some(expires) = claims.expires_at() {
            map.insert("expiresAt".to_string(), Value::String(expires.to_rfc3339()));
        }
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// The `typ` a token claims to be. Unreadable tokens are treated as access
/// tokens and fail verification.
fn claimed_kind(token: &str) -> TokenKind {
    match decode_unverified::<Value>(token) {
        Ok(claims) if claims.get("typ").and_then(Value::as_str) == Some("refresh") => TokenKind::Refresh,
        _ => TokenKind::Access,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use campus_api::auth::JwtConfig;
    use campus_core::{ability, Role, Subject, UserId};

    const PRIVATE_PEM: &str = include_str!("../../../campus-api/testdata/jwt_private.pem");
    const PUBLIC_PEM: &str = include_str!("../../../campus-api/testdata/jwt_public.pem");

    #[test]
    fn test_claimed_kind() {
        let tokens = TokenService::new(JwtConfig::new(PRIVATE_PEM, PUBLIC_PEM)).unwrap();
        let subject = Subject::builder(UserId::new(4), "Student 1", "student1@user.com")
            .role(Role::Student)
            .build();
        let rules = ability::resolve(&subject).unwrap();

        let pair = tokens.issue_pair(&subject, &rules).unwrap();
        assert_eq!(claimed_kind(&pair.access_token), TokenKind::Access);
        assert_eq!(claimed_kind(&pair.refresh_token), TokenKind::Refresh);
        assert_eq!(claimed_kind("garbage"), TokenKind::Access);
    }
}
