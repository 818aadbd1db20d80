// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `attack` command.
//!
//! Takes a genuine access token, escalates its claims to an administrator
//! with unrestricted rules, re-signs it the way a known JWT attack would and
//! submits it to the same verification the gatekeeper uses.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use tracing::info;

use campus_api::auth::{decode_unverified, TokenError};
use campus_config::CampusConfig;
use campus_core::{Grant, RuleSet};

use crate::cli::{AttackArgs, AttackKind};
use crate::error::{BinError, BinResult};
use crate::runtime::build_state;

/// Forges a token and reports whether it was refused.
///
/// An accepted forgery is an error so the exit code reflects it.
pub async fn attack(config: &CampusConfig, args: AttackArgs) -> BinResult<()> {
    let state = build_state(config, false).await?;
    let public_pem = state.auth().tokens().public_key_pem().to_string();
    let forged = forge(args.kind, &args.token, &public_pem)?;

    match state.auth().verify_access_token(&forged).await {
        Err(e) => {
            info!(attack = ?args.kind, "Forged token refused");
            println!("Refused: {}", e);
            Ok(())
        }
        Ok(claims) => Err(BinError::Vulnerable(format!(
            "{:?} forgery accepted for subject {}",
            args.kind, claims.sub
        ))),
    }
}

/// Builds the forged token from a genuine one.
pub fn forge(kind: AttackKind, genuine: &str, public_pem: &str) -> BinResult<String> {
    let mut payload = decode_unverified::<Value>(genuine)?;
    let claims = payload
        .as_object_mut()
        .ok_or_else(|| TokenError::invalid("claims are not an object"))?;

    claims.insert("roles".to_string(), json!(["Admin"]));
    claims.insert(
        "permissions".to_string(),
        serde_json::to_value(RuleSet::try_new(vec![Grant::manage_all()])?)?,
    );

    match kind {
        AttackKind::None => {
            let header = json!({ "alg": "none", "typ": "JWT" });
            Ok(format!(
                "{}.{}.",
                URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
                URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload)?)
            ))
        }
        AttackKind::AlgConfusion => {
            let key = EncodingKey::from_secret(public_pem.as_bytes());
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &payload, &key)
                .map_err(|e| TokenError::Signing(e.to_string()).into())
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use campus_api::auth::{JwtConfig, TokenKind, TokenService};
    use campus_core::{ability, Role, Subject, UserId};

    const PRIVATE_PEM: &str = include_str!("../../../campus-api/testdata/jwt_private.pem");
    const PUBLIC_PEM: &str = include_str!("../../../campus-api/testdata/jwt_public.pem");

    fn service_and_token() -> (TokenService, String) {
        let tokens = TokenService::new(JwtConfig::new(PRIVATE_PEM, PUBLIC_PEM)).unwrap();
        let subject = Subject::builder(UserId::new(4), "Student 1", "student1@user.com")
            .role(Role::Student)
            .build();
        let rules = ability::resolve(&subject).unwrap();
        let token = tokens.issue(&subject, &rules, TokenKind::Access).unwrap();
        (tokens, token)
    }

    #[test]
    fn test_none_forgery_escalates_and_is_refused() {
        let (tokens, genuine) = service_and_token();
        let forged = forge(AttackKind::None, &genuine, PUBLIC_PEM).unwrap();

        assert!(forged.ends_with('.'));
        let payload = forged.split('.').nth(1).unwrap();
        let claims: Value = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
        assert_eq!(claims["roles"], json!(["Admin"]));
        assert_eq!(claims["sub"], "4");

        assert!(tokens.verify(&forged, TokenKind::Access).is_err());
    }

    #[test]
    fn test_alg_confusion_forgery_is_refused() {
        let (tokens, genuine) = service_and_token();
        let forged = forge(AttackKind::AlgConfusion, &genuine, PUBLIC_PEM).unwrap();

        let claims: Value = decode_unverified(&forged).unwrap();
        assert_eq!(claims["roles"], json!(["Admin"]));

        let err = tokens.verify(&forged, TokenKind::Access).unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn test_forge_rejects_garbage() {
        assert!(forge(AttackKind::None, "not-a-token", PUBLIC_PEM).is_err());
    }
}
