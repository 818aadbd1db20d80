// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token issuance and verification.

use std::sync::Arc;

use campus_core::{RuleSet, Subject};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::claims::{Claims, TokenKind, TokenPair};
use super::error::{TokenError, TokenResult};

// =============================================================================
// JwtConfig
// =============================================================================

/// Token service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Signing algorithm. Symmetric algorithms are refused.
    #[serde(with = "algorithm_serde")]
    pub algorithm: Algorithm,
    /// PEM-encoded private key.
    #[serde(skip_serializing)]
    pub private_key_pem: String,
    /// PEM-encoded public key.
    pub public_key_pem: String,
    /// Token issuer.
    pub issuer: String,
    /// Access token lifetime in seconds.
    pub access_ttl_secs: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_ttl_secs: i64,
    /// Clock skew tolerance in seconds.
    pub leeway_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::RS256,
            private_key_pem: String::new(),
            public_key_pem: String::new(),
            issuer: "campus".to_string(),
            access_ttl_secs: 900,            // 15 minutes
            refresh_ttl_secs: 86400 * 7,     // 7 days
            leeway_secs: 60,
        }
    }
}

impl JwtConfig {
    /// Creates a configuration from a PEM key pair.
    pub fn new(private_key_pem: impl Into<String>, public_key_pem: impl Into<String>) -> Self {
        Self {
            private_key_pem: private_key_pem.into(),
            public_key_pem: public_key_pem.into(),
            ..Default::default()
        }
    }

    /// Sets the algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Sets both token lifetimes in seconds.
    pub fn with_ttls(mut self, access_secs: i64, refresh_secs: i64) -> Self {
        self.access_ttl_secs = access_secs;
        self.refresh_ttl_secs = refresh_secs;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> TokenResult<()> {
        if is_symmetric(self.algorithm) {
            return Err(TokenError::Key(format!(
                "{:?} is symmetric; only asymmetric algorithms are accepted",
                self.algorithm
            )));
        }
        if self.private_key_pem.trim().is_empty() {
            return Err(TokenError::Key("private key is not configured".to_string()));
        }
        if self.public_key_pem.trim().is_empty() {
            return Err(TokenError::Key("public key is not configured".to_string()));
        }
        if self.access_ttl_secs <= 0 || self.refresh_ttl_secs <= 0 {
            return Err(TokenError::Key("token lifetimes must be positive".to_string()));
        }
        Ok(())
    }
}

/// Returns `true` for the HMAC family.
pub fn is_symmetric(algorithm: Algorithm) -> bool {
    matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

fn load_keys(config: &JwtConfig) -> TokenResult<(EncodingKey, DecodingKey)> {
    let private = config.private_key_pem.as_bytes();
    let public = config.public_key_pem.as_bytes();
    let key_error = |e: jsonwebtoken::errors::Error| TokenError::Key(e.to_string());

    match config.algorithm {
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => Ok((
            EncodingKey::from_rsa_pem(private).map_err(key_error)?,
            DecodingKey::from_rsa_pem(public).map_err(key_error)?,
        )),
        Algorithm::ES256 | Algorithm::ES384 => Ok((
            EncodingKey::from_ec_pem(private).map_err(key_error)?,
            DecodingKey::from_ec_pem(public).map_err(key_error)?,
        )),
        Algorithm::EdDSA => Ok((
            EncodingKey::from_ed_pem(private).map_err(key_error)?,
            DecodingKey::from_ed_pem(public).map_err(key_error)?,
        )),
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Err(TokenError::Key(
            "symmetric algorithms are not accepted".to_string(),
        )),
    }
}

// =============================================================================
// TokenService
// =============================================================================

/// Issues and verifies signed tokens.
///
/// The accepted algorithm is fixed at construction; the `alg` header of a
/// presented token is only compared against it, never obeyed.
#[derive(Clone)]
pub struct TokenService {
    config: Arc<JwtConfig>,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl TokenService {
    /// Creates a token service, loading the key pair.
    pub fn new(config: JwtConfig) -> TokenResult<Self> {
        config.validate()?;
        let (encoding_key, decoding_key) = load_keys(&config)?;

        let mut validation = Validation::new(config.algorithm);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.leeway = config.leeway_secs;
        validation.validate_aud = false;

        Ok(Self {
            config: Arc::new(config),
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
        })
    }

    /// Signs arbitrary claims with the configured key.
    pub fn sign(&self, claims: &Claims) -> TokenResult<String> {
        encode(&Header::new(self.config.algorithm), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Builds the claims for a token of the given kind.
    pub fn claims_for(&self, subject: &Subject, rules: &RuleSet, kind: TokenKind) -> Claims {
        let ttl = match kind {
            TokenKind::Access => self.config.access_ttl_secs,
            TokenKind::Refresh => self.config.refresh_ttl_secs,
        };
        Claims::new(subject, kind, Some(rules), Utc::now().timestamp(), ttl)
            .with_issuer(&self.config.issuer)
    }

    /// Issues a token of the given kind.
    pub fn issue(&self, subject: &Subject, rules: &RuleSet, kind: TokenKind) -> TokenResult<String> {
        self.sign(&self.claims_for(subject, rules, kind))
    }

    /// Issues an access and refresh token together.
    pub fn issue_pair(&self, subject: &Subject, rules: &RuleSet) -> TokenResult<TokenPair> {
        let access = self.claims_for(subject, rules, TokenKind::Access);
        let refresh = self.claims_for(subject, rules, TokenKind::Refresh);

        Ok(TokenPair {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
            access_expires_in: self.config.access_ttl_secs,
            refresh_expires_in: self.config.refresh_ttl_secs,
            access_jti: access.jti,
            refresh_jti: refresh.jti,
        })
    }

    /// Verifies a token and checks it is of the expected kind.
    pub fn verify(&self, token: &str, kind: TokenKind) -> TokenResult<Claims> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims;

        if claims.typ != kind {
            return Err(TokenError::invalid(format!(
                "expected {} token, got {}",
                kind, claims.typ
            )));
        }
        if kind == TokenKind::Access && claims.permissions.is_none() {
            return Err(TokenError::invalid("access token carries no rule set"));
        }
        claims.user_id()?;

        Ok(claims)
    }

    /// Returns the pinned algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.config.algorithm
    }

    /// Returns the public key PEM.
    pub fn public_key_pem(&self) -> &str {
        &self.config.public_key_pem
    }

    /// Returns the access token lifetime in seconds.
    pub fn access_ttl_secs(&self) -> i64 {
        self.config.access_ttl_secs
    }

    /// Returns the refresh token lifetime in seconds.
    pub fn refresh_ttl_secs(&self) -> i64 {
        self.config.refresh_ttl_secs
    }

    /// Returns the clock skew tolerance in seconds.
    pub fn leeway_secs(&self) -> u64 {
        self.config.leeway_secs
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.config.issuer)
            .field("algorithm", &self.config.algorithm)
            .field("access_ttl_secs", &self.config.access_ttl_secs)
            .field("refresh_ttl_secs", &self.config.refresh_ttl_secs)
            .finish()
    }
}

// =============================================================================
// Algorithm Serialization
// =============================================================================

pub(crate) mod algorithm_serde {
    use std::str::FromStr;

    use jsonwebtoken::Algorithm;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(algorithm: &Algorithm, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:?}", algorithm))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Algorithm, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Algorithm::from_str(&s)
            .map_err(|_| serde::de::Error::custom(format!("Unknown algorithm: {}", s)))
    }
}

// =============================================================================
// Tests
// =============================================================================
