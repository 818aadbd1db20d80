// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token and authentication errors.

use campus_core::{AbilityError, UserId};
use thiserror::Error;

/// Result type for token operations.
pub type TokenResult<T> = Result<T, TokenError>;

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

// =============================================================================
// TokenError
// =============================================================================

/// Errors raised while issuing or verifying tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The token is past its expiry, leeway included.
    #[error("Token has expired")]
    Expired,

    /// Signature, format, algorithm, issuer or type mismatch.
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// Signing failed.
    #[error("Failed to sign token: {0}")]
    Signing(String),

    /// Key material or algorithm configuration is unusable.
    #[error("Invalid key configuration: {0}")]
    Key(String),
}

impl TokenError {
    /// Creates an invalid token error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid(reason.into())
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::invalid("signature mismatch"),
            ErrorKind::InvalidAlgorithm => TokenError::invalid("algorithm not accepted"),
            ErrorKind::InvalidIssuer => TokenError::invalid("issuer mismatch"),
            ErrorKind::InvalidToken => TokenError::invalid("malformed token"),
            ErrorKind::MissingRequiredClaim(claim) => {
                TokenError::invalid(format!("missing claim '{}'", claim))
            }
            ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                TokenError::invalid("undecodable header or claims")
            }
            _ => TokenError::invalid(err.to_string()),
        }
    }
}

// =============================================================================
// RefreshFailure
// =============================================================================

/// Why a refresh token was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshFailure {
    /// The token was invalidated.
    #[error("refresh token has been revoked")]
    Revoked,

    /// The token did not verify.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The subject no longer exists.
    #[error("subject {0} no longer exists")]
    SubjectNotFound(UserId),

    /// The identity store lookup failed.
    #[error("subject lookup failed: {0}")]
    Lookup(String),
}

// =============================================================================
// AuthError
// =============================================================================

/// Errors surfaced by the authentication service and request gates.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password. The two are never distinguished.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// No token was supplied.
    #[error("Token not provided")]
    TokenNotProvided,

    /// The access token did not verify or has been revoked.
    #[error("Invalid access token: {reason}")]
    InvalidAccessToken {
        /// Why the token was refused.
        reason: String,
    },

    /// The refresh token was refused.
    #[error("Invalid refresh token: {cause}")]
    InvalidRefreshToken {
        /// Why the token was refused.
        #[source]
        cause: RefreshFailure,
    },

    /// The access token is past its expiry.
    #[error("Token has expired")]
    TokenExpired,

    /// Authenticated but not permitted.
    #[error("Not authorized: {0}")]
    Unauthorized(#[source] AbilityError),

    /// The resource does not exist or is not visible.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Resource type.
        resource: String,
        /// Requested id.
        id: String,
    },

    /// Unexpected failure.
    #[error("Internal error: {message}")]
    Internal {
        /// Error message (for logging, not user-facing).
        message: String,
    },
}

impl AuthError {
    /// Creates an invalid access token error.
    pub fn invalid_access_token(reason: impl Into<String>) -> Self {
        Self::InvalidAccessToken {
            reason: reason.into(),
        }
    }

    /// Creates an invalid refresh token error.
    pub fn invalid_refresh_token(cause: impl Into<RefreshFailure>) -> Self {
        Self::InvalidRefreshToken {
            cause: cause.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Maps an access token verification failure.
    pub fn from_access_token(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::TokenExpired,
            TokenError::Invalid(reason) => Self::InvalidAccessToken { reason },
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<AbilityError> for AuthError {
    fn from(err: AbilityError) -> Self {
        if err.is_configuration_error() {
            Self::internal(err.to_string())
        } else {
            Self::Unauthorized(err)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
