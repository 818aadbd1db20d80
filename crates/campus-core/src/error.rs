// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error hierarchy for campus-core.
//!
//! ```text
//! CoreError (root)
//! ├── AbilityError  - Role parsing, grant validation, field checks
//! ├── FilterError   - Query filter translation
//! └── StoreError    - Identity store operations
//! ```
//!
//! # Examples
//!
//! ```
//! use campus_core::error::{AbilityError, CoreError};
//!
//! let error = AbilityError::unknown_role("Janitor");
//! assert!(error.is_configuration_error());
//!
//! let core: CoreError = error.into();
//! assert_eq!(core.error_type(), "ability");
//! ```

use thiserror::Error;

// =============================================================================
// CoreError - Root Error Type
// =============================================================================

/// The root error type for campus-core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Permission rule error.
    #[error("Ability error: {0}")]
    Ability(#[from] AbilityError),

    /// Query filter error.
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    /// Identity store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl CoreError {
    /// Returns the error type as a string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            CoreError::Ability(_) => "ability",
            CoreError::Filter(_) => "filter",
            CoreError::Store(_) => "store",
        }
    }
}

// =============================================================================
// AbilityError
// =============================================================================

/// Errors raised by the permission rule engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbilityError {
    /// A role tag has no rule function.
    #[error("Invalid permissions for role: {tag}")]
    UnknownRole {
        /// The unrecognised role tag.
        tag: String,
    },

    /// A grant record is malformed.
    #[error("Invalid grant for '{action}' on '{resource}': {message}")]
    InvalidGrant {
        /// Grant action.
        action: String,
        /// Grant resource.
        resource: String,
        /// What is wrong with it.
        message: String,
    },

    /// The subject may not perform the action at all.
    #[error("Not allowed to '{action}' on '{resource}'")]
    Forbidden {
        /// Requested action.
        action: String,
        /// Requested resource.
        resource: String,
    },

    /// A requested field is outside the permitted set.
    #[error("Field '{field}' may not be used with '{action}' on '{resource}'")]
    FieldNotPermitted {
        /// The rejected field.
        field: String,
        /// Requested action.
        action: String,
        /// Requested resource.
        resource: String,
    },
}

impl AbilityError {
    /// Creates an unknown role error.
    pub fn unknown_role(tag: impl Into<String>) -> Self {
        Self::UnknownRole { tag: tag.into() }
    }

    /// Creates an invalid grant error.
    pub fn invalid_grant(
        action: impl Into<String>,
        resource: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidGrant {
            action: action.into(),
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Creates a forbidden error.
    pub fn forbidden(action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::Forbidden {
            action: action.into(),
            resource: resource.into(),
        }
    }

    /// Creates a field-not-permitted error.
    pub fn field_not_permitted(
        field: impl Into<String>,
        action: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self::FieldNotPermitted {
            field: field.into(),
            action: action.into(),
            resource: resource.into(),
        }
    }

    /// Returns `true` for errors caused by bad configuration or stored data
    /// rather than by the caller's request.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::UnknownRole { .. } | Self::InvalidGrant { .. })
    }
}

// =============================================================================
// FilterError
// =============================================================================

/// Errors raised while translating rules into a query filter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// A path segment or alias is not a plain identifier.
    #[error("Invalid identifier '{segment}' in '{path}'")]
    InvalidIdentifier {
        /// The full dotted path.
        path: String,
        /// The offending segment.
        segment: String,
    },

    /// The path has no segments.
    #[error("Empty field path")]
    EmptyPath,
}

impl FilterError {
    /// Creates an invalid identifier error.
    pub fn invalid_identifier(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            path: path.into(),
            segment: segment.into(),
        }
    }
}

// =============================================================================
// StoreError
// =============================================================================

/// Identity store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("Identity store unavailable: {message}")]
    Unavailable {
        /// Error message.
        message: String,
    },

    /// Another subject already uses the email.
    #[error("Email already registered: {email}")]
    DuplicateEmail {
        /// The duplicated email.
        email: String,
    },

    /// Password hashing failed.
    #[error("Credential error: {message}")]
    Credential {
        /// Error message.
        message: String,
    },
}

impl StoreError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a credential error.
    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential {
            message: message.into(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for ability operations.
pub type AbilityResult<T> = Result<T, AbilityError>;

/// Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Result type for identity store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_role_message() {
        let err = AbilityError::unknown_role("Janitor");
        assert_eq!(err.to_string(), "Invalid permissions for role: Janitor");
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_field_error_is_not_configuration() {
        let err = AbilityError::field_not_permitted("name", "update", "Course");
        assert!(!err.is_configuration_error());
        assert!(err.to_string().contains("'name'"));
    }

    #[test]
    fn test_core_error_conversion() {
        let err: CoreError = FilterError::invalid_identifier("a.b-c", "b-c").into();
        assert_eq!(err.error_type(), "filter");

        let err: CoreError = StoreError::unavailable("down").into();
        assert_eq!(err.error_type(), "store");
    }
}
