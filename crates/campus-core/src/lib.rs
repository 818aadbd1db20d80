// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # campus-core
//!
//! Core abstractions and shared types for the campus authentication service.
//!
//! This crate has no HTTP or token dependencies. It provides:
//!
//! - **Identity**: `UserId`, `Role`, `Subject`, the `IdentityStore` trait and
//!   an in-memory store, plus Argon2 password credentials
//! - **Ability**: the permission rule engine. Grants are resolved for a subject
//!   into an immutable `RuleSet` that answers `can`, `can_on` and
//!   `permitted_fields`
//! - **Filter**: translation of a rule set into a row filter tree and from
//!   there into parameterized SQL with deduplicated joins
//! - **Error**: error types shared by the layers above
//!
//! ## Example
//!
//! ```rust,ignore
//! use campus_core::ability::{self, actions, resources};
//! use campus_core::filter::{to_filter, SqlFilter};
//! use campus_core::identity::{Role, Subject, UserId};
//!
//! let subject = Subject::builder(UserId::new(7), "Student User1", "student1@user.com")
//!     .role(Role::Student)
//!     .build();
//!
//! let rules = ability::resolve(&subject)?;
//! assert!(rules.can(actions::GET, resources::COURSE));
//!
//! let tree = to_filter(&rules, actions::GET, resources::COURSE);
//! let compiled = SqlFilter::new("course").compile(tree.as_ref())?;
//! assert_eq!(compiled.joins.len(), 3);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod ability;
pub mod error;
pub mod filter;
pub mod identity;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use ability::{resolve, Grant, PermittedFields, RuleSet};
pub use error::{AbilityError, AbilityResult, CoreError, FilterError, FilterResult, StoreError, StoreResult};
pub use filter::{to_filter, CompiledFilter, FieldPath, FilterTree, Join, SqlFilter};
pub use identity::{IdentityStore, MemoryIdentityStore, Role, Subject, UserId};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
