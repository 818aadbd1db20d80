// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Subject identity.
//!
//! This module provides:
//! - `UserId` and the `Role` enumeration
//! - `Subject`, the authenticated principal with its explicit grants
//! - The `IdentityStore` collaborator trait and `MemoryIdentityStore`
//! - Argon2 password credentials

mod password;
mod store;
mod subject;
mod types;

pub use password::CredentialHasher;
pub use store::{IdentityStore, MemoryIdentityStore};
pub use subject::{Subject, SubjectBuilder};
pub use types::{Role, UserId};
