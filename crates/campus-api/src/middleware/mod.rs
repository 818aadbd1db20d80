// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Middleware implementations for the API server.
//!
//! - [`AuthLayer`]: request gatekeeper (token verification and revocation)
//! - [`AbilityLayer`]: type-level permission guard

mod ability;
mod auth;

pub use ability::{AbilityLayer, AbilityMiddleware};
pub use auth::{AuthLayer, AuthMiddleware, DEFAULT_PUBLIC_PATHS};
