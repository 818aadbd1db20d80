// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication and token lifecycle.
//!
//! This module provides:
//! - Signed access and refresh tokens carrying the resolved rule set
//! - A revocation cache with a grace window for rotated refresh tokens
//! - Login, refresh and logout orchestration
//! - The per-request authentication context

mod claims;
mod context;
mod error;
mod jwt;
mod revocation;
mod service;
mod store;

pub use claims::{decode_unverified, Claims, TokenKind, TokenPair};
pub use context::AuthContext;
pub use error::{AuthError, AuthResult, RefreshFailure, TokenError, TokenResult};
pub use jwt::{is_symmetric, JwtConfig, TokenService};
pub use revocation::{RevocationCache, RevocationConfig, RevocationEntry};
pub use service::AuthService;
pub use store::{CacheError, CacheResult, Clock, ExpiringStore, ManualClock, MemoryStore, SystemClock};
