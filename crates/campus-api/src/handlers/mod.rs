// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API handlers for all endpoints.
//!
//! - [`health`]: liveness
//! - [`auth`]: login, token refresh, logout and the current user
//! - [`courses`]: the course catalog behind row, instance and field checks

mod auth;
mod courses;
mod health;

pub use auth::*;
pub use courses::*;
pub use health::*;
