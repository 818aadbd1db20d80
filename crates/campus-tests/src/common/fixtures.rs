// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Key pairs, the demo accounts and configuration text.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use campus_api::auth::JwtConfig;
use campus_api::ApiConfig;
use campus_core::identity::CredentialHasher;
use campus_core::{MemoryIdentityStore, UserId};

// =============================================================================
// Keys
// =============================================================================

/// RSA private key the application signs with.
pub const PRIVATE_PEM: &str = include_str!("../../../campus-api/testdata/jwt_private.pem");

/// Public half of [`PRIVATE_PEM`].
pub const PUBLIC_PEM: &str = include_str!("../../../campus-api/testdata/jwt_public.pem");

/// An unrelated RSA private key.
pub const OTHER_PRIVATE_PEM: &str = include_str!("../../../campus-api/testdata/other_private.pem");

/// Public half of [`OTHER_PRIVATE_PEM`].
pub const OTHER_PUBLIC_PEM: &str = include_str!("../../../campus-api/testdata/other_public.pem");

/// Token settings over the fixture key pair.
pub fn jwt_config() -> JwtConfig {
    JwtConfig::new(PRIVATE_PEM, PUBLIC_PEM)
}

/// API settings over the fixture key pair.
pub fn api_config() -> ApiConfig {
    ApiConfig::new(jwt_config())
}

/// Writes the fixture key pair into `dir`, returning (private, public).
pub fn write_key_pair(dir: &Path) -> (PathBuf, PathBuf) {
    let private = dir.join("jwt_private.pem");
    let public = dir.join("jwt_public.pem");
    std::fs::write(&private, PRIVATE_PEM).expect("write private key");
    std::fs::write(&public, PUBLIC_PEM).expect("write public key");
    (private, public)
}

// =============================================================================
// Accounts
// =============================================================================

/// A seeded demo account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoUser {
    /// User id.
    pub id: i64,
    /// Login email.
    pub email: &'static str,
    /// Plain password.
    pub password: &'static str,
}

impl DemoUser {
    /// Returns the id as a [`UserId`].
    pub fn user_id(&self) -> UserId {
        UserId::new(self.id)
    }
}

/// Administrator.
pub const ADMIN: DemoUser = DemoUser {
    id: 1,
    email: "admin@user.com",
    password: "admin",
};

/// Teacher of courses 1 and 3.
pub const TEACHER1: DemoUser = DemoUser {
    id: 2,
    email: "teacher1@user.com",
    password: "teacher1",
};

/// Teacher of course 2.
pub const TEACHER2: DemoUser = DemoUser {
    id: 3,
    email: "teacher2@user.com",
    password: "teacher2",
};

/// Active in course 1, dropped from course 2.
pub const STUDENT1: DemoUser = DemoUser {
    id: 4,
    email: "student1@user.com",
    password: "student1",
};

/// Cheap password hasher for tests.
pub fn fast_hasher() -> CredentialHasher {
    CredentialHasher::with_cost(8, 1, 1).expect("valid argon2 parameters")
}

/// Identity store holding the demo accounts.
pub fn demo_identities() -> Arc<MemoryIdentityStore> {
    Arc::new(MemoryIdentityStore::seed_demo(&fast_hasher()).expect("seed demo accounts"))
}

// =============================================================================
// Configuration Text
// =============================================================================

/// A complete YAML configuration pointing at the given key files.
pub fn campus_yaml(private_key: &Path, public_key: &Path) -> String {
    format!(
        r#"
server:
  host: 127.0.0.1
  port: 18080
  cors:
    allowed_origins:
      - https://campus.example

jwt:
  algorithm: RS256
  private_key:
    path: {}
  public_key:
    path: {}
  issuer: campus-it
  access_ttl_secs: 300
  refresh_ttl_secs: 3600

revocation:
  grace_secs: 30

cookies:
  same_site: strict

identity:
  seed_demo: true

logging:
  level: debug
  format: json
"#,
        private_key.display(),
        public_key.display()
    )
}
