// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Server runtime orchestration.
//!
//! - Configuration translation into the API's settings
//! - Identity store seeding
//! - HTTP server and revocation sweeper startup
//! - Graceful shutdown with a bounded drain and a final store flush

use std::path::{Path, PathBuf};
use std::sync::Arc;

use jsonwebtoken::Algorithm;
use tracing::{info, warn};

use campus_api::auth::{JwtConfig, RevocationConfig};
use campus_api::catalog::CourseCatalog;
use campus_api::{ApiConfig, ApiServer, AppState, CookieConfig, CorsConfig, SameSite};
use campus_config::{CampusConfig, ConfigLoader, JwtAlgorithm};
use campus_core::identity::CredentialHasher;
use campus_core::{IdentityStore, MemoryIdentityStore, Role, Subject};

use crate::error::{BinError, BinResult};
use crate::shutdown::{ShutdownCoordinator, ShutdownReason};

// =============================================================================
// Configuration Translation
// =============================================================================

/// Builds the API settings, reading key material from disk.
pub fn api_config(config: &CampusConfig) -> BinResult<ApiConfig> {
    let jwt = &config.jwt;

    let mut token_config = JwtConfig::new(jwt.private_key_pem()?, jwt.public_key_pem()?)
        .with_algorithm(algorithm(jwt.algorithm))
        .with_issuer(jwt.issuer.clone())
        .with_ttls(secs_i64("jwt.access_ttl_secs", jwt.access_ttl_secs)?, secs_i64("jwt.refresh_ttl_secs", jwt.refresh_ttl_secs)?);
    token_config.leeway_secs = jwt.leeway_secs;

    let revocation = RevocationConfig {
        grace_secs: secs_i64("revocation.grace_secs", config.revocation.grace_secs)?,
        leeway_secs: secs_i64("jwt.leeway_secs", jwt.leeway_secs)?,
        sweep_interval: config.revocation.sweep_interval(),
    };

    let cookies = &config.cookies;
    let server = &config.server;

    Ok(ApiConfig {
        host: server.host,
        port: server.port,
        cors: CorsConfig {
            allowed_origins: server.cors.allowed_origins.clone(),
            allow_credentials: server.cors.allow_credentials,
            max_age: server.cors.max_age_secs,
        },
        jwt: token_config,
        revocation,
        cookies: CookieConfig {
            secure: cookies.secure,
            same_site: same_site(cookies.same_site),
            access_name: cookies.access_name.clone(),
            access_path: cookies.access_path.clone(),
            refresh_name: cookies.refresh_name.clone(),
            refresh_path: cookies.refresh_path.clone(),
        },
        request_timeout: server.request_timeout(),
        shutdown_timeout: server.shutdown_timeout(),
        max_body_size: server.max_body_size,
    })
}

/// Maps the configured algorithm. Symmetric ones are passed through so the
/// token service refuses them with its own error.
fn algorithm(algorithm: JwtAlgorithm) -> Algorithm {
    match algorithm {
        JwtAlgorithm::HS256 => Algorithm::HS256,
        JwtAlgorithm::HS384 => Algorithm::HS384,
        JwtAlgorithm::HS512 => Algorithm::HS512,
        JwtAlgorithm::RS256 => Algorithm::RS256,
        JwtAlgorithm::RS384 => Algorithm::RS384,
        JwtAlgorithm::RS512 => Algorithm::RS512,
        JwtAlgorithm::PS256 => Algorithm::PS256,
        JwtAlgorithm::PS384 => Algorithm::PS384,
        JwtAlgorithm::PS512 => Algorithm::PS512,
        JwtAlgorithm::ES256 => Algorithm::ES256,
        JwtAlgorithm::ES384 => Algorithm::ES384,
        JwtAlgorithm::EdDSA => Algorithm::EdDSA,
    }
}

fn same_site(value: campus_config::SameSite) -> SameSite {
    match value {
        campus_config::SameSite::Strict => SameSite::Strict,
        campus_config::SameSite::Lax => SameSite::Lax,
        campus_config::SameSite::None => SameSite::None,
    }
}

fn secs_i64(field: &str, secs: u64) -> BinResult<i64> {
    i64::try_from(secs).map_err(|_| BinError::config(format!("{} is out of range", field)))
}

// =============================================================================
// Identities
// =============================================================================

/// Builds the identity store: demo accounts if requested, then the users file.
pub async fn build_identities(config: &CampusConfig, seed_demo: bool) -> BinResult<Arc<MemoryIdentityStore>> {
    let hasher = CredentialHasher::new();

    let store = if seed_demo {
        MemoryIdentityStore::seed_demo(&hasher)?
    } else {
        MemoryIdentityStore::new()
    };

    if let Some(path) = &config.identity.users_file {
        let users = ConfigLoader::new().load_seed_users(path)?;
        for user in users.users {
            let roles = Role::parse_all(&user.roles)?;
            let subject = roles
                .into_iter()
                .fold(Subject::builder(store.next_id(), &user.name, &user.email), |b, role| b.role(role))
                .password_hash(hasher.hash(user.password.expose())?)
                .build();
            store.save(subject).await?;
        }
        info!(path = %path.display(), total = store.len(), "Loaded accounts from users file");
    }

    Ok(Arc::new(store))
}

/// Builds the full application state from configuration.
pub async fn build_state(config: &CampusConfig, seed_demo: bool) -> BinResult<AppState> {
    let api = api_config(config)?;
    let identities = build_identities(config, seed_demo).await?;

    let courses = if seed_demo {
        CourseCatalog::seed_demo()
    } else {
        CourseCatalog::new()
    };

    let state = AppState::builder()
        .config(api)
        .identities(identities)
        .courses(Arc::new(courses))
        .build()?;
    Ok(state)
}

// =============================================================================
// ServerRuntime
// =============================================================================

/// The server runtime.
pub struct ServerRuntime {
    config: Arc<CampusConfig>,
    shutdown: ShutdownCoordinator,
    seed_demo: bool,
}

impl ServerRuntime {
    /// Creates a new runtime.
    pub fn new(config: CampusConfig) -> Self {
        Self {
            seed_demo: config.identity.seed_demo,
            config: Arc::new(config),
            shutdown: ShutdownCoordinator::new(),
        }
    }

    /// Overrides demo seeding.
    pub fn with_seed_demo(mut self, enabled: bool) -> Self {
        self.seed_demo = enabled;
        self
    }

    /// Returns a handle that can stop the runtime.
    pub fn shutdown_handle(&self) -> ShutdownCoordinator {
        self.shutdown.clone()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CampusConfig {
        &self.config
    }

    /// Runs the server until shutdown is signaled.
    pub async fn run(self) -> BinResult<()> {
        info!(version = campus_core::VERSION, "Starting campus");

        let state = build_state(&self.config, self.seed_demo).await?;
        let addr = self.config.server.socket_addr();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| BinError::init(format!("Failed to bind {}: {}", addr, e)))?;

        let sweeper = state
            .revocations()
            .spawn_sweeper(self.shutdown.shutdown_signal().wait());
        let server = ApiServer::new(state.clone());
        let signal = self.shutdown.shutdown_signal();
        let mut server_task = tokio::spawn(server.serve(listener, signal.wait()));

        info!(%addr, demo = self.seed_demo, "campus is ready");

        let early_exit = tokio::select! {
            reason = self.shutdown.wait_for_shutdown() => {
                info!(%reason, "Stopping campus");
                None
            }
            joined = &mut server_task => Some(joined),
        };

        let result = match early_exit {
            Some(joined) => {
                self.shutdown.shutdown_with(ShutdownReason::ServerExited);
                server_result(joined)
            }
            None => {
                let drain = self.config.server.shutdown_timeout();
                match tokio::time::timeout(drain, server_task).await {
                    Ok(joined) => server_result(joined),
                    Err(_) => {
                        warn!(timeout_secs = drain.as_secs(), "Timed out draining connections");
                        Ok(())
                    }
                }
            }
        };

        if let Err(e) = sweeper.await {
            warn!(error = %e, "Revocation sweeper ended abnormally");
        }
        if let Err(e) = state.revocations().close().await {
            warn!(error = %e, "Failed to flush revocation store");
        }

        info!("campus shutdown complete");
        result
    }
}

fn server_result(joined: Result<campus_api::ApiResult<()>, tokio::task::JoinError>) -> BinResult<()> {
    match joined {
        Ok(result) => Ok(result?),
        Err(e) => Err(BinError::runtime(format!("Server task failed: {}", e))),
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for constructing the server runtime.
#[derive(Default)]
pub struct RuntimeBuilder {
    config_path: Option<PathBuf>,
    config: Option<CampusConfig>,
    port: Option<u16>,
    seed_demo: Option<bool>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration directly.
    pub fn config(mut self, config: CampusConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the listen port.
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Overrides demo seeding.
    pub fn seed_demo(mut self, enabled: bool) -> Self {
        self.seed_demo = Some(enabled);
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> BinResult<ServerRuntime> {
        let mut config = match self.config {
            Some(config) => config,
            None => {
                let path = self
                    .config_path
                    .ok_or_else(|| BinError::config("No configuration provided"))?;
                ConfigLoader::new()
                    .load(&path)
                    .map_err(|e| BinError::from(e).with_context(format!("loading {}", path.display())))?
            }
        };

        if let Some(port) = self.port {
            config.server.port = port;
        }

        let runtime = ServerRuntime::new(config);
        Ok(match self.seed_demo {
            Some(enabled) => runtime.with_seed_demo(enabled),
            None => runtime,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use campus_config::KeySource;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    const PRIVATE_PEM: &str = include_str!("../../campus-api/testdata/jwt_private.pem");
    const PUBLIC_PEM: &str = include_str!("../../campus-api/testdata/jwt_public.pem");

    fn test_config() -> CampusConfig {
        let mut config = CampusConfig::default();
        config.jwt.private_key = KeySource::inline(PRIVATE_PEM);
        config.jwt.public_key = KeySource::inline(PUBLIC_PEM);
        config.server.host = IpAddr::V4(Ipv4Addr::LOCALHOST);
        config.server.port = 0;
        config.identity.seed_demo = false;
        config
    }

    #[test]
    fn test_api_config_translation() {
        let mut config = test_config();
        config.jwt.issuer = "campus-test".to_string();
        config.revocation.grace_secs = 15;
        config.cookies.same_site = campus_config::SameSite::Lax;

        let api = api_config(&config).unwrap();
        assert_eq!(api.jwt.algorithm, Algorithm::RS256);
        assert_eq!(api.jwt.issuer, "campus-test");
        assert_eq!(api.jwt.access_ttl_secs, 900);
        assert_eq!(api.revocation.grace_secs, 15);
        assert_eq!(api.revocation.leeway_secs, 60);
        assert_eq!(api.cookies.same_site, SameSite::Lax);
        assert_eq!(api.cookies.refresh_path, "/refresh-token");
    }

    #[test]
    fn test_api_config_missing_key_file() {
        let mut config = test_config();
        config.jwt.private_key = KeySource::from_path("/nonexistent/private.pem");
        let err = api_config(&config).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_runtime_builder() {
        let runtime = RuntimeBuilder::new()
            .config(test_config())
            .port(Some(9999))
            .seed_demo(true)
            .build()
            .unwrap();

        assert!(runtime.seed_demo);
        assert_eq!(runtime.config().server.port, 9999);
    }

    #[test]
    fn test_runtime_builder_requires_config() {
        assert!(RuntimeBuilder::new().build().is_err());
    }

    #[tokio::test]
    async fn test_build_identities_from_users_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(
            &path,
            r#"{"users":[{"name":"Dean","email":"dean@user.com","password":"pw","roles":["Admin"]}]}"#,
        )
        .unwrap();

        let mut config = test_config();
        config.identity.users_file = Some(path);

        let store = build_identities(&config, false).await.unwrap();
        let dean = store.find_by_email("dean@user.com").await.unwrap().unwrap();
        assert!(dean.has_role(Role::Admin));
        assert!(dean.verify_password("pw"));
    }

    #[tokio::test]
    async fn test_unknown_role_in_users_file_is_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(
            &path,
            r#"{"users":[{"name":"X","email":"x@user.com","password":"pw","roles":["Janitor"]}]}"#,
        )
        .unwrap();

        let mut config = test_config();
        config.identity.users_file = Some(path);
        assert!(build_identities(&config, false).await.is_err());
    }

    #[tokio::test]
    async fn test_run_and_shutdown() {
        let runtime = ServerRuntime::new(test_config());
        let handle = runtime.shutdown_handle();

        let task = tokio::spawn(runtime.run());
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.initiate_shutdown();

        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("runtime should stop")
            .unwrap();
        assert!(result.is_ok());
    }
}
