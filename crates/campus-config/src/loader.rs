// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading and processing for campus.
//!
//! # Loading Pipeline
//!
//! 1. Read the file and pick the format from its extension
//! 2. Resolve `${VAR}` / `${VAR:default}` placeholders in the raw text
//! 3. Parse into [`CampusConfig`]
//! 4. Apply `CAMPUS_*` environment overrides
//! 5. Resolve relative paths against the file's directory
//! 6. Validate
//!
//! # Environment Variable Override
//!
//! ```text
//! CAMPUS_SERVER_PORT=9090
//! CAMPUS_LOG_LEVEL=debug
//! CAMPUS_JWT_ISSUER=campus-prod
//! CAMPUS_JWT_PRIVATE_KEY_PATH=/run/secrets/jwt.pem
//! CAMPUS_JWT_PUBLIC_KEY_PATH=/run/secrets/jwt.pub.pem
//! CAMPUS_REVOCATION_GRACE_SECS=30
//! ```

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{CampusConfig, KeySource, LogLevel, SeedUsers};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

// =============================================================================
// ConfigLoader
// =============================================================================

/// Configuration loader for campus.
///
/// # Examples
///
/// ```no_run
/// use campus_config::loader::ConfigLoader;
///
/// let config = ConfigLoader::new().load("campus.yaml").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Base directory for resolving relative paths.
    base_path: Option<PathBuf>,

    /// Environment variable prefix.
    env_prefix: String,

    /// Whether to resolve environment variables.
    resolve_env_vars: bool,

    /// Whether to resolve relative paths.
    resolve_paths: bool,

    /// Variables consulted instead of the process environment.
    env_source: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    /// Creates a new configuration loader with default settings.
    pub fn new() -> Self {
        Self {
            base_path: None,
            env_prefix: "CAMPUS".to_string(),
            resolve_env_vars: true,
            resolve_paths: true,
            env_source: None,
        }
    }

    /// Creates a builder for configuring the loader.
    pub fn builder() -> ConfigLoaderBuilder {
        ConfigLoaderBuilder::new()
    }

    /// Sets the base path for resolving relative paths.
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables environment variable resolution.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Reads variables from `vars` instead of the process environment.
    pub fn with_env_source(mut self, vars: HashMap<String, String>) -> Self {
        self.env_source = Some(vars);
        self
    }

    /// Loads configuration from a file.
    ///
    /// The format follows the extension: `.yaml`/`.yml`, `.toml` or `.json`.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<CampusConfig> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let base_path = self.base_path.clone().unwrap_or_else(|| {
            path.parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        });

        let content = read_file(path)?;
        let format = ConfigFormat::from_path(path)?;
        let mut config: CampusConfig = self.parse_content(&content, format, path)?;

        if self.resolve_env_vars {
            self.apply_env_overrides(&mut config)?;
        }

        if self.resolve_paths {
            config.resolve_relative_paths(&base_path);
        }

        config.validate()?;

        info!(
            addr = %config.server.socket_addr(),
            algorithm = %config.jwt.algorithm,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Loads configuration from a string.
    ///
    /// Relative paths are resolved against the base path when one is set.
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<CampusConfig> {
        let content = if self.resolve_env_vars {
            self.resolve_env_placeholders(content)
        } else {
            content.to_string()
        };
        let mut config: CampusConfig = parse_str(&content, format)?;

        if self.resolve_env_vars {
            self.apply_env_overrides(&mut config)?;
        }

        if let (true, Some(base)) = (self.resolve_paths, self.base_path.as_ref()) {
            config.resolve_relative_paths(base);
        }

        config.validate()?;
        Ok(config)
    }

    /// Loads the accounts listed in a users file.
    pub fn load_seed_users(&self, path: impl AsRef<Path>) -> ConfigResult<SeedUsers> {
        let path = path.as_ref();
        let content = read_file(path)?;
        let format = ConfigFormat::from_path(path)?;
        let users: SeedUsers = self.parse_content(&content, format, path)?;
        users.validate()?;

        debug!(path = %path.display(), count = users.users.len(), "Loaded seed users");
        Ok(users)
    }

    /// Parses content based on format.
    fn parse_content<T: DeserializeOwned>(
        &self,
        content: &str,
        format: ConfigFormat,
        path: &Path,
    ) -> ConfigResult<T> {
        let content = if self.resolve_env_vars {
            self.resolve_env_placeholders(content)
        } else {
            content.to_string()
        };

        parse_str(&content, format).map_err(|e| match e {
            ConfigError::Serialization { message } => ConfigError::parse(path, message),
            other => other,
        })
    }

    /// Looks up a variable in the injected source or the process environment.
    fn var(&self, name: &str) -> Option<String> {
        match &self.env_source {
            Some(vars) => vars.get(name).cloned(),
            None => env::var(name).ok(),
        }
    }

    /// Resolves `${VAR_NAME}` and `${VAR_NAME:default}` placeholders.
    ///
    /// Unknown variables without a default are left as written.
    fn resolve_env_placeholders(&self, content: &str) -> String {
        let mut result = String::with_capacity(content.len());
        let mut rest = content;

        while let Some(start) = rest.find("${") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            let Some(end) = after.find('}') else {
                result.push_str(&rest[start..]);
                return result;
            };

            let inner = &after[..end];
            let (name, default) = match inner.split_once(':') {
                Some((name, default)) => (name, Some(default)),
                None => (inner, None),
            };

            match (self.var(name), default) {
                (Some(value), _) => result.push_str(&value),
                (None, Some(default)) => result.push_str(default),
                (None, None) => {
                    warn!(var = name, "Environment variable not found");
                    result.push_str(&rest[start..start + 2 + end + 1]);
                }
            }

            rest = &after[end + 1..];
        }

        result.push_str(rest);
        result
    }

    /// Applies `<PREFIX>_*` overrides.
    fn apply_env_overrides(&self, config: &mut CampusConfig) -> ConfigResult<()> {
        if let Some(value) = self.var(&self.key("SERVER_PORT")) {
            config.server.port = value
                .parse()
                .map_err(|_| ConfigError::invalid_env_var(self.key("SERVER_PORT"), "expected valid port number"))?;
        }

        if let Some(value) = self.var(&self.key("LOG_LEVEL")) {
            match parse_log_level(&value) {
                Some(level) => config.logging.level = level,
                None => warn!(value = %value, "Ignoring unknown log level override"),
            }
        }

        if let Some(value) = self.var(&self.key("JWT_ISSUER")) {
            config.jwt.issuer = value;
        }

        if let Some(value) = self.var(&self.key("JWT_PRIVATE_KEY_PATH")) {
            config.jwt.private_key = KeySource::from_path(value);
        }

        if let Some(value) = self.var(&self.key("JWT_PUBLIC_KEY_PATH")) {
            config.jwt.public_key = KeySource::from_path(value);
        }

        if let Some(value) = self.var(&self.key("REVOCATION_GRACE_SECS")) {
            config.revocation.grace_secs = value.parse().map_err(|_| {
                ConfigError::invalid_env_var(self.key("REVOCATION_GRACE_SECS"), "expected seconds")
            })?;
        }

        Ok(())
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}_{}", self.env_prefix, suffix)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ConfigLoaderBuilder
// =============================================================================

/// Builder for ConfigLoader.
#[derive(Debug, Default)]
pub struct ConfigLoaderBuilder {
    base_path: Option<PathBuf>,
    env_prefix: Option<String>,
    resolve_env_vars: Option<bool>,
    resolve_paths: Option<bool>,
    env_source: Option<HashMap<String, String>>,
}

impl ConfigLoaderBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base path.
    pub fn base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Sets the environment prefix.
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Enables or disables environment variable resolution.
    pub fn resolve_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = Some(enabled);
        self
    }

    /// Enables or disables path resolution.
    pub fn resolve_paths(mut self, enabled: bool) -> Self {
        self.resolve_paths = Some(enabled);
        self
    }

    /// Sets the variables consulted instead of the process environment.
    pub fn env_source(mut self, vars: HashMap<String, String>) -> Self {
        self.env_source = Some(vars);
        self
    }

    /// Builds the ConfigLoader.
    pub fn build(self) -> ConfigLoader {
        let mut loader = ConfigLoader::new();

        if let Some(base_path) = self.base_path {
            loader.base_path = Some(base_path);
        }
        if let Some(prefix) = self.env_prefix {
            loader.env_prefix = prefix;
        }
        if let Some(resolve_env_vars) = self.resolve_env_vars {
            loader.resolve_env_vars = resolve_env_vars;
        }
        if let Some(resolve_paths) = self.resolve_paths {
            loader.resolve_paths = resolve_paths;
        }
        loader.env_source = self.env_source;

        loader
    }
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(ConfigError::unsupported_format(other)),
            None => Err(ConfigError::unsupported_format("(no extension)")),
        }
    }

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn read_file(path: &Path) -> ConfigResult<String> {
    if !path.exists() {
        return Err(ConfigError::file_not_found(path));
    }

    fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))
}

fn parse_str<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> ConfigResult<T> {
    match format {
        ConfigFormat::Yaml => yaml_parse(content),
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
    }
}

/// Parses a log level string.
fn parse_log_level(value: &str) -> Option<LogLevel> {
    match value.trim().to_lowercase().as_str() {
        "trace" => Some(LogLevel::Trace),
        "debug" => Some(LogLevel::Debug),
        "info" => Some(LogLevel::Info),
        "warn" | "warning" => Some(LogLevel::Warn),
        "error" => Some(LogLevel::Error),
        _ => None,
    }
}

/// YAML parsing through the `config` crate.
fn yaml_parse<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(content, config::FileFormat::Yaml))
        .build()
        .map_err(|e| ConfigError::serialization(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::serialization(e.to_string()))
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Loads configuration from a file with default settings.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<CampusConfig> {
    ConfigLoader::new().load(path)
}

/// Loads configuration from a string with the specified format.
pub fn load_config_str(content: &str, format: ConfigFormat) -> ConfigResult<CampusConfig> {
    ConfigLoader::new().load_from_str(content, format)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{JwtAlgorithm, LogFormat, SameSite};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn no_env() -> ConfigLoader {
        ConfigLoader::new().with_env_source(HashMap::new())
    }

    fn env(pairs: &[(&str, &str)]) -> ConfigLoader {
        ConfigLoader::new().with_env_source(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    const YAML: &str = r#"
server:
  port: 9000
  cors:
    allowed_origins: ["https://campus.example"]
jwt:
  algorithm: RS256
  private_key:
    path: keys/private.pem
  public_key:
    path: keys/public.pem
  issuer: campus-test
revocation:
  grace_secs: 30
cookies:
  same_site: lax
logging:
  level: debug
  format: json
"#;

    #[test]
    fn test_load_yaml() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("keys")).unwrap();
        write(&dir, "keys/private.pem", "PRIVATE");
        write(&dir, "keys/public.pem", "PUBLIC");
        let path = write(&dir, "campus.yaml", YAML);

        let config = no_env().load(&path).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.cors.allowed_origins, vec!["https://campus.example"]);
        assert_eq!(config.jwt.issuer, "campus-test");
        assert_eq!(config.revocation.grace_secs, 30);
        assert_eq!(config.cookies.same_site, SameSite::Lax);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);

        // Key paths are resolved against the file's directory.
        assert_eq!(config.jwt.private_key_pem().unwrap(), "PRIVATE");
        assert_eq!(config.jwt.public_key_pem().unwrap(), "PUBLIC");
    }

    #[test]
    fn test_load_toml_and_json() {
        let toml = r#"
[jwt]
algorithm = "ES256"
private_key = { pem = "P" }
public_key = { pem = "Q" }
"#;
        let config = no_env().load_from_str(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.jwt.algorithm, JwtAlgorithm::ES256);

        let json = r#"{"jwt":{"private_key":{"pem":"P"},"public_key":{"pem":"Q"}},"server":{"port":7000}}"#;
        let config = no_env().load_from_str(json, ConfigFormat::Json).unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.jwt.algorithm, JwtAlgorithm::RS256);
    }

    #[test]
    fn test_symmetric_algorithm_rejected_at_load() {
        let json = r#"{"jwt":{"algorithm":"HS256","private_key":{"pem":"P"},"public_key":{"pem":"Q"}}}"#;
        let result = no_env().load_from_str(json, ConfigFormat::Json);
        assert!(matches!(result, Err(ConfigError::SymmetricAlgorithm { .. })));
    }

    #[test]
    fn test_missing_keys_rejected_at_load() {
        let result = no_env().load_from_str("{}", ConfigFormat::Json);
        assert!(matches!(result, Err(ConfigError::MissingField { .. })));
    }

    #[test]
    fn test_unknown_field_is_parse_error() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        file.write_all(br#"{"jwt":{"secret":"x"}}"#).unwrap();

        let result = no_env().load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let loader = env(&[
            ("CAMPUS_SERVER_PORT", "9443"),
            ("CAMPUS_LOG_LEVEL", "warn"),
            ("CAMPUS_JWT_ISSUER", "campus-prod"),
            ("CAMPUS_JWT_PRIVATE_KEY_PATH", "/run/secrets/private.pem"),
            ("CAMPUS_JWT_PUBLIC_KEY_PATH", "/run/secrets/public.pem"),
            ("CAMPUS_REVOCATION_GRACE_SECS", "5"),
        ]);

        let config = loader.load_from_str("{}", ConfigFormat::Json).unwrap();
        assert_eq!(config.server.port, 9443);
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.jwt.issuer, "campus-prod");
        assert_eq!(
            config.jwt.private_key.path.as_deref(),
            Some(Path::new("/run/secrets/private.pem"))
        );
        assert_eq!(config.revocation.grace_secs, 5);
    }

    #[test]
    fn test_invalid_env_override() {
        let loader = env(&[
            ("CAMPUS_SERVER_PORT", "not-a-port"),
            ("CAMPUS_JWT_PRIVATE_KEY_PATH", "/a.pem"),
            ("CAMPUS_JWT_PUBLIC_KEY_PATH", "/b.pem"),
        ]);
        let result = loader.load_from_str("{}", ConfigFormat::Json);
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
    }

    #[test]
    fn test_env_placeholder_resolution() {
        let loader = env(&[("ISSUER", "from-env")]);
        assert_eq!(loader.resolve_env_placeholders("issuer: ${ISSUER}"), "issuer: from-env");
        assert_eq!(
            loader.resolve_env_placeholders("issuer: ${MISSING:fallback}"),
            "issuer: fallback"
        );
        assert_eq!(loader.resolve_env_placeholders("issuer: ${MISSING}"), "issuer: ${MISSING}");
        assert_eq!(loader.resolve_env_placeholders("broken ${OPEN"), "broken ${OPEN");
        assert_eq!(loader.resolve_env_placeholders("a ${ISSUER} b ${ISSUER}"), "a from-env b from-env");
    }

    #[test]
    fn test_placeholders_applied_before_parsing() {
        let loader = env(&[("KEY_DIR", "/etc/campus")]);
        let yaml = r#"
jwt:
  private_key:
    path: ${KEY_DIR}/private.pem
  public_key:
    path: ${KEY_DIR}/public.pem
server:
  port: ${PORT:8181}
"#;
        let config = loader.load_from_str(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.server.port, 8181);
        assert_eq!(
            config.jwt.public_key.path.as_deref(),
            Some(Path::new("/etc/campus/public.pem"))
        );
    }

    #[test]
    fn test_load_seed_users() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "users.yaml",
            r#"
users:
  - name: Dean
    email: dean@user.com
    password: ${DEAN_PASSWORD:changeme}
    roles: [Admin]
"#,
        );

        let users = no_env().load_seed_users(&path).unwrap();
        assert_eq!(users.users.len(), 1);
        assert_eq!(users.users[0].password.expose(), "changeme");
        assert_eq!(users.users[0].roles, vec!["Admin"]);
    }

    #[test]
    fn test_config_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("c.yaml")).unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("c.yml")).unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("c.toml")).unwrap(), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("c.json")).unwrap(), ConfigFormat::Json);
        assert!(ConfigFormat::from_path(Path::new("c.txt")).is_err());
        assert!(ConfigFormat::from_path(Path::new("campus")).is_err());
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("trace"), Some(LogLevel::Trace));
        assert_eq!(parse_log_level("WARNING"), Some(LogLevel::Warn));
        assert_eq!(parse_log_level("loud"), None);
    }

    #[test]
    fn test_loader_builder() {
        let loader = ConfigLoader::builder()
            .env_prefix("MYAPP")
            .resolve_env_vars(false)
            .resolve_paths(true)
            .build();

        assert_eq!(loader.env_prefix, "MYAPP");
        assert!(!loader.resolve_env_vars);
        assert!(loader.resolve_paths);
    }

    #[test]
    fn test_file_not_found() {
        let result = no_env().load("/nonexistent/path/campus.yaml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }
}
