//! Configuration types for the deploy pipeline.
//!
//! This module defines the structs that map to the `airlift.deploy.yaml`
//! file, plus the runtime options a caller supplies for a single deploy
//! attempt.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default deploy environment.
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Default Airlift API origin.
pub const DEFAULT_API_HOST: &str = "https://api.airlift.sh";

/// Default Airlift API protocol version, sent as `Accept-Version`.
pub const DEFAULT_API_VERSION: &str = "0.5.0";

/// Default storage bucket for hashed build content.
pub const DEFAULT_BUCKET: &str = "airlift-sh-hashed-production";

/// Default storage region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Environment variable overriding the hashed-content bucket.
pub const BUCKET_ENV_VAR: &str = "AIRLIFT_HASHED_BUCKET";

/// Domain released applications are served from.
pub const PLATFORM_DOMAIN: &str = "airlift.sh";

/// Default transport timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Application configuration loaded from `airlift.deploy.yaml`.
///
/// Immutable once a deploy attempt starts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployConfig {
    /// Application name on the platform.
    pub name: String,
    /// Directory to deploy, relative to the project base. Defaults to `.`.
    #[serde(default)]
    pub root: Option<String>,
    /// Exclusion patterns, composed against the root directory.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Local hash-cache directory for the sync engine.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl DeployConfig {
    /// Creates a configuration with just an application name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: None,
            exclude: Vec::new(),
            cache_dir: None,
        }
    }

    /// Resolves the application root directory against a base directory.
    ///
    /// A configured root of `/` means the base directory itself, so it
    /// normalizes to `.` before resolution.
    #[must_use]
    pub fn resolved_root(&self, base: &Path) -> PathBuf {
        let root = match self.root.as_deref() {
            None | Some("/") | Some("") => ".",
            Some(other) => other,
        };
        base.join(root)
    }

    /// Computes the URL the application is served from after release.
    ///
    /// The production environment uses the bare app subdomain; any other
    /// environment is prefixed with the environment name.
    #[must_use]
    pub fn app_url(&self, environment: &str) -> String {
        if environment == "production" {
            format!("http://{}.{PLATFORM_DOMAIN}", self.name)
        } else {
            format!("http://{environment}.{}.{PLATFORM_DOMAIN}", self.name)
        }
    }
}

/// Runtime options for a single deploy attempt.
///
/// Supplied once by the caller; read-only for the orchestrator's lifetime.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Target environment to release to.
    pub environment: String,
    /// Bearer token authenticating the caller.
    pub token: String,
    /// Transport timeout for remote calls and sync network operations.
    pub timeout: Duration,
    /// Hosting endpoint and storage overrides.
    pub hosting: HostingOverrides,
}

impl DeployOptions {
    /// Creates options with the given token and all defaults.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_string(),
            token: token.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            hosting: HostingOverrides::default(),
        }
    }

    /// Sets the target environment.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Sets the transport timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the hosting overrides.
    #[must_use]
    pub fn with_hosting(mut self, hosting: HostingOverrides) -> Self {
        self.hosting = hosting;
        self
    }
}

/// Optional overrides for the hosting endpoints and storage bucket.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostingOverrides {
    /// API origin override.
    #[serde(default)]
    pub api_host: Option<String>,
    /// API protocol version override.
    #[serde(default)]
    pub api_version: Option<String>,
    /// Storage bucket override.
    #[serde(default)]
    pub bucket: Option<String>,
}

impl HostingOverrides {
    /// The effective API origin.
    #[must_use]
    pub fn api_host(&self) -> &str {
        self.api_host.as_deref().unwrap_or(DEFAULT_API_HOST)
    }

    /// The effective API protocol version.
    #[must_use]
    pub fn api_version(&self) -> &str {
        self.api_version.as_deref().unwrap_or(DEFAULT_API_VERSION)
    }

    /// The effective storage bucket.
    ///
    /// Resolution order: process environment override, configured
    /// override, platform default. The environment is read once per call
    /// site, at deploy start.
    #[must_use]
    pub fn bucket(&self) -> String {
        std::env::var(BUCKET_ENV_VAR)
            .ok()
            .filter(|b| !b.is_empty())
            .or_else(|| self.bucket.clone())
            .unwrap_or_else(|| DEFAULT_BUCKET.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_root_defaults_to_base() {
        let config = DeployConfig::new("demo");
        assert_eq!(
            config.resolved_root(Path::new("/tmp/site")),
            Path::new("/tmp/site").join(".")
        );
    }

    #[test]
    fn test_resolved_root_slash_normalizes_to_base() {
        let mut config = DeployConfig::new("demo");
        config.root = Some(String::from("/"));
        assert_eq!(
            config.resolved_root(Path::new("/tmp/site")),
            Path::new("/tmp/site").join(".")
        );
    }

    #[test]
    fn test_resolved_root_relative_subdirectory() {
        let mut config = DeployConfig::new("demo");
        config.root = Some(String::from("public"));
        assert_eq!(
            config.resolved_root(Path::new("/tmp/site")),
            Path::new("/tmp/site/public")
        );
    }

    #[test]
    fn test_app_url_production_has_no_prefix() {
        let config = DeployConfig::new("demo");
        assert_eq!(config.app_url("production"), "http://demo.airlift.sh");
    }

    #[test]
    fn test_app_url_other_environments_are_prefixed() {
        let config = DeployConfig::new("demo");
        assert_eq!(config.app_url("staging"), "http://staging.demo.airlift.sh");
        assert_eq!(
            config.app_url("development"),
            "http://development.demo.airlift.sh"
        );
    }

    #[test]
    fn test_hosting_overrides_defaults() {
        let hosting = HostingOverrides::default();
        assert_eq!(hosting.api_host(), DEFAULT_API_HOST);
        assert_eq!(hosting.api_version(), DEFAULT_API_VERSION);
    }

    #[test]
    fn test_hosting_overrides_custom_host() {
        let hosting = HostingOverrides {
            api_host: Some(String::from("https://api.example.test")),
            ..Default::default()
        };
        assert_eq!(hosting.api_host(), "https://api.example.test");
    }
}
