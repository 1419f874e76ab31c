//! Configuration management for acl-init.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use warden_common::constants::{
    AGENT_POLICY_DESCRIPTION, AGENT_POLICY_NAME, BOOTSTRAP_TIMEOUT_SECS, DEFAULT_API_TIMEOUT_SECS,
    DEFAULT_BOOTSTRAP_TOKEN_KEY, DEFAULT_HTTP_PORT, DEFAULT_REDIS_URL, DEFAULT_RETRY_INTERVAL_MS,
    DEFAULT_SCHEME,
};

use crate::provision::{PolicySettings, ProvisionSettings};
use crate::rules::RuleOptions;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Redis connection URL (bootstrap token storage)
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Server hosts (IP literals or DNS names)
    #[serde(default)]
    pub servers: Vec<String>,

    /// HTTP API port of the servers
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// URL scheme (http or https)
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Per-request API timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub api_timeout_secs: u64,

    /// Timeout of the bootstrap request in seconds
    #[serde(default = "default_bootstrap_timeout")]
    pub bootstrap_timeout_secs: u64,

    /// Pause between retries in milliseconds
    #[serde(default = "default_retry_interval")]
    pub retry_interval_ms: u64,

    /// Store key of the bootstrap token
    #[serde(default = "default_bootstrap_token_key")]
    pub bootstrap_token_key: String,

    /// Create and push per-server agent tokens
    #[serde(default = "default_set_server_tokens")]
    pub set_server_tokens: bool,

    /// Agent policy configuration
    #[serde(default)]
    pub policy: PolicyConfig,
}

/// Agent policy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_policy_name")]
    pub name: String,

    #[serde(default = "default_policy_description")]
    pub description: String,

    /// Wrap service rules in a namespace block
    #[serde(default)]
    pub enable_namespaces: bool,

    /// Wrap all rules in an admin partition block
    #[serde(default)]
    pub enable_partitions: bool,

    #[serde(default)]
    pub partition_name: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            name: default_policy_name(),
            description: default_policy_description(),
            enable_namespaces: false,
            enable_partitions: false,
            partition_name: String::new(),
        }
    }
}

// Default value functions
fn default_redis_url() -> String { DEFAULT_REDIS_URL.to_string() }
fn default_http_port() -> u16 { DEFAULT_HTTP_PORT }
fn default_scheme() -> String { DEFAULT_SCHEME.to_string() }
fn default_api_timeout() -> u64 { DEFAULT_API_TIMEOUT_SECS }
fn default_bootstrap_timeout() -> u64 { BOOTSTRAP_TIMEOUT_SECS }
fn default_retry_interval() -> u64 { DEFAULT_RETRY_INTERVAL_MS }
fn default_bootstrap_token_key() -> String { DEFAULT_BOOTSTRAP_TOKEN_KEY.to_string() }
fn default_set_server_tokens() -> bool { true }
fn default_policy_name() -> String { AGENT_POLICY_NAME.to_string() }
fn default_policy_description() -> String { AGENT_POLICY_DESCRIPTION.to_string() }

impl AppConfig {
    /// Load configuration from file, with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let settings = config::Config::builder()
                .add_source(config::File::with_name(config_path))
                .build()
                .context("Failed to load config file")?;

            settings
                .try_deserialize()
                .context("Failed to parse config")?
        } else {
            // Use defaults if config file doesn't exist
            tracing::warn!("Config file not found, using defaults");
            Self::default()
        };

        // Apply CLI overrides
        if let Some(ref redis_url) = args.redis_url {
            config.redis_url = redis_url.clone();
        }
        if !args.servers.is_empty() {
            config.servers = args.servers.clone();
        }
        if let Some(port) = args.http_port {
            config.http_port = port;
        }
        if let Some(ref key) = args.bootstrap_token_key {
            config.bootstrap_token_key = key.clone();
        }
        if args.skip_server_tokens {
            config.set_server_tokens = false;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that can never work
    pub fn validate(&self) -> Result<()> {
        if self.servers.iter().all(|s| s.trim().is_empty()) {
            bail!("No server addresses configured (set `servers` or pass --server)");
        }
        if !matches!(self.scheme.as_str(), "http" | "https") {
            bail!("Unsupported scheme {:?} (expected http or https)", self.scheme);
        }
        if self.bootstrap_token_key.trim().is_empty() {
            bail!("bootstrap_token_key must not be empty");
        }
        if self.bootstrap_timeout_secs < self.api_timeout_secs {
            bail!(
                "bootstrap_timeout_secs ({}) must not be shorter than api_timeout_secs ({})",
                self.bootstrap_timeout_secs,
                self.api_timeout_secs
            );
        }
        Ok(())
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    pub fn bootstrap_timeout(&self) -> Duration {
        Duration::from_secs(self.bootstrap_timeout_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// Provisioning settings derived from this configuration
    pub fn provision_settings(&self) -> ProvisionSettings {
        ProvisionSettings {
            bootstrap_token_key: self.bootstrap_token_key.clone(),
            set_server_tokens: self.set_server_tokens,
            policy: PolicySettings {
                name: self.policy.name.clone(),
                description: self.policy.description.clone(),
                rules: RuleOptions {
                    enable_namespaces: self.policy.enable_namespaces,
                    enable_partitions: self.policy.enable_partitions,
                    partition_name: self.policy.partition_name.clone(),
                },
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            servers: Vec::new(),
            http_port: default_http_port(),
            scheme: default_scheme(),
            api_timeout_secs: default_api_timeout(),
            bootstrap_timeout_secs: default_bootstrap_timeout(),
            retry_interval_ms: default_retry_interval(),
            bootstrap_token_key: default_bootstrap_token_key(),
            set_server_tokens: default_set_server_tokens(),
            policy: PolicyConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.http_port, 8500);
        assert_eq!(config.bootstrap_timeout(), Duration::from_secs(300));
        assert_eq!(config.api_timeout(), Duration::from_secs(5));
        assert!(config.set_server_tokens);
        assert_eq!(config.policy.name, "agent-token");
    }

    #[test]
    fn test_toml_with_partial_policy() {
        let toml = r#"
            servers = ["10.0.0.1", "consul-server.internal"]
            retry_interval_ms = 250

            [policy]
            enable_partitions = true
            partition_name = "team-a"
        "#;
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.retry_interval(), Duration::from_millis(250));
        assert_eq!(config.policy.description, "Agent Token Policy");

        let settings = config.provision_settings();
        assert_eq!(settings.policy.rules.partition_name, "team-a");
        assert!(settings.policy.rules.enable_partitions);
        config.validate().unwrap();
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_err());

        config.servers = vec!["10.0.0.1".to_string()];
        config.validate().unwrap();

        config.scheme = "ftp".to_string();
        assert!(config.validate().is_err());

        config.scheme = "https".to_string();
        config.bootstrap_timeout_secs = 1;
        assert!(config.validate().is_err());
    }
}
