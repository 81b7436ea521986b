//! Configuration module for the credledger client
//!
//! This module handles all configuration loading from TOML files,
//! environment variables, and provides structured configuration types.
//! The application id, endpoints, and super-admin address are read-only
//! after initialization; retry and confirmation bounds are tunable here
//! rather than hardcoded at call sites.

use serde::{Deserialize, Serialize};

/// Sentinel application id meaning "not deployed yet".
pub const APP_ID_UNCONFIGURED: u64 = 0;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ledger node (algod) endpoint configuration
    pub node: EndpointConfig,

    /// Indexer endpoint configuration
    pub indexer: EndpointConfig,

    /// On-chain application configuration
    pub app: AppConfig,

    /// Retry/backoff tuning
    #[serde(default)]
    pub retry: RetrySettings,

    /// Confirmation-wait tuning
    #[serde(default)]
    pub confirmation: ConfirmationSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL, e.g. "http://localhost:8080"
    pub url: String,

    /// Access token sent as the X-Algo-API-Token header; empty means none
    #[serde(default)]
    pub token: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Deployed application id; 0 means not deployed yet
    #[serde(default)]
    pub app_id: u64,

    /// Designated super-admin wallet address
    #[serde(default)]
    pub super_admin_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Maximum number of attempts (including the initial attempt)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff delay in milliseconds, doubled each attempt
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Backoff ceiling in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Jitter factor (0.0 to 1.0) applied to each delay
    #[serde(default = "default_jitter")]
    pub jitter_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationSettings {
    /// Rounds to wait for inclusion before timing out
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u64,

    /// Poll interval approximating one round, in milliseconds
    #[serde(default = "default_round_wait")]
    pub round_wait_ms: u64,

    /// Indexer lag tolerance after a role-changing transaction confirms,
    /// in milliseconds
    #[serde(default = "default_propagation_delay")]
    pub role_propagation_delay_ms: u64,
}

// Default value functions
fn default_request_timeout() -> u64 { 30 }
fn default_max_attempts() -> u32 { 3 }
fn default_base_delay() -> u64 { 1000 }
fn default_max_delay() -> u64 { 10_000 }
fn default_jitter() -> f64 { 0.2 }
fn default_max_rounds() -> u64 { 20 }
fn default_round_wait() -> u64 { 1000 }
fn default_propagation_delay() -> u64 { 2000 }

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
            jitter_factor: default_jitter(),
        }
    }
}

impl Default for ConfirmationSettings {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            round_wait_ms: default_round_wait(),
            role_propagation_delay_ms: default_propagation_delay(),
        }
    }
}

/// Result of a configuration validation pass.
#[derive(Debug, Default)]
pub struct ConfigValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ConfigValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self {
            node: EndpointConfig {
                url: "http://localhost:8080".to_string(),
                token: String::new(),
                timeout_secs: default_request_timeout(),
            },
            indexer: EndpointConfig {
                url: "http://localhost:8980".to_string(),
                token: String::new(),
                timeout_secs: default_request_timeout(),
            },
            app: AppConfig {
                app_id: APP_ID_UNCONFIGURED,
                super_admin_address: None,
            },
            retry: RetrySettings::default(),
            confirmation: ConfirmationSettings::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("CREDLEDGER_ALGOD_URL") {
            self.node.url = url;
        }
        if let Ok(token) = std::env::var("CREDLEDGER_ALGOD_TOKEN") {
            self.node.token = token;
        }
        if let Ok(url) = std::env::var("CREDLEDGER_INDEXER_URL") {
            self.indexer.url = url;
        }
        if let Ok(token) = std::env::var("CREDLEDGER_INDEXER_TOKEN") {
            self.indexer.token = token;
        }
        if let Ok(app_id) = std::env::var("CREDLEDGER_APP_ID") {
            if let Ok(parsed) = app_id.parse() {
                self.app.app_id = parsed;
            }
        }
        if let Ok(admin) = std::env::var("CREDLEDGER_SUPER_ADMIN") {
            self.app.super_admin_address = Some(admin);
        }
    }

    /// Validate the configuration, separating hard errors from warnings.
    ///
    /// An app id of 0 is a warning, not an error: read-only commands work
    /// before deployment, and the transaction builder rejects the sentinel
    /// itself with a configuration error.
    pub fn validate(&self) -> ConfigValidation {
        let mut result = ConfigValidation::default();

        for (name, endpoint) in [("node", &self.node), ("indexer", &self.indexer)] {
            if endpoint.url.is_empty() {
                result.errors.push(format!("{name} URL is not set"));
            } else if !endpoint.url.starts_with("http://") && !endpoint.url.starts_with("https://") {
                result
                    .errors
                    .push(format!("{name} URL must start with http:// or https://"));
            }
        }

        if self.app.app_id == APP_ID_UNCONFIGURED {
            result.warnings.push(
                "app_id is 0; transaction building will fail until the application is deployed"
                    .to_string(),
            );
        }

        match &self.app.super_admin_address {
            Some(address) if !crate::address::is_valid_address(address) => {
                result
                    .warnings
                    .push("super_admin_address does not parse as a valid address".to_string());
            }
            Some(_) => {}
            None => {
                result
                    .warnings
                    .push("super_admin_address is not configured".to_string());
            }
        }

        if self.retry.max_attempts == 0 {
            result.errors.push("retry.max_attempts must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.retry.jitter_factor) {
            result
                .errors
                .push("retry.jitter_factor must be between 0.0 and 1.0".to_string());
        }
        if self.confirmation.max_rounds == 0 {
            result
                .errors
                .push("confirmation.max_rounds must be at least 1".to_string());
        }

        result
    }
}
