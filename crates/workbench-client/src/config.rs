//! Configuration for the workbench client
//!
//! Values come from the environment (optionally seeded from a `.env` file) and
//! fall back to defaults field by field.

use serde::{Deserialize, Serialize};
use std::env;
use tracing::{info, warn};

use crate::error::{WorkbenchError, WorkbenchResult};

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the compute backend
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Auth token attached to every request
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON logs instead of pretty ones
    #[serde(default)]
    pub json_logs: bool,

    /// Interval between train job refreshes while watching
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Unchanged refreshes after which a finished job counts as completed
    #[serde(default = "default_completion_stable_polls")]
    pub completion_stable_polls: u32,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_completion_stable_polls() -> u32 {
    3
}

/// Parses a numeric variable, keeping `current` on bad input
fn parse_var<T: std::str::FromStr + Copy>(name: &str, current: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!("Invalid {} value: {}", name, raw);
                current
            }
        },
        Err(_) => current,
    }
}

impl ClientConfig {
    /// Load configuration from environment variables and an optional `.env` file
    pub fn load() -> WorkbenchResult<Self> {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> WorkbenchResult<Self> {
        // Start with defaults
        let mut config = Self::default();

        if let Ok(api_url) = env::var("WORKBENCH_API_URL") {
            config.api_url = api_url.trim().to_string();
        }

        config.timeout_secs = parse_var("WORKBENCH_TIMEOUT_SECS", config.timeout_secs);

        if let Ok(token) = env::var("WORKBENCH_AUTH_TOKEN") {
            if !token.is_empty() {
                config.auth_token = Some(token);
            }
        }

        if let Ok(log_level) = env::var("WORKBENCH_LOG_LEVEL") {
            config.log_level = log_level;
        }

        if let Ok(json_logs) = env::var("WORKBENCH_JSON_LOGS") {
            config.json_logs = json_logs.to_lowercase() == "true" || json_logs == "1";
        }

        config.poll_interval_ms = parse_var("WORKBENCH_POLL_INTERVAL_MS", config.poll_interval_ms);
        config.completion_stable_polls =
            parse_var("WORKBENCH_COMPLETION_STABLE_POLLS", config.completion_stable_polls);

        config.validate()?;

        info!(api_url = %config.api_url, "Loaded client configuration");
        Ok(config)
    }

    /// Checks required fields
    pub fn validate(&self) -> WorkbenchResult<()> {
        if self.api_url.is_empty() {
            return Err(WorkbenchError::Configuration("Backend API URL is required".to_string()));
        }
        if self.completion_stable_polls == 0 {
            return Err(WorkbenchError::Configuration(
                "Completion stable polls must be at least 1".to_string(),
            ));
        }
        if self.auth_token.is_none() {
            warn!("No WORKBENCH_AUTH_TOKEN provided - requests will be sent without a session token");
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            auth_token: None,
            log_level: default_log_level(),
            json_logs: false,
            poll_interval_ms: default_poll_interval_ms(),
            completion_stable_polls: default_completion_stable_polls(),
        }
    }
}
