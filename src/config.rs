use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::session::render::TimeDisplay;

pub const DEFAULT_CONFIG_PATH: &str = "config/chat.json";
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8000/ws";

pub const ENDPOINT_ENV: &str = "CHAT_ENDPOINT";
pub const USER_ENV: &str = "CHAT_USER";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: String,
    pub username: Option<String>,
    pub max_message_len: usize,
    pub time_display: TimeDisplay,
    pub rate_limit: RateLimitConfig,
    pub reconnect: ReconnectConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            username: None,
            max_message_len: 500,
            time_display: TimeDisplay::Utc,
            rate_limit: RateLimitConfig::default(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Client-side copy of the server's per-client send limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// 0 turns the limiter off.
    pub max_sends: usize,
    pub window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_sends: 5,
            window_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub enabled: bool,
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 10,
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
        }
    }
}

impl AppConfig {
    /// Later sources win: file, then environment, then command line.
    pub fn apply_overrides(&mut self, endpoint: Option<String>, username: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|value| !value.trim().is_empty()) {
            self.endpoint = endpoint;
        }
        if let Some(username) = username.filter(|value| !value.trim().is_empty()) {
            self.username = Some(username);
        }
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(std::env::var(ENDPOINT_ENV).ok(), std::env::var(USER_ENV).ok());
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}
