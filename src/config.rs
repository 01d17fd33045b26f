//! Configuration management for the gateway.
//!
//! Loads configuration from environment variables:
//! - Listen address for the WebSocket/HTTP server
//! - Base URLs for the external auction and chat persistence APIs
//! - Upstream HTTP timeout and online-user sweep tuning

use std::env;
use std::sync::OnceLock;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Initialize configuration (call once at startup)
pub fn init() -> &'static Config {
    config()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auction_api: UpstreamConfig,
    pub chat_api: UpstreamConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub public_url: String,
}

/// An external HTTP collaborator (auction bidding API, chat persistence API).
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// How often the online-user inactivity sweep runs.
    pub sweep_interval_seconds: u64,
    /// Idle time after which an online user is dropped.
    pub max_idle_seconds: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: env_or("PORT", "8900").parse().expect("Invalid PORT"),
                public_url: env_or("PUBLIC_URL", "http://localhost:8900"),
            },
            auction_api: UpstreamConfig {
                base_url: trim_slash(env_or("AUCTION_API_URL", "http://localhost:8080")),
                timeout_seconds: env_or("AUCTION_API_TIMEOUT", "10").parse().unwrap_or(10),
            },
            chat_api: UpstreamConfig {
                base_url: trim_slash(env_or("CHAT_API_URL", "http://localhost:8080")),
                timeout_seconds: env_or("CHAT_API_TIMEOUT", "10").parse().unwrap_or(10),
            },
            chat: ChatConfig {
                sweep_interval_seconds: env_or("CHAT_SWEEP_INTERVAL", "60").parse().unwrap_or(60),
                max_idle_seconds: env_or("CHAT_MAX_IDLE", "300").parse().unwrap_or(300),
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        assert_eq!(
            trim_slash("http://localhost:8080/".to_string()),
            "http://localhost:8080"
        );
        assert_eq!(
            trim_slash("http://localhost:8080".to_string()),
            "http://localhost:8080"
        );
    }
}
