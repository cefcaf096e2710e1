//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Replace embedded security tokens when serving cached pages
    pub token_protection: bool,
    /// Language id of the active request context
    pub language_id: u64,
    /// Maximum number of pages the in-memory store holds
    pub max_pages: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `TOKEN_PROTECTION` - Refresh page tokens on serve (default: true)
    /// - `LANGUAGE_ID` - Active language id (default: 1)
    /// - `MAX_PAGES` - Page limit of the in-memory store (default: 10000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            token_protection: env::var("TOKEN_PROTECTION")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.token_protection),
            language_id: env::var("LANGUAGE_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.language_id),
            max_pages: env::var("MAX_PAGES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_pages),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            token_protection: true,
            language_id: 1,
            max_pages: 10_000,
        }
    }
}

/// Accepts the usual spellings of a boolean switch.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert!(config.token_protection);
        assert_eq!(config.language_id, 1);
        assert_eq!(config.max_pages, 10_000);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("SERVER_PORT");
        env::remove_var("TOKEN_PROTECTION");
        env::remove_var("LANGUAGE_ID");
        env::remove_var("MAX_PAGES");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert!(config.token_protection);
        assert_eq!(config.language_id, 1);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("On"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
