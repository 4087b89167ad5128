use chatstream_client::{ClientConfig, config::DEFAULT_URL};
use clap::Parser;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Command-line overrides. Anything given here wins over the environment.
#[derive(Parser, Debug, Default)]
#[command(version, about = "Terminal chat over a streaming WebSocket backend")]
pub struct Args {
    /// WebSocket endpoint of the chat backend.
    #[arg(long)]
    pub url: Option<String>,
    /// Reconnection attempts after consecutive failures.
    #[arg(long)]
    pub max_retries: Option<u32>,
    /// Delay before each reconnection attempt, in milliseconds.
    #[arg(long)]
    pub retry_delay_ms: Option<u64>,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub ws_url: String,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        let defaults = ClientConfig::default();

        let ws_url = match std::env::var("CHAT_WS_URL") {
            Ok(value) if value.is_empty() => {
                return Err(ConfigError::MissingVar("CHAT_WS_URL".to_string()));
            }
            Ok(value) => value,
            Err(_) => DEFAULT_URL.to_string(),
        };
        validate_url("CHAT_WS_URL", &ws_url)?;

        let max_retries = match std::env::var("CHAT_MAX_RETRIES") {
            Ok(value) => value.parse::<u32>().map_err(|e| {
                ConfigError::InvalidValue("CHAT_MAX_RETRIES".to_string(), e.to_string())
            })?,
            Err(_) => defaults.retry.max_retries,
        };

        let retry_delay = match std::env::var("CHAT_RETRY_DELAY_MS") {
            Ok(value) => value
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| {
                    ConfigError::InvalidValue("CHAT_RETRY_DELAY_MS".to_string(), e.to_string())
                })?,
            Err(_) => defaults.retry.delay,
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            ws_url,
            max_retries,
            retry_delay,
            log_level,
        })
    }

    /// Applies command-line overrides on top of the environment.
    pub fn apply_args(&mut self, args: &Args) -> Result<(), ConfigError> {
        if let Some(url) = &args.url {
            validate_url("--url", url)?;
            self.ws_url = url.clone();
        }
        if let Some(max_retries) = args.max_retries {
            self.max_retries = max_retries;
        }
        if let Some(delay_ms) = args.retry_delay_ms {
            self.retry_delay = Duration::from_millis(delay_ms);
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.ws_url.clone())
            .with_max_retries(self.max_retries)
            .with_retry_delay(self.retry_delay)
    }
}

fn validate_url(source: &str, url: &str) -> Result<(), ConfigError> {
    if url.is_empty() {
        return Err(ConfigError::InvalidValue(
            source.to_string(),
            "URL must not be empty".to_string(),
        ));
    }
    if !(url.starts_with("ws://") || url.starts_with("wss://")) {
        return Err(ConfigError::InvalidValue(
            source.to_string(),
            format!("'{}' is not a ws:// or wss:// URL", url),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("CHAT_WS_URL");
            env::remove_var("CHAT_MAX_RETRIES");
            env::remove_var("CHAT_RETRY_DELAY_MS");
            env::remove_var("RUST_LOG");
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingVar("CHAT_WS_URL".to_string());
        assert_eq!(err.to_string(), "Missing environment variable: CHAT_WS_URL");

        let err = validate_url("CHAT_WS_URL", "tcp://chat").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for environment variable CHAT_WS_URL: 'tcp://chat' is not a ws:// or wss:// URL"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_defaults() {
        clear_env_vars();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.ws_url, "ws://localhost:8000/ws");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_delay, Duration::from_secs(3));
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("CHAT_WS_URL", "wss://chat.example.com/ws");
            env::set_var("CHAT_MAX_RETRIES", "2");
            env::set_var("CHAT_RETRY_DELAY_MS", "500");
            env::set_var("RUST_LOG", "debug");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.ws_url, "wss://chat.example.com/ws");
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_delay, Duration::from_millis(500));
        assert_eq!(config.log_level, Level::DEBUG);
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_invalid_max_retries() {
        clear_env_vars();
        unsafe {
            env::set_var("CHAT_MAX_RETRIES", "many");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "CHAT_MAX_RETRIES"),
            _ => panic!("Expected InvalidValue for CHAT_MAX_RETRIES"),
        }
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_invalid_url_scheme() {
        clear_env_vars();
        unsafe {
            env::set_var("CHAT_WS_URL", "http://localhost:8000/ws");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "CHAT_WS_URL"),
            _ => panic!("Expected InvalidValue for CHAT_WS_URL"),
        }
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_empty_url_is_missing() {
        clear_env_vars();
        unsafe {
            env::set_var("CHAT_WS_URL", "");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(var) => assert_eq!(var, "CHAT_WS_URL"),
            _ => panic!("Expected MissingVar for CHAT_WS_URL"),
        }
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_args_override_environment() {
        clear_env_vars();
        let mut config = Config::from_env().unwrap();
        let args = Args {
            url: Some("ws://127.0.0.1:9001/ws".to_string()),
            max_retries: Some(0),
            retry_delay_ms: Some(20),
        };

        config.apply_args(&args).unwrap();

        let client = config.client_config();
        assert_eq!(client.url, "ws://127.0.0.1:9001/ws");
        assert_eq!(client.retry.max_retries, 0);
        assert_eq!(client.retry.delay, Duration::from_millis(20));
    }

    #[test]
    fn test_args_reject_empty_url() {
        let mut config = Config {
            ws_url: DEFAULT_URL.to_string(),
            max_retries: 5,
            retry_delay: Duration::from_secs(3),
            log_level: Level::INFO,
        };
        let args = Args {
            url: Some(String::new()),
            ..Args::default()
        };

        match config.apply_args(&args) {
            Err(ConfigError::InvalidValue(source, reason)) => {
                assert_eq!(source, "--url");
                assert_eq!(reason, "URL must not be empty");
            }
            other => panic!("Expected InvalidValue for --url, got {:?}", other),
        }
        assert_eq!(config.ws_url, DEFAULT_URL);
    }
}
