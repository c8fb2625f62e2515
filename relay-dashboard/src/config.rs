//! Configuration module

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use relay_core::constants::DEFAULT_ANALYTICS_FILE;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address
    pub bind_addr: String,

    /// Server port
    pub port: u16,

    /// Directory holding the five classifier artifacts
    pub model_dir: PathBuf,

    /// Analytics CSV behind the charts
    pub analytics_path: PathBuf,

    /// Idle time before a session is dropped
    pub session_ttl_secs: u64,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8501,
            model_dir: PathBuf::from("."),
            analytics_path: PathBuf::from(DEFAULT_ANALYTICS_FILE),
            session_ttl_secs: 3600,
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),

            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            model_dir: env::var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),

            analytics_path: env::var("ANALYTICS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.analytics_path),

            session_ttl_secs: env::var("SESSION_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.session_ttl_secs),

            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}
