use std::env::var;
use std::time::Duration;

use dotenvy::dotenv;

/// Application configuration with environment variable overrides
#[derive(Debug, Clone)]
pub struct Config {
    /// Request body size limit in bytes
    /// Env: REQUEST_BODY_LIMIT (default: 1048576 = 1MB)
    pub request_body_limit: usize,

    /// Request timeout in seconds
    /// Env: REQUEST_TIMEOUT_SECS (default: 30)
    pub request_timeout: Duration,

    /// Server port
    /// Env: PORT (default: 3000)
    pub port: u16,

    /// Database file path
    /// Env: DATABASE_PATH (default: "statline.db")
    pub database_path: String,

    /// Base URL of the summoner verification API
    /// Env: SUMMONER_API_URL (optional; player creation is ungated when unset)
    pub summoner_api_url: Option<String>,

    /// Consumer key for the summoner verification API
    /// Env: SUMMONER_API_KEY (optional)
    pub summoner_api_key: Option<String>,

    /// Timeout for summoner lookups in milliseconds
    /// Env: SUMMONER_TIMEOUT_MS (default: 2500)
    pub summoner_timeout: Duration,

    /// Rate limit for key issuance endpoints (requests per minute)
    /// Env: RATE_LIMIT_KEY_PER_MIN (default: 30)
    /// Keys are minted rarely, so this stays low
    pub rate_limit_key_per_min: u64,

    /// Burst size for key issuance endpoints
    /// Env: RATE_LIMIT_KEY_BURST (default: 5)
    pub rate_limit_key_burst: u32,

    /// Rate limit for player endpoints (requests per second)
    /// Env: RATE_LIMIT_PLAYER_PER_SEC (default: 50)
    pub rate_limit_player_per_sec: u64,

    /// Burst size for player endpoints
    /// Env: RATE_LIMIT_PLAYER_BURST (default: 100)
    pub rate_limit_player_burst: u32,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let _ = dotenv(); //for debugging mostly
        Self {
            request_body_limit: env_or_default("REQUEST_BODY_LIMIT", 1024 * 1024),
            request_timeout: Duration::from_secs(env_or_default("REQUEST_TIMEOUT_SECS", 30)),
            port: env_or_default("PORT", 3000),
            database_path: env_or_default_string("DATABASE_PATH", "statline.db"),
            summoner_api_url: var("SUMMONER_API_URL").ok(),
            summoner_api_key: var("SUMMONER_API_KEY").ok(),
            summoner_timeout: Duration::from_millis(env_or_default("SUMMONER_TIMEOUT_MS", 2500)),
            rate_limit_key_per_min: env_or_default("RATE_LIMIT_KEY_PER_MIN", 30),
            rate_limit_key_burst: env_or_default("RATE_LIMIT_KEY_BURST", 5),
            rate_limit_player_per_sec: env_or_default("RATE_LIMIT_PLAYER_PER_SEC", 50),
            rate_limit_player_burst: env_or_default("RATE_LIMIT_PLAYER_BURST", 100),
        }
    }

    /// Create configuration with all default values
    pub fn default() -> Self {
        Self {
            request_body_limit: 1024 * 1024, // 1 MB
            request_timeout: Duration::from_secs(30),
            port: 3000,
            database_path: "statline.db".to_string(),
            summoner_api_url: None,
            summoner_api_key: None,
            summoner_timeout: Duration::from_millis(2500),
            rate_limit_key_per_min: 30,
            rate_limit_key_burst: 5,
            rate_limit_player_per_sec: 50,
            rate_limit_player_burst: 100,
        }
    }
}

/// Parse environment variable or return default value
fn env_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    var(key)
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(default)
}

/// Parse environment variable string or return default value
fn env_or_default_string(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|_| default.to_string())
}
