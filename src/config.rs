use std::env;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,
    pub log_format: String,

    // Pinboard configuration
    pub pinboard_token: String,
    pub pinboard_api_url: String,
    pub min_interval_ms: u64,
    pub request_timeout: u64,

    // Cache configuration
    pub cache_ttl: u64,

    // Inbound rate limiting
    pub rate_limit_requests: u32,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("environment", &self.environment)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("pinboard_token", &"<redacted>")
            .field("pinboard_api_url", &self.pinboard_api_url)
            .field("min_interval_ms", &self.min_interval_ms)
            .field("request_timeout", &self.request_timeout)
            .field("cache_ttl", &self.cache_ttl)
            .field("rate_limit_requests", &self.rate_limit_requests)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let pinboard_token = lookup("PINBOARD_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow::anyhow!("PINBOARD_TOKEN environment variable is required"))?;

        let rate_limit_requests: u32 = var("RATE_LIMIT_REQUESTS", "60").parse()?;
        if rate_limit_requests == 0 {
            anyhow::bail!("RATE_LIMIT_REQUESTS must be greater than zero");
        }

        Ok(Config {
            server_host: var("SERVER_HOST", "127.0.0.1"),
            server_port: var("SERVER_PORT", "3000").parse()?,
            environment: var("ENVIRONMENT", "development"),
            log_level: var("LOG_LEVEL", "pinboard_bridge=debug,tower_http=debug"),
            log_format: var("LOG_FORMAT", "text"),

            pinboard_token,
            pinboard_api_url: var("PINBOARD_API_URL", "https://api.pinboard.in/v1"),
            min_interval_ms: var("PINBOARD_MIN_INTERVAL_MS", "3000").parse()?,
            request_timeout: var("REQUEST_TIMEOUT", "30").parse()?,

            cache_ttl: var("CACHE_TTL", "15").parse()?,

            rate_limit_requests,
        })
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
