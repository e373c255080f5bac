use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub engines: EnginesConfig,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("cinescrape/{}", env!("CARGO_PKG_VERSION"))
}

/// Detail scraping configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScrapeConfig {
    /// Maximum detail pages fetched concurrently per scrape call
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

fn default_max_concurrent_fetches() -> usize {
    4
}

/// Per-engine configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EnginesConfig {
    #[serde(default)]
    pub netnaija: NetNaijaConfig,
}

/// NetNaija engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetNaijaConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Override of the site root (mirrors, local fixtures)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for NetNaijaConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            base_url: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}
