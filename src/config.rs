//! Configuration types for asset-localizer

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Proxy schemes the HTTP transport can route through
const SUPPORTED_PROXY_SCHEMES: &[&str] = &["http", "https", "socks5", "socks5h"];

/// Network behavior configuration (proxying, concurrency, timeouts, retries)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Optional proxy address (http://, https://, socks5:// or socks5h://)
    ///
    /// When absent, a failed direct fetch has no fallback.
    #[serde(default)]
    pub proxy: Option<String>,

    /// URL substrings that skip the direct attempt and go straight to the proxy
    #[serde(default = "default_force_proxy_domains")]
    pub force_proxy_domains: Vec<String>,

    /// Number of fetches executed in parallel within one batch (default: 8)
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Timeout of a single direct attempt (default: 15 seconds)
    #[serde(default = "default_direct_timeout", with = "duration_serde")]
    pub direct_timeout: Duration,

    /// Timeout of the proxied attempt (default: 45 seconds)
    #[serde(default = "default_proxy_timeout", with = "duration_serde")]
    pub proxy_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Retry policy for transient server errors on the direct route
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            force_proxy_domains: default_force_proxy_domains(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            direct_timeout: default_direct_timeout(),
            proxy_timeout: default_proxy_timeout(),
            user_agent: default_user_agent(),
            retry: RetryConfig::default(),
        }
    }
}

impl NetworkConfig {
    /// Whether the URL matches the forced-proxy domain list
    pub fn forces_proxy(&self, url: &str) -> bool {
        self.force_proxy_domains
            .iter()
            .filter(|domain| !domain.is_empty())
            .any(|domain| url.contains(domain.as_str()))
    }

    /// The configured proxy, ignoring blank values
    pub fn proxy(&self) -> Option<&str> {
        self.proxy
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// Main configuration for [`Localizer`](crate::Localizer)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Output root; fetched resources are written below it
    pub output_dir: PathBuf,

    /// Public prefix of every web path (default: "/niko")
    #[serde(default = "default_web_root")]
    pub web_root: String,

    /// Owner segment of web paths (default: final component of `output_dir`)
    #[serde(default)]
    pub owner: Option<String>,

    /// Network settings
    #[serde(flatten)]
    pub network: NetworkConfig,
}

impl Config {
    /// Create a configuration with defaults for everything but the output root
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            web_root: default_web_root(),
            owner: None,
            network: NetworkConfig::default(),
        }
    }

    /// Owner segment used in web paths, sanitized for use in a URL path
    pub fn owner_name(&self) -> String {
        let raw = match &self.owner {
            Some(owner) => owner.clone(),
            None => self
                .output_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        crate::utils::sanitize_owner_name(&raw)
    }

    /// Check the configuration for inconsistencies that must stop the pipeline
    /// before any network activity.
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(Error::config("output_dir", "output directory must not be empty"));
        }

        if self.network.max_concurrent_fetches == 0 {
            return Err(Error::config(
                "max_concurrent_fetches",
                "at least one concurrent fetch is required",
            ));
        }

        let multiplier = self.network.retry.backoff_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(Error::config(
                "backoff_multiplier",
                format!("backoff multiplier must be a finite number >= 1.0, got {}", multiplier),
            ));
        }

        if let Some(proxy) = self.network.proxy() {
            let parsed = url::Url::parse(proxy).map_err(|e| {
                Error::config("proxy", format!("invalid proxy URL '{}': {}", proxy, e))
            })?;
            if !SUPPORTED_PROXY_SCHEMES.contains(&parsed.scheme()) {
                return Err(Error::config(
                    "proxy",
                    format!(
                        "unsupported proxy scheme '{}' (supported: {})",
                        parsed.scheme(),
                        SUPPORTED_PROXY_SCHEMES.join(", ")
                    ),
                ));
            }
            if parsed.host_str().is_none_or(str::is_empty) {
                return Err(Error::config(
                    "proxy",
                    format!("proxy URL '{}' has no host", proxy),
                ));
            }
        }

        Ok(())
    }
}

/// Retry configuration for transient server errors
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Number of additional attempts after the first one (default: 2)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (default: 500 milliseconds)
    #[serde(default = "default_initial_delay", with = "duration_millis_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 5 seconds)
    #[serde(default = "default_max_delay", with = "duration_millis_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: false,
        }
    }
}

fn default_web_root() -> String {
    "/niko".to_string()
}

fn default_force_proxy_domains() -> Vec<String> {
    [
        "gitgud.io",
        "raw.githubusercontent.com",
        "cdn.jsdelivr.net",
        "github.com",
        "fonts.googleapis.com",
        "files.catbox.moe",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_concurrent_fetches() -> usize {
    8
}

fn default_direct_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_proxy_timeout() -> Duration {
    Duration::from_secs(45)
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_max_attempts() -> u32 {
    2
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
