use std::time::Duration;

use crate::retry::{RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES};

/// Per-request timeout, independent of the retry loop.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Web root paired with [`DEFAULT_API_URL`].
pub const DEFAULT_WEB_URL: &str = "https://github.com";

/// Path suffix of a GitHub Enterprise Server REST root.
const ENTERPRISE_API_SUFFIX: &str = "/api/v3";

/// Tracker client configuration.
///
/// `Default` reads overrides from the environment:
/// - `RELPROCOTRON_API_URL`
/// - `RELPROCOTRON_MAX_RETRIES`
/// - `RELPROCOTRON_BASE_DELAY_MS`
/// - `RELPROCOTRON_TIMEOUT_SECS`
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// REST API root, without trailing slash.
    pub api_url: String,
    pub retry: RetryPolicy,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_url: std::env::var("RELPROCOTRON_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.into()),
            retry: RetryPolicy {
                max_retries: env_parse("RELPROCOTRON_MAX_RETRIES").unwrap_or(DEFAULT_MAX_RETRIES),
                base_delay: env_parse("RELPROCOTRON_BASE_DELAY_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(DEFAULT_BASE_DELAY),
            },
            timeout: env_parse("RELPROCOTRON_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            user_agent: format!("relprocotron/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TrackerConfig {
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// API root with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// Browser-facing root of the tracker the API root belongs to.
    ///
    /// `api.github.com` maps to `github.com`; an Enterprise root such as
    /// `https://ghe.example.com/api/v3` maps to `https://ghe.example.com`.
    pub fn web_url(&self) -> String {
        let base = self.base_url();
        if base == DEFAULT_API_URL {
            return DEFAULT_WEB_URL.to_string();
        }
        base.strip_suffix(ENTERPRISE_API_SUFFIX)
            .unwrap_or(base)
            .to_string()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_strips_trailing_slash() {
        let config = TrackerConfig::default().with_api_url("https://ghe.example.com/api/v3/");
        assert_eq!(config.base_url(), "https://ghe.example.com/api/v3");
    }

    #[test]
    fn web_url_for_public_api() {
        let config = TrackerConfig::default().with_api_url("https://api.github.com/");
        assert_eq!(config.web_url(), DEFAULT_WEB_URL);
    }

    #[test]
    fn web_url_for_enterprise_api() {
        let config = TrackerConfig::default().with_api_url("https://ghe.example.com/api/v3");
        assert_eq!(config.web_url(), "https://ghe.example.com");

        let config = TrackerConfig::default().with_api_url("http://127.0.0.1:8080/api/v3/");
        assert_eq!(config.web_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn user_agent_carries_version() {
        let config = TrackerConfig::default();
        assert!(config.user_agent.starts_with("relprocotron/"));
    }

    #[test]
    fn with_retry_overrides_policy() {
        let config =
            TrackerConfig::default().with_retry(RetryPolicy::new(1, Duration::from_millis(5)));
        assert_eq!(config.retry.max_attempts(), 2);
    }
}
