//! # Builder for DownloaderConfig
//!
//! Fluent construction of a [`DownloaderConfig`].
//!
//! ```
//! use std::time::Duration;
//! use minihls_engine::DownloaderConfig;
//! use minihls_engine::proxy::ProxyConfig;
//!
//! let config = DownloaderConfig::builder()
//!     .with_timeout(Duration::from_secs(60))
//!     .with_header("Referer", "https://example.com/")
//!     .with_proxy(ProxyConfig::socks5("127.0.0.1:1080"))
//!     .build();
//! assert!(config.proxy.is_some());
//! ```

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::warn;

use crate::{DownloaderConfig, proxy::ProxyConfig};

/// Builder for creating DownloaderConfig instances with a fluent API
#[derive(Debug, Clone)]
pub struct DownloaderConfigBuilder {
    config: DownloaderConfig,
}

impl DownloaderConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: DownloaderConfig::default(),
        }
    }

    /// Set the overall timeout for a single HTTP request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.config.follow_redirects = follow;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a single header. Invalid names or values are logged and ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.config.headers.insert(name, value);
            }
            _ => warn!("Ignoring invalid header '{}: {}'", name, value),
        }
        self
    }

    /// Merge a set of custom headers over the headers configured so far
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.config.merge_headers(headers);
        self
    }

    /// Use an explicit proxy. This disables the system proxy.
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.config.proxy = Some(proxy);
        self.config.use_system_proxy = false;
        self
    }

    pub fn with_system_proxy(mut self, enabled: bool) -> Self {
        self.config.use_system_proxy = enabled;
        self
    }

    pub fn with_cookie_store(mut self, enabled: bool) -> Self {
        self.config.cookie_store = enabled;
        self
    }

    pub fn build(self) -> DownloaderConfig {
        self.config
    }
}

impl Default for DownloaderConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_USER_AGENT;
    use crate::proxy::ProxyType;

    #[test]
    fn test_builder_defaults() {
        let config = DownloaderConfigBuilder::new().build();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert!(config.follow_redirects);
        assert!(config.use_system_proxy);
        assert!(config.cookie_store);
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_builder_customization() {
        let config = DownloaderConfigBuilder::new()
            .with_timeout(Duration::from_secs(60))
            .with_connect_timeout(Duration::from_secs(20))
            .with_follow_redirects(false)
            .with_user_agent("CustomUserAgent/1.0")
            .with_header("X-Custom-Header", "CustomValue")
            .with_header("bad header", "value")
            .with_cookie_store(false)
            .build();

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(20));
        assert!(!config.follow_redirects);
        assert!(!config.cookie_store);
        assert_eq!(config.user_agent, "CustomUserAgent/1.0");
        assert_eq!(config.headers.get("X-Custom-Header").unwrap(), "CustomValue");
        assert!(!config.headers.contains_key("bad header"));
    }

    #[test]
    fn test_with_headers_keeps_earlier_headers() {
        let mut custom = HeaderMap::new();
        custom.insert("origin", HeaderValue::from_static("https://example.com"));
        custom.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/vnd.apple.mpegurl"),
        );

        let config = DownloaderConfigBuilder::new()
            .with_header("Referer", "https://example.com/player")
            .with_headers(custom)
            .build();

        assert_eq!(
            config.headers.get("referer").unwrap(),
            "https://example.com/player"
        );
        assert_eq!(config.headers.get("origin").unwrap(), "https://example.com");
        assert_eq!(
            config.headers.get(reqwest::header::ACCEPT).unwrap(),
            "application/vnd.apple.mpegurl"
        );
        assert!(config.headers.contains_key(reqwest::header::ACCEPT_LANGUAGE));
    }

    #[test]
    fn test_proxy_disables_system_proxy() {
        let config = DownloaderConfigBuilder::new()
            .with_proxy(ProxyConfig::socks5("127.0.0.1:1080"))
            .build();

        assert!(!config.use_system_proxy);
        let proxy = config.proxy.unwrap();
        assert_eq!(proxy.proxy_type, ProxyType::Socks5);
        assert_eq!(proxy.url, "127.0.0.1:1080");
    }
}
