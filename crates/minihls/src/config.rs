use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

use crate::proxy::ProxyConfig;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36 Edg/118.0.2088.61";

/// Configurable options for the HTTP session
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Overall timeout for a single HTTP request (zero disables it)
    pub timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// User agent string
    pub user_agent: String,

    /// Custom HTTP headers for requests
    pub headers: HeaderMap,

    /// Proxy configuration (optional)
    pub proxy: Option<ProxyConfig>,

    /// Whether to use system proxy settings if available
    pub use_system_proxy: bool,

    /// Carry cookies from earlier responses into later requests of the same session
    pub cookie_store: bool,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: DownloaderConfig::get_default_headers(),
            proxy: None,
            use_system_proxy: true,
            cookie_store: true,
        }
    }
}

impl DownloaderConfig {
    pub fn builder() -> crate::builder::DownloaderConfigBuilder {
        crate::builder::DownloaderConfigBuilder::new()
    }

    /// Merge custom headers over the current ones. Custom values win on
    /// conflicts; names not in `custom` are kept.
    pub fn merge_headers(&mut self, custom: HeaderMap) {
        // Replaces each existing name with all custom values of that name.
        self.headers.extend(custom);
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::new();

        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("*/*"),
        );

        default_headers.insert(
            reqwest::header::CONNECTION,
            HeaderValue::from_static("keep-alive"),
        );

        default_headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9,ja;q=0.8"),
        );
        default_headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{ACCEPT, HeaderName};

    #[test]
    fn test_merge_headers_prefers_custom_values() {
        let mut custom = HeaderMap::new();
        custom.insert(ACCEPT, HeaderValue::from_static("application/vnd.apple.mpegurl"));
        custom.insert(
            HeaderName::from_static("referer"),
            HeaderValue::from_static("https://example.com/"),
        );

        let mut config = DownloaderConfig::default();
        config.merge_headers(custom);
        let merged = &config.headers;
        assert_eq!(merged.get(ACCEPT).unwrap(), "application/vnd.apple.mpegurl");
        assert_eq!(merged.get("referer").unwrap(), "https://example.com/");
        assert!(merged.contains_key(reqwest::header::ACCEPT_LANGUAGE));
    }
}
