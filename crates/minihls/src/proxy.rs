use reqwest::Proxy;

/// Proxy configuration types
#[derive(Debug, Clone, PartialEq, Eq, Copy, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ProxyType {
    /// HTTP proxy
    Http,
    /// HTTPS proxy
    Https,
    /// SOCKS5 proxy (the interactive prompt only asks for this one)
    #[default]
    Socks5,
    /// All protocols proxy
    All,
}

/// Proxy authentication type
#[derive(Debug, Clone)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

/// Proxy configuration
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Proxy address, with or without scheme (e.g. "127.0.0.1:1080")
    pub url: String,
    pub proxy_type: ProxyType,
    pub auth: Option<ProxyAuth>,
}

impl ProxyConfig {
    /// A SOCKS5 proxy at `address`, the form the interactive prompt produces.
    pub fn socks5(address: impl Into<String>) -> Self {
        Self {
            url: address.into(),
            proxy_type: ProxyType::Socks5,
            auth: None,
        }
    }

    /// The proxy URL with the scheme implied by `proxy_type` filled in.
    pub fn normalized_url(&self) -> String {
        let url = self.url.trim();
        if url.contains("://") {
            return url.to_string();
        }
        match self.proxy_type {
            ProxyType::Socks5 => format!("socks5://{url}"),
            ProxyType::Https => format!("https://{url}"),
            ProxyType::Http | ProxyType::All => format!("http://{url}"),
        }
    }
}

/// Build a reqwest Proxy object from our proxy configuration
pub fn build_proxy_from_config(config: &ProxyConfig) -> Result<Proxy, String> {
    let proxy_url = config.normalized_url();

    let mut proxy = match config.proxy_type {
        ProxyType::Http => {
            Proxy::http(&proxy_url).map_err(|e| format!("Invalid HTTP proxy URL: {e}"))?
        }
        ProxyType::Https => {
            Proxy::https(&proxy_url).map_err(|e| format!("Invalid HTTPS proxy URL: {e}"))?
        }
        ProxyType::Socks5 => {
            Proxy::all(&proxy_url).map_err(|e| format!("Invalid SOCKS5 proxy URL: {e}"))?
        }
        ProxyType::All => Proxy::all(&proxy_url).map_err(|e| format!("Invalid proxy URL: {e}"))?,
    };

    if let Some(auth) = &config.auth {
        proxy = proxy.basic_auth(&auth.username, &auth.password);
    }

    Ok(proxy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socks5_scheme_is_prepended() {
        let config = ProxyConfig::socks5("127.0.0.1:1080");
        assert_eq!(config.normalized_url(), "socks5://127.0.0.1:1080");
        assert!(build_proxy_from_config(&config).is_ok());
    }

    #[test]
    fn test_explicit_scheme_is_kept() {
        let config = ProxyConfig {
            url: "socks5h://proxy.local:9050".to_string(),
            proxy_type: ProxyType::Socks5,
            auth: None,
        };
        assert_eq!(config.normalized_url(), "socks5h://proxy.local:9050");
    }

    #[test]
    fn test_http_proxy_with_auth() {
        let config = ProxyConfig {
            url: "proxy.example.com:8080".to_string(),
            proxy_type: ProxyType::Http,
            auth: Some(ProxyAuth {
                username: "user".to_string(),
                password: "pass".to_string(),
            }),
        };
        assert_eq!(config.normalized_url(), "http://proxy.example.com:8080");
        assert!(build_proxy_from_config(&config).is_ok());
    }
}
