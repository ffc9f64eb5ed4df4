//! HTTP session used by every stage of a download run.
//!
//! A session owns one reqwest [`Client`] and its cookie jar. It is created by
//! the caller for a single run and handed to the assembler by reference, so
//! cookies set by the master playlist response are sent along with the media
//! playlist, key and segment requests of the same run.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::cookie::Jar;
use tracing::{debug, info};
use url::Url;

use crate::hls::HlsError;
use crate::proxy::build_proxy_from_config;
use crate::{DownloadError, DownloaderConfig};

/// Retrieves the body of a resource.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Bytes, HlsError>;
}

/// Create a reqwest Client with the provided configuration
pub fn create_client(
    config: &DownloaderConfig,
    cookie_jar: Option<Arc<Jar>>,
) -> Result<Client, DownloadError> {
    let mut client_builder = Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    if !config.timeout.is_zero() {
        client_builder = client_builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    if let Some(jar) = cookie_jar {
        client_builder = client_builder.cookie_provider(jar);
    }

    if let Some(proxy_config) = &config.proxy {
        let proxy = build_proxy_from_config(proxy_config).map_err(DownloadError::ProxyError)?;
        client_builder = client_builder.proxy(proxy);
        info!(proxy_url = %proxy_config.normalized_url(), "Using explicitly configured proxy");
    } else if config.use_system_proxy {
        debug!("Using system proxy settings");
    } else {
        client_builder = client_builder.no_proxy();
        debug!("Proxy disabled");
    }

    client_builder.build().map_err(DownloadError::from)
}

pub struct HttpSession {
    client: Client,
    cookie_jar: Option<Arc<Jar>>,
}

impl HttpSession {
    pub fn new(config: &DownloaderConfig) -> Result<Self, DownloadError> {
        let cookie_jar = config.cookie_store.then(|| Arc::new(Jar::default()));
        let client = create_client(config, cookie_jar.clone())?;
        Ok(Self { client, cookie_jar })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The jar shared by all requests of this session, if cookies are enabled.
    pub fn cookie_jar(&self) -> Option<&Arc<Jar>> {
        self.cookie_jar.as_ref()
    }
}

#[async_trait]
impl Fetcher for HttpSession {
    async fn fetch(&self, url: &Url) -> Result<Bytes, HlsError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HlsError::Status {
                url: url.to_string(),
                status,
            });
        }
        let body = response.bytes().await?;
        debug!(url = %url, bytes = body.len(), "Fetched resource");
        Ok(body)
    }
}
