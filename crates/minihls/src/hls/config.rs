use crate::DownloaderConfig;

#[derive(Debug, Clone)]
pub struct HlsConfig {
    /// Base HTTP session configuration
    pub base: DownloaderConfig,
    /// Segments fetched and decrypted ahead of the writer. 1 means strictly sequential.
    pub download_concurrency: usize,
    /// Run AES decryption on the blocking thread pool instead of inline
    pub offload_decryption: bool,
}

impl Default for HlsConfig {
    fn default() -> Self {
        Self {
            base: DownloaderConfig::default(),
            download_concurrency: 1,
            offload_decryption: false,
        }
    }
}

impl HlsConfig {
    pub fn with_base_config(mut self, base: DownloaderConfig) -> Self {
        self.base = base;
        self
    }

    /// Values below 1 are clamped to 1.
    pub fn with_download_concurrency(mut self, concurrency: usize) -> Self {
        self.download_concurrency = concurrency.max(1);
        self
    }

    pub fn with_offload_decryption(mut self, offload: bool) -> Self {
        self.offload_decryption = offload;
        self
    }
}
