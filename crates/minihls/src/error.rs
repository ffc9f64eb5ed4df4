use crate::hls::HlsError;

// Errors raised while setting up or running a download session
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid proxy configuration: {0}")]
    ProxyError(String),

    #[error("HLS error: {0}")]
    HlsError(#[from] HlsError),
}
