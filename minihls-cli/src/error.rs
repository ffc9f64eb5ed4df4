use minihls_engine::hls::HlsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Download error: {0}")]
    Download(#[from] minihls_engine::DownloadError),

    #[error("HLS error: {0}")]
    Hls(#[from] HlsError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),
}
