//! # minihls
//!
//! A library for downloading a complete HLS stream into a single file.
//!
//! ## Features
//!
//! - Highest-quality variant selection from a master playlist
//! - AES-128-CBC segment decryption with strict PKCS#7 unpadding
//! - One HTTP session per download, with cookies, custom headers and proxies
//! - Optional bounded prefetch that still writes segments strictly in order

pub mod builder;
pub mod config;
pub mod error;
pub mod hls;
pub mod proxy;
pub mod session;

pub use builder::DownloaderConfigBuilder;
pub use config::DownloaderConfig;
pub use error::DownloadError;

// Re-export session utilities
pub use session::{Fetcher, HttpSession, create_client};

// Re-export proxy utilities
pub use proxy::{ProxyAuth, ProxyConfig, ProxyType};
