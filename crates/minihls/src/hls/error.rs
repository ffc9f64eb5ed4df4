use std::fmt;
use std::sync::Arc;

use reqwest::StatusCode;

/// Why the encryption key could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyErrorKind {
    /// The playlist is expected to be encrypted but declares no key URI.
    Empty,
    /// The key response was not exactly 16 bytes.
    Length(usize),
    /// The key line declares a method other than AES-128.
    UnsupportedMethod(String),
}

impl fmt::Display for KeyErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyErrorKind::Empty => write!(f, "key URI is empty"),
            KeyErrorKind::Length(len) => {
                write!(f, "key has incorrect length: {len} bytes (expected 16)")
            }
            KeyErrorKind::UnsupportedMethod(method) => {
                write!(f, "unsupported encryption method: {method}")
            }
        }
    }
}

/// Cipher input invariant that was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoErrorKind {
    KeyLength,
    IvLength,
    CiphertextLength,
}

impl fmt::Display for CryptoErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoErrorKind::KeyLength => write!(f, "key must be exactly 16 bytes"),
            CryptoErrorKind::IvLength => write!(f, "IV must be empty or exactly 16 bytes"),
            CryptoErrorKind::CiphertextLength => {
                write!(f, "ciphertext length is not a multiple of 16 bytes")
            }
        }
    }
}

#[derive(Debug, thiserror::Error, Clone)]
pub enum HlsError {
    #[error("Playlist parse error: {0}")]
    Parse(String),
    #[error("Key error: {0}")]
    Key(KeyErrorKind),
    #[error("IV decode error: {0}")]
    Decode(String),
    #[error("Crypto error: {0}")]
    Crypto(CryptoErrorKind),
    #[error("Padding error: {0}")]
    Padding(String),
    #[error("Network error: {source}")]
    Network {
        #[from]
        source: Arc<reqwest::Error>,
    },
    #[error("Server returned status code {status} for {url}")]
    Status { url: String, status: StatusCode },
    #[error("Invalid URL: {0}")]
    Url(String),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: Arc<std::io::Error>,
    },
    #[error("Internal error: {0}")]
    Internal(String),
}

// reqwest::Error and io::Error are not Clone, so they travel behind an Arc.
impl From<reqwest::Error> for HlsError {
    fn from(err: reqwest::Error) -> Self {
        HlsError::Network {
            source: Arc::new(err),
        }
    }
}

impl From<std::io::Error> for HlsError {
    fn from(err: std::io::Error) -> Self {
        HlsError::Io {
            source: Arc::new(err),
        }
    }
}

impl From<url::ParseError> for HlsError {
    fn from(err: url::ParseError) -> Self {
        HlsError::Url(err.to_string())
    }
}
