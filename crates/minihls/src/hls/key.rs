// Key and IV resolution for AES-128 encrypted media playlists.

use tracing::{debug, warn};
use url::Url;

use crate::hls::error::KeyErrorKind;
use crate::hls::url::resolve_key_url;
use crate::hls::HlsError;
use crate::session::Fetcher;

pub const KEY_LEN: usize = 16;
pub const IV_LEN: usize = 16;

/// Fetch the 16-byte AES key declared by a media playlist.
///
/// A relative `key_uri` is resolved against the origin of
/// `media_playlist_url`.
pub async fn resolve_key(
    fetcher: &dyn Fetcher,
    key_uri: &str,
    media_playlist_url: &Url,
) -> Result<[u8; KEY_LEN], HlsError> {
    if key_uri.trim().is_empty() {
        return Err(HlsError::Key(KeyErrorKind::Empty));
    }

    let key_url = resolve_key_url(media_playlist_url, key_uri)?;
    debug!(key_url = %key_url, "Fetching decryption key");
    let body = fetcher.fetch(&key_url).await?;

    let key: [u8; KEY_LEN] = body[..].try_into().map_err(|_| {
        warn!(key_url = %key_url, len = body.len(), "Decryption key has wrong length");
        HlsError::Key(KeyErrorKind::Length(body.len()))
    })?;
    Ok(key)
}

/// Decode the IV attribute of a key line.
///
/// An empty string means the playlist declared no IV, which is not the same
/// as an all-zero IV.
pub fn resolve_iv(iv: &str) -> Result<Option<[u8; IV_LEN]>, HlsError> {
    let iv = iv.trim();
    if iv.is_empty() {
        return Ok(None);
    }

    let digits = iv
        .strip_prefix("0x")
        .or_else(|| iv.strip_prefix("0X"))
        .unwrap_or(iv);
    let bytes =
        hex::decode(digits).map_err(|e| HlsError::Decode(format!("IV '{iv}': {e}")))?;
    let iv_bytes: [u8; IV_LEN] = bytes.as_slice().try_into().map_err(|_| {
        HlsError::Decode(format!(
            "IV '{iv}' decodes to {} bytes (expected {IV_LEN})",
            bytes.len()
        ))
    })?;
    Ok(Some(iv_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;

    struct OneShotFetcher {
        body: Bytes,
        requested: Mutex<Vec<String>>,
    }

    impl OneShotFetcher {
        fn new(body: &[u8]) -> Self {
            Self {
                body: Bytes::copy_from_slice(body),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Fetcher for OneShotFetcher {
        async fn fetch(&self, url: &Url) -> Result<Bytes, HlsError> {
            self.requested.lock().unwrap().push(url.to_string());
            Ok(self.body.clone())
        }
    }

    fn media_url() -> Url {
        Url::parse("https://media.example.com/hls/720p/index.m3u8").unwrap()
    }

    #[tokio::test]
    async fn test_resolve_relative_key() {
        let fetcher = OneShotFetcher::new(&[7u8; 16]);
        let key = resolve_key(&fetcher, "enc.key", &media_url()).await.unwrap();
        assert_eq!(key, [7u8; 16]);
        assert_eq!(
            fetcher.requested.lock().unwrap().as_slice(),
            ["https://media.example.com/enc.key"]
        );
    }

    #[tokio::test]
    async fn test_short_key_is_length_error() {
        let fetcher = OneShotFetcher::new(&[1u8; 15]);
        let err = resolve_key(&fetcher, "https://keys.example.com/k", &media_url())
            .await
            .unwrap_err();
        assert!(matches!(err, HlsError::Key(KeyErrorKind::Length(15))));
    }

    #[tokio::test]
    async fn test_empty_key_uri() {
        let fetcher = OneShotFetcher::new(&[0u8; 16]);
        let err = resolve_key(&fetcher, "", &media_url()).await.unwrap_err();
        assert!(matches!(err, HlsError::Key(KeyErrorKind::Empty)));
        assert!(fetcher.requested.lock().unwrap().is_empty());
    }

    #[test]
    fn test_iv_with_and_without_prefix() {
        let expected: [u8; 16] = [
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd,
            0xee, 0xff,
        ];
        for raw in [
            "0x00112233445566778899aabbccddeeff",
            "00112233445566778899AABBCCDDEEFF",
            "0X00112233445566778899AaBbCcDdEeFf",
        ] {
            assert_eq!(resolve_iv(raw).unwrap(), Some(expected), "{raw}");
        }
    }

    #[test]
    fn test_empty_iv_is_none() {
        assert_eq!(resolve_iv("").unwrap(), None);
    }

    #[test]
    fn test_bad_iv_is_decode_error() {
        assert!(matches!(resolve_iv("0xzz"), Err(HlsError::Decode(_))));
        assert!(matches!(resolve_iv("0x123"), Err(HlsError::Decode(_))));
        assert!(matches!(resolve_iv("0x0011"), Err(HlsError::Decode(_))));
    }
}
