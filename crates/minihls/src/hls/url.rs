//! Resolution of playlist references to absolute URLs.
//!
//! Two of the rules here are not generic RFC 3986 joins and are kept as
//! separate, named policies:
//!
//! * [`ResolutionPolicy::VariantQuerySwap`]: a relative variant URI carrying a
//!   query string keeps the master playlist's scheme, host and path and only
//!   swaps in the variant's query.
//! * [`ResolutionPolicy::KeyHostRelative`]: a relative key URI is resolved
//!   against the origin (scheme + host) of the media playlist, not its
//!   directory.

use url::Url;

use crate::hls::HlsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPolicy {
    /// Plain relative join against the base URL.
    Standard,
    VariantQuerySwap,
    KeyHostRelative,
}

/// A URI as written in a playlist together with the URL it was found under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistReference {
    pub uri: String,
    pub base: Url,
}

/// True if `uri` already names an http(s) resource.
pub fn has_http_scheme(uri: &str) -> bool {
    let lower = uri.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

impl PlaylistReference {
    pub fn new(uri: impl Into<String>, base: Url) -> Self {
        Self {
            uri: uri.into(),
            base,
        }
    }

    pub fn is_absolute(&self) -> bool {
        has_http_scheme(&self.uri)
    }

    pub fn resolve(&self, policy: ResolutionPolicy) -> Result<Url, HlsError> {
        let uri = self.uri.trim();
        if uri.is_empty() {
            return Err(HlsError::Url(format!(
                "empty reference under {}",
                self.base
            )));
        }
        if self.is_absolute() {
            return Url::parse(uri).map_err(|e| HlsError::Url(format!("{uri}: {e}")));
        }

        let joined = match policy {
            ResolutionPolicy::Standard => self.base.join(uri),
            ResolutionPolicy::VariantQuerySwap => match uri.split_once('?') {
                Some((_, query)) => {
                    let mut swapped = self.base.clone();
                    swapped.set_query(Some(query));
                    swapped.set_fragment(None);
                    Ok(swapped)
                }
                // Without a query there is nothing to swap.
                None => self.base.join(uri),
            },
            ResolutionPolicy::KeyHostRelative => {
                let mut origin = self.base.clone();
                origin.set_path("/");
                origin.set_query(None);
                origin.set_fragment(None);
                origin.join(uri)
            }
        };

        joined.map_err(|e| {
            HlsError::Url(format!(
                "could not resolve '{uri}' against {}: {e}",
                self.base
            ))
        })
    }
}

/// Resolve the URI picked by the variant selector against the master playlist URL.
pub fn resolve_variant_url(master_url: &Url, uri: &str) -> Result<Url, HlsError> {
    PlaylistReference::new(uri, master_url.clone()).resolve(ResolutionPolicy::VariantQuerySwap)
}

/// Resolve a key URI against the media playlist it was declared in.
pub fn resolve_key_url(media_playlist_url: &Url, uri: &str) -> Result<Url, HlsError> {
    PlaylistReference::new(uri, media_playlist_url.clone())
        .resolve(ResolutionPolicy::KeyHostRelative)
}

/// Resolve a segment URI against the media playlist it was listed in.
pub fn resolve_segment_url(media_playlist_url: &Url, uri: &str) -> Result<Url, HlsError> {
    PlaylistReference::new(uri, media_playlist_url.clone()).resolve(ResolutionPolicy::Standard)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn master() -> Url {
        Url::parse("https://gw.example.jp/v1/hls/abc123/video.m3u8?min_bw=250&https=1").unwrap()
    }

    #[test]
    fn test_absolute_reference_is_untouched() {
        let url = resolve_variant_url(&master(), "https://cdn.example.jp/high/index.m3u8").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.jp/high/index.m3u8");
        assert!(has_http_scheme("HTTP://upper.example/x"));
        assert!(!has_http_scheme("seg0.ts"));
    }

    #[test]
    fn test_variant_query_swap() {
        let url = resolve_variant_url(&master(), "video.m3u8?bw=5000&token=xyz").unwrap();
        assert_eq!(
            url.as_str(),
            "https://gw.example.jp/v1/hls/abc123/video.m3u8?bw=5000&token=xyz"
        );
    }

    #[test]
    fn test_variant_without_query_joins_directory() {
        let url = resolve_variant_url(&master(), "high.m3u8").unwrap();
        assert_eq!(url.as_str(), "https://gw.example.jp/v1/hls/abc123/high.m3u8");
    }

    #[test]
    fn test_key_resolves_against_origin() {
        let media = Url::parse("https://media.example.jp:8443/path/to/variant.m3u8?x=1").unwrap();
        assert_eq!(
            resolve_key_url(&media, "enc.key").unwrap().as_str(),
            "https://media.example.jp:8443/enc.key"
        );
        assert_eq!(
            resolve_key_url(&media, "/keys/enc.key?k=2").unwrap().as_str(),
            "https://media.example.jp:8443/keys/enc.key?k=2"
        );
    }

    #[test]
    fn test_segment_standard_join() {
        let media = Url::parse("https://media.example.jp/path/to/variant.m3u8").unwrap();
        assert_eq!(
            resolve_segment_url(&media, "seg0.ts").unwrap().as_str(),
            "https://media.example.jp/path/to/seg0.ts"
        );
    }

    #[test]
    fn test_empty_reference_is_rejected() {
        let err = resolve_segment_url(&master(), "  ").unwrap_err();
        assert!(matches!(err, HlsError::Url(_)));
    }
}
