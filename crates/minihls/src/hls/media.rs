// Media playlist parsing: segment list plus the key declaration.

use std::sync::LazyLock;

use regex::Regex;

use crate::hls::variant::{strip_bom, uri_lines};

static KEY_URI_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"URI="([^"]*)""#).unwrap());
// IV runs to the end of the line; a following attribute is cut off at the comma.
static IV_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[:,])IV=([^,\s]*)").unwrap());
static METHOD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[:,])METHOD=([^,\s]*)").unwrap());

const KEY_TAG: &str = "#EXT-X-KEY:";

/// What a media playlist tells us about one rendition.
///
/// Empty `key_uri` and `iv` mean the playlist did not declare them; this is
/// a valid state (unencrypted stream), not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaPlaylistInfo {
    /// Segment URIs in playback order
    pub segments: Vec<String>,
    pub key_uri: String,
    /// Hex IV as written, possibly `0x`-prefixed
    pub iv: String,
    /// METHOD attribute of the key line, if one was present
    pub method: Option<String>,
}

impl MediaPlaylistInfo {
    /// True when segments need a key. A method other than NONE counts even
    /// without a key URI, so that case fails at key resolution.
    pub fn is_encrypted(&self) -> bool {
        match self.method.as_deref() {
            Some(method) => !method.eq_ignore_ascii_case("NONE"),
            None => !self.key_uri.is_empty(),
        }
    }
}

/// True if the text lists media segments.
pub fn is_media_playlist(text: &str) -> bool {
    text.contains("#EXTINF")
}

/// Parse a media playlist. Never fails: missing pieces are left empty.
///
/// Only the first key line that declares a URI is considered, as every
/// segment of the playlist is decrypted with the same key.
pub fn parse_media_playlist(text: &str) -> MediaPlaylistInfo {
    let text = strip_bom(text);
    let mut info = MediaPlaylistInfo {
        segments: uri_lines(text).map(str::to_string).collect(),
        ..Default::default()
    };

    let mut key_lines = text
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix(KEY_TAG));

    let key_line = key_lines.find(|attrs| KEY_URI_REGEX.is_match(attrs));

    if let Some(attrs) = key_line {
        if let Some(caps) = KEY_URI_REGEX.captures(attrs) {
            info.key_uri = caps[1].to_string();
        }
        if let Some(caps) = IV_REGEX.captures(attrs) {
            info.iv = caps[1].to_string();
        }
        if let Some(caps) = METHOD_REGEX.captures(attrs) {
            info.method = Some(caps[1].to_string());
        }
    } else if let Some(attrs) = text
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(KEY_TAG))
    {
        // e.g. METHOD=NONE with no URI
        info.method = METHOD_REGEX.captures(attrs).map(|caps| caps[1].to_string());
    }

    info
}
