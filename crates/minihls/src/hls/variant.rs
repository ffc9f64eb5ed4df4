// Variant selection: picks the highest quality stream listed in a master playlist.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::hls::HlsError;

// The leading separator keeps AVERAGE-BANDWIDTH from being counted as a second marker.
static BANDWIDTH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[:,])BANDWIDTH=(\d+)").unwrap());
static RESOLUTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[:,])RESOLUTION=(\d+)x(\d+)").unwrap());

const I_FRAME_TAG: &str = "#EXT-X-I-FRAME-STREAM-INF";
const BOM: char = '\u{feff}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityMetric {
    /// Bits per second
    Bandwidth(u64),
    Resolution { width: u64, height: u64 },
}

impl QualityMetric {
    /// Comparable value: the bandwidth, or the pixel area of a resolution.
    pub fn value(&self) -> u64 {
        match *self {
            QualityMetric::Bandwidth(bandwidth) => bandwidth,
            QualityMetric::Resolution { width, height } => width.saturating_mul(height),
        }
    }
}

impl PartialOrd for QualityMetric {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QualityMetric {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value().cmp(&other.value())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// None when the master playlist carries no quality markers at all
    pub metric: Option<QualityMetric>,
    pub uri: String,
}

/// True if the text lists variant streams.
pub fn is_master_playlist(text: &str) -> bool {
    text.contains("#EXT-X-STREAM-INF")
}

/// Drop a leading UTF-8 byte order mark.
pub(crate) fn strip_bom(text: &str) -> &str {
    text.strip_prefix(BOM).unwrap_or(text)
}

/// Non-blank lines that are not tags or comments, in order.
pub(crate) fn uri_lines(text: &str) -> impl Iterator<Item = &str> {
    strip_bom(text)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

fn parse_number(raw: &str, what: &str) -> Result<u64, HlsError> {
    raw.parse::<u64>()
        .map_err(|e| HlsError::Parse(format!("invalid {what} value '{raw}': {e}")))
}

/// Lines that may carry variant markers. I-frame entries declare their URI
/// inside the tag and have no URI line to pair with.
fn marker_lines(text: &str) -> impl Iterator<Item = &str> {
    strip_bom(text)
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with(I_FRAME_TAG))
}

/// Collect quality markers: bandwidth when any are present, resolution otherwise.
fn quality_markers(text: &str) -> Result<Vec<QualityMetric>, HlsError> {
    let bandwidths = marker_lines(text)
        .flat_map(|line| BANDWIDTH_REGEX.captures_iter(line))
        .map(|caps| parse_number(&caps[1], "BANDWIDTH").map(QualityMetric::Bandwidth))
        .collect::<Result<Vec<_>, _>>()?;
    if !bandwidths.is_empty() {
        return Ok(bandwidths);
    }

    marker_lines(text)
        .flat_map(|line| RESOLUTION_REGEX.captures_iter(line))
        .map(|caps| {
            let width = parse_number(&caps[1], "RESOLUTION width")?;
            let height = parse_number(&caps[2], "RESOLUTION height")?;
            width.checked_mul(height).ok_or_else(|| {
                HlsError::Parse(format!("RESOLUTION {width}x{height} is out of range"))
            })?;
            Ok(QualityMetric::Resolution { width, height })
        })
        .collect()
}

/// Select the variant with the highest quality metric. The first of several
/// equal maxima wins. Without any markers the first URI line is chosen.
pub fn select_variant(text: &str) -> Result<Variant, HlsError> {
    let markers = quality_markers(text)?;
    let uris: Vec<&str> = uri_lines(text).collect();

    if uris.is_empty() {
        return Err(HlsError::Parse(if markers.is_empty() {
            "master playlist has no quality markers and no URIs".to_string()
        } else {
            "master playlist has quality markers but no URIs".to_string()
        }));
    }

    let mut best: Option<(usize, QualityMetric)> = None;
    for (index, metric) in markers.iter().enumerate() {
        match best {
            Some((_, current)) if *metric <= current => {}
            _ => best = Some((index, *metric)),
        }
    }

    let (index, metric) = match best {
        Some((index, metric)) => (index, Some(metric)),
        None => (0, None),
    };

    let uri = uris.get(index).ok_or_else(|| {
        HlsError::Parse(format!(
            "quality marker #{index} has no matching URI line ({} URIs listed)",
            uris.len()
        ))
    })?;

    debug!(index, ?metric, uri, "Selected variant");
    Ok(Variant {
        metric,
        uri: (*uri).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highest_bandwidth_wins() {
        let text = "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1000\nlow.m3u8\n#EXT-X-STREAM-INF:BANDWIDTH=5000\nhigh.m3u8\n";
        let variant = select_variant(text).unwrap();
        assert_eq!(variant.uri, "high.m3u8");
        assert_eq!(variant.metric, Some(QualityMetric::Bandwidth(5000)));
    }

    #[test]
    fn test_bandwidth_tie_keeps_first() {
        let text = "#EXTM3U\n\
            #EXT-X-STREAM-INF:BANDWIDTH=800000\na.m3u8\n\
            #EXT-X-STREAM-INF:BANDWIDTH=2400000\nb.m3u8\n\
            #EXT-X-STREAM-INF:BANDWIDTH=2400000\nc.m3u8\n\
            #EXT-X-STREAM-INF:BANDWIDTH=1200000\nd.m3u8\n";
        assert_eq!(select_variant(text).unwrap().uri, "b.m3u8");
    }

    #[test]
    fn test_average_bandwidth_is_not_a_marker() {
        let text = "#EXTM3U\n\
            #EXT-X-STREAM-INF:AVERAGE-BANDWIDTH=9000000,BANDWIDTH=1000\nlow.m3u8\n\
            #EXT-X-STREAM-INF:AVERAGE-BANDWIDTH=100,BANDWIDTH=2000\nhigh.m3u8\n";
        assert_eq!(select_variant(text).unwrap().uri, "high.m3u8");
    }

    #[test]
    fn test_resolution_fallback_uses_pixel_area() {
        let text = "#EXTM3U\n\
            #EXT-X-STREAM-INF:RESOLUTION=1280x720\nhd.m3u8\n\
            #EXT-X-STREAM-INF:RESOLUTION=1920x1080\nfhd.m3u8\n\
            #EXT-X-STREAM-INF:RESOLUTION=640x360\nsd.m3u8\n";
        let variant = select_variant(text).unwrap();
        assert_eq!(variant.uri, "fhd.m3u8");
        assert_eq!(variant.metric.unwrap().value(), 1920 * 1080);
    }

    #[test]
    fn test_bandwidth_preferred_over_resolution() {
        let text = "#EXTM3U\n\
            #EXT-X-STREAM-INF:BANDWIDTH=3000,RESOLUTION=640x360\na.m3u8\n\
            #EXT-X-STREAM-INF:BANDWIDTH=1000,RESOLUTION=1920x1080\nb.m3u8\n";
        assert_eq!(select_variant(text).unwrap().uri, "a.m3u8");
    }

    #[test]
    fn test_no_markers_picks_first_uri() {
        let variant = select_variant("#EXTM3U\nonly.m3u8\nother.m3u8\n").unwrap();
        assert_eq!(variant.uri, "only.m3u8");
        assert!(variant.metric.is_none());
    }

    #[test]
    fn test_empty_master_is_parse_error() {
        let err = select_variant("#EXTM3U\n\n").unwrap_err();
        assert!(matches!(err, HlsError::Parse(_)));
    }

    #[test]
    fn test_overflowing_bandwidth_is_parse_error() {
        let text = "#EXT-X-STREAM-INF:BANDWIDTH=99999999999999999999999\nx.m3u8\n";
        assert!(matches!(select_variant(text), Err(HlsError::Parse(_))));
    }

    #[test]
    fn test_more_markers_than_uris_is_parse_error() {
        let text = "#EXT-X-STREAM-INF:BANDWIDTH=1\na.m3u8\n#EXT-X-STREAM-INF:BANDWIDTH=2\n";
        assert!(matches!(select_variant(text), Err(HlsError::Parse(_))));
    }

    #[test]
    fn test_byte_order_mark_is_not_a_uri() {
        let text = "\u{feff}#EXTM3U\n\
            #EXT-X-STREAM-INF:BANDWIDTH=1000\nlow.m3u8\n\
            #EXT-X-STREAM-INF:BANDWIDTH=5000\nhigh.m3u8\n";
        let variant = select_variant(text).unwrap();
        assert_eq!(variant.uri, "high.m3u8");
        assert_eq!(variant.metric, Some(QualityMetric::Bandwidth(5000)));
    }

    #[test]
    fn test_i_frame_entries_are_skipped() {
        let text = "#EXTM3U\n\
            #EXT-X-I-FRAME-STREAM-INF:BANDWIDTH=90000,RESOLUTION=3840x2160,URI=\"iframe.m3u8\"\n\
            #EXT-X-STREAM-INF:BANDWIDTH=1000,RESOLUTION=640x360\nlow.m3u8\n\
            #EXT-X-STREAM-INF:BANDWIDTH=5000,RESOLUTION=1920x1080\nhigh.m3u8\n\
            #EXT-X-I-FRAME-STREAM-INF:BANDWIDTH=20000,URI=\"iframe-low.m3u8\"\n";
        let variant = select_variant(text).unwrap();
        assert_eq!(variant.uri, "high.m3u8");
        assert_eq!(variant.metric, Some(QualityMetric::Bandwidth(5000)));
    }

    #[test]
    fn test_master_detection() {
        assert!(is_master_playlist("#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1\na.m3u8"));
        assert!(!is_master_playlist("#EXTM3U\n#EXTINF:4.0,\nseg0.ts"));
    }
}
