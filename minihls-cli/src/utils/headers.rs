use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{info, warn};

/// Parse a header string in format "Name: Value" and add it to the HeaderMap
pub fn parse_and_add_header(headers: &mut HeaderMap, header_str: &str) {
    let Some((name, value)) = header_str.split_once(':') else {
        warn!(
            "Invalid header format: '{}'. Expected 'Name: Value'",
            header_str
        );
        return;
    };
    let name = name.trim();
    let value = value.trim();

    let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
        warn!("Invalid header name: '{}'", name);
        return;
    };

    let Ok(header_value) = HeaderValue::from_str(value) else {
        warn!("Invalid header value: '{}'", value);
        return;
    };

    info!("Adding header: {}: {}", name, value);
    // Repeated names are kept, e.g. several Cookie lines.
    headers.append(header_name, header_value);
}

/// Parse a collection of header strings and return a HeaderMap
pub fn parse_headers(header_strings: &[String]) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for header_str in header_strings {
        parse_and_add_header(&mut headers, header_str);
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headers() {
        let headers = parse_headers(&[
            "Referer: https://example.com/player".to_string(),
            "X-Token:abc:def".to_string(),
            "no colon here".to_string(),
            "Bad Name: value".to_string(),
        ]);

        assert_eq!(headers.len(), 2);
        assert_eq!(headers["referer"], "https://example.com/player");
        // Only the first colon separates name and value.
        assert_eq!(headers["x-token"], "abc:def");
    }
}
