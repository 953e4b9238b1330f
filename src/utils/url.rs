// src/utils/url.rs

//! URL validation and inspection utilities.

use url::Url;

use crate::services::ExtractionError;

/// Parse a client-supplied source URL.
///
/// Accepts only absolute `http`/`https` URLs with a host.
///
/// # Examples
/// ```
/// use mediadrop::utils::url::parse_source_url;
///
/// assert!(parse_source_url("https://example.com/watch?v=1").is_ok());
/// assert!(parse_source_url("file:///etc/passwd").is_err());
/// ```
pub fn parse_source_url(raw: &str) -> Result<Url, ExtractionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::invalid_url(raw, "URL is empty"));
    }

    let url = Url::parse(trimmed).map_err(|e| ExtractionError::invalid_url(raw, e))?;
    check_source_url(&url)?;
    Ok(url)
}

/// Check an already parsed URL: `http`/`https` scheme and a non-empty host.
pub fn check_source_url(url: &Url) -> Result<(), ExtractionError> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ExtractionError::invalid_url(
            url.as_str(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ExtractionError::invalid_url(url.as_str(), "URL has no host"));
    }
    Ok(())
}

/// Extract the lowercase host from a URL, for log lines.
///
/// # Examples
/// ```
/// use mediadrop::utils::url::get_domain;
///
/// let url = url::Url::parse("https://Example.COM/path").unwrap();
/// assert_eq!(get_domain(&url), "example.com");
/// ```
pub fn get_domain(url: &Url) -> String {
    url.host_str().unwrap_or_default().to_lowercase()
}

/// Last non-empty path segment of a URL, percent-decoded.
pub fn last_path_segment(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()?;

    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    Some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_http_and_https() {
        assert!(parse_source_url("http://example.com/a").is_ok());
        assert!(parse_source_url("  https://example.com/video123  ").is_ok());
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        for raw in ["ftp://example.com/x", "file:///etc/passwd", "javascript:alert(1)"] {
            assert!(
                matches!(
                    parse_source_url(raw),
                    Err(ExtractionError::InvalidUrl { .. })
                ),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_relative_and_empty() {
        assert!(parse_source_url("").is_err());
        assert!(parse_source_url("example.com/video").is_err());
        assert!(parse_source_url("/video/123").is_err());
    }

    #[test]
    fn test_check_source_url() {
        assert!(check_source_url(&Url::parse("https://example.com/a").unwrap()).is_ok());
        for raw in ["ftp://example.com/a", "file:///tmp/clip.mp4", "data:text/plain,hi"] {
            let url = Url::parse(raw).unwrap();
            assert!(
                matches!(check_source_url(&url), Err(ExtractionError::InvalidUrl { .. })),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_get_domain() {
        let url = Url::parse("https://Sub.Example.com:8080/path").unwrap();
        assert_eq!(get_domain(&url), "sub.example.com");
    }

    #[test]
    fn test_last_path_segment() {
        let url = Url::parse("https://cdn.example.com/media/My%20Clip.mp4?sig=1").unwrap();
        assert_eq!(last_path_segment(&url), Some("My Clip.mp4".to_string()));

        let url = Url::parse("https://cdn.example.com/media/").unwrap();
        assert_eq!(last_path_segment(&url), Some("media".to_string()));

        let url = Url::parse("https://cdn.example.com/").unwrap();
        assert_eq!(last_path_segment(&url), None);
    }
}
