use crate::UrlError;
use url::Url;

/// Normalizes a URL so that equivalent links share one visited-set key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed (dot segments are resolved by the parser)
/// 2. Reject anything that is not http or https
/// 3. Collapse repeated slashes in the path
/// 4. Remove trailing slash (except for root /)
/// 5. Remove fragment (everything after #)
/// 6. Remove an empty query string (trailing ?)
///
/// Scheme, host and query parameters are otherwise kept as written, since
/// the site base URL from the configuration is compared as a prefix.
///
/// # Examples
///
/// ```
/// use sitelex::url::normalize_url;
///
/// let url = normalize_url("http://EXAMPLE.com/docs//page/#intro").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/docs/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let path = normalize_path(url.path());
    url.set_path(&path);
    url.set_fragment(None);

    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}

/// Collapses empty segments and drops the trailing slash
fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_scheme() {
        let result = normalize_url("http://example.com/page").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page");
    }

    #[test]
    fn test_remove_trailing_slash() {
        let result = normalize_url("https://example.com/page/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let result = normalize_url("https://example.com").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://example.com/page#section").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_query_is_kept() {
        let result = normalize_url("https://example.com/list/?page=2").unwrap();
        assert_eq!(result.as_str(), "https://example.com/list?page=2");
    }

    #[test]
    fn test_empty_query_is_dropped() {
        let result = normalize_url("https://example.com/list?").unwrap();
        assert_eq!(result.as_str(), "https://example.com/list");
    }

    #[test]
    fn test_dot_segments_and_slashes() {
        let result = normalize_url("https://example.com///a/../b/./c//d").unwrap();
        assert_eq!(result.as_str(), "https://example.com/b/c/d");
    }

    #[test]
    fn test_lowercase_host() {
        let result = normalize_url("https://EXAMPLE.COM/Page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/Page");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://example.com/page");
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_malformed_url() {
        assert!(matches!(
            normalize_url("not a url").unwrap_err(),
            UrlError::Parse(_)
        ));
    }
}
