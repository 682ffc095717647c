//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured identity (user agent, referrer)
//! - Courtesy delay before each request
//! - Redirect handling
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, REFERER};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Maximum redirect hops followed for one request
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value (empty if the server sent none)
        content_type: String,
        /// Page body content
        body: String,
    },

    /// Server answered with a status of 400 or above
    HttpError { status_code: u16 },

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch { content_type: String },

    /// Network error (connection refused, timeout, body read failure, etc.)
    NetworkError { error: String, timed_out: bool },
}

impl FetchResult {
    /// Short human-readable reason for a failed fetch
    pub fn describe(&self) -> String {
        match self {
            Self::Success { status_code, .. } => format!("HTTP {}", status_code),
            Self::HttpError { status_code } => format!("HTTP {}", status_code),
            Self::ContentMismatch { content_type } => {
                format!("unsupported content type '{}'", content_type)
            }
            Self::NetworkError { error, timed_out: true } => format!("timed out: {}", error),
            Self::NetworkError { error, .. } => error.clone(),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use sitelex::config::UserAgentConfig;
/// use sitelex::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "SitelexBot".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
///     referrer: None,
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    if let Some(referrer) = &config.referrer {
        match HeaderValue::from_str(referrer) {
            Ok(value) => {
                headers.insert(REFERER, value);
            }
            Err(e) => tracing::warn!("Ignoring referrer '{}': {}", referrer, e),
        }
    }

    Client::builder()
        .user_agent(config.header_value())
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages on behalf of every site crawl of a run
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    request_delay: Duration,
}

impl HttpFetcher {
    pub fn new(user_agent: &UserAgentConfig, crawler: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(
            user_agent,
            Duration::from_millis(crawler.request_timeout_ms),
        )?;
        Ok(Self {
            client,
            request_delay: Duration::from_millis(crawler.request_delay_ms),
        })
    }

    /// Fetches a URL and classifies the outcome
    ///
    /// A response without a Content-Type header is treated as HTML.
    pub async fn fetch(&self, url: &Url) -> FetchResult {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return network_error(e),
        };

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return FetchResult::HttpError {
                status_code: status.as_u16(),
            };
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html(&content_type) {
            return FetchResult::ContentMismatch { content_type };
        }

        let final_url = response.url().to_string();
        match response.text().await {
            Ok(body) => FetchResult::Success {
                final_url,
                status_code: status.as_u16(),
                content_type,
                body,
            },
            Err(e) => network_error(e),
        }
    }
}

fn is_html(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.is_empty()
        || content_type.contains("text/html")
        || content_type.contains("application/xhtml+xml")
}

fn network_error(e: reqwest::Error) -> FetchResult {
    let error = if e.is_connect() {
        "Connection refused".to_string()
    } else if e.is_redirect() {
        "Too many redirects".to_string()
    } else {
        e.to_string()
    };
    FetchResult::NetworkError {
        error,
        timed_out: e.is_timeout(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn user_agent() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
            referrer: Some("https://referrer.example".to_string()),
        }
    }

    fn fetcher() -> HttpFetcher {
        let crawler = CrawlerConfig {
            request_delay_ms: 0,
            request_timeout_ms: 500,
            ..CrawlerConfig::default()
        };
        HttpFetcher::new(&user_agent(), &crawler).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_html_sends_identity_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(header(
                "user-agent",
                "TestCrawler/1.0 (+https://example.com/about; admin@example.com)",
            ))
            .and(header("referer", "https://referrer.example"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<p>hi</p>", "text/html"))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/", server.uri())).unwrap();
        match fetcher().fetch(&url).await {
            FetchResult::Success {
                status_code, body, ..
            } => {
                assert_eq!(status_code, 200);
                assert_eq!(body, "<p>hi</p>");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let result = fetcher().fetch(&url).await;
        assert!(matches!(result, FetchResult::HttpError { status_code: 404 }));
        assert_eq!(result.describe(), "HTTP 404");
    }

    #[tokio::test]
    async fn test_fetch_non_html_is_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/data", server.uri())).unwrap();
        assert!(matches!(
            fetcher().fetch(&url).await,
            FetchResult::ContentMismatch { .. }
        ));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<p>slow</p>", "text/html")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/slow", server.uri())).unwrap();
        assert!(matches!(
            fetcher().fetch(&url).await,
            FetchResult::NetworkError { timed_out: true, .. }
        ));
    }

    #[test]
    fn test_is_html() {
        assert!(is_html("text/html; charset=utf-8"));
        assert!(is_html("TEXT/HTML"));
        assert!(is_html(""));
        assert!(!is_html("image/png"));
    }
}
