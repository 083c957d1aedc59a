//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeout
//! - Sending the referring listing page as the `Referer` header
//! - Content-Type checking
//! - Error classification into page states

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::CrawlRequest;
use crate::state::PageState;
use reqwest::header::{CONTENT_TYPE, REFERER};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;

/// Maximum redirect hops before a fetch is abandoned
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
        /// Content-Type header value
        content_type: String,
        /// Page body content
        body: String,
    },

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch {
        status_code: u16,
        /// The actual Content-Type received
        content_type: String,
    },

    /// HTTP error that maps to a specific page state
    HttpError {
        status_code: u16,
        /// The page state this error maps to
        state: PageState,
        /// Whether another attempt may succeed
        retryable: bool,
    },

    /// Network error (connection refused, timeout, redirect loop, etc.)
    NetworkError {
        /// Error description
        error: String,
        /// The page state this error maps to
        state: PageState,
        /// Whether another attempt may succeed
        retryable: bool,
    },
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use encuentro_scraper::config::{CrawlerConfig, UserAgentConfig};
/// use encuentro_scraper::crawler::build_http_client;
///
/// let user_agent = UserAgentConfig {
///     crawler_name: "EncuentroBot".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&user_agent, &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one page
///
/// # Error Classification
///
/// | Condition | State | Retry |
/// |-----------|-------|-------|
/// | HTTP 404, 410 | DeadLink | no |
/// | HTTP 429 | RateLimited | no |
/// | HTTP 5xx | Failed | yes |
/// | Other non-2xx | Failed | no |
/// | Timeout | Unreachable | yes |
/// | Connection refused | Unreachable | no |
/// | Too many redirects | Failed | no |
/// | Non-HTML body | ContentMismatch | no |
pub async fn fetch_page(client: &Client, request: &CrawlRequest) -> FetchResult {
    let mut builder = client.get(request.url.clone());
    if let Some(referer) = &request.referer {
        builder = builder.header(REFERER, referer.as_str());
    }

    let response = match builder.send().await {
        Ok(response) => response,
        Err(e) => return classify_error(&e),
    };

    let status = response.status();
    let final_url = response.url().to_string();

    if !status.is_success() {
        let (state, retryable) = classify_status(status);
        return FetchResult::HttpError {
            status_code: status.as_u16(),
            state,
            retryable,
        };
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html(&content_type) {
        return FetchResult::ContentMismatch {
            status_code: status.as_u16(),
            content_type,
        };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        },
        Err(e) => FetchResult::NetworkError {
            error: e.to_string(),
            state: PageState::Failed,
            retryable: e.is_timeout(),
        },
    }
}

fn is_html(content_type: &str) -> bool {
    let lower = content_type.to_ascii_lowercase();
    lower.contains("text/html") || lower.contains("application/xhtml+xml")
}

fn classify_status(status: StatusCode) -> (PageState, bool) {
    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => (PageState::DeadLink, false),
        StatusCode::TOO_MANY_REQUESTS => (PageState::RateLimited, false),
        s if s.is_server_error() => (PageState::Failed, true),
        _ => (PageState::Failed, false),
    }
}

fn classify_error(e: &reqwest::Error) -> FetchResult {
    if e.is_timeout() {
        FetchResult::NetworkError {
            error: "Request timeout".to_string(),
            state: PageState::Unreachable,
            retryable: true,
        }
    } else if e.is_redirect() {
        FetchResult::NetworkError {
            error: format!("Redirect error: {}", e),
            state: PageState::Failed,
            retryable: false,
        }
    } else if e.is_connect() {
        FetchResult::NetworkError {
            error: "Connection refused".to_string(),
            state: PageState::Unreachable,
            retryable: false,
        }
    } else {
        FetchResult::NetworkError {
            error: e.to_string(),
            state: PageState::Failed,
            retryable: false,
        }
    }
}
