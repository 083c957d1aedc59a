/// Page state definitions for tracking crawl progress
///
/// Every URL the crawl registers moves through these states exactly once per run.
use std::fmt;

/// Represents the current state of a page in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// Page has been registered but not yet queued
    Discovered,

    /// Page is in the frontier waiting to be fetched
    Queued,

    /// Page is currently being fetched
    Fetching,

    // ===== Terminal Success States =====
    /// Listing page fetched and its links registered
    Crawled,

    /// Product page fetched and its record emitted
    Extracted,

    // ===== Terminal Error States =====
    /// Product page fetched but the record could not be built
    ExtractionFailed,

    /// URL disallowed by the site's robots.txt
    RobotsDenied,

    /// Page returned HTTP 404 or 410
    DeadLink,

    /// Page could not be reached (connection refused, DNS failure, timeout)
    Unreachable,

    /// Page returned HTTP 429
    RateLimited,

    /// Page fetch failed for other reasons (5xx, redirect loop, body error)
    Failed,

    /// Page Content-Type is not HTML
    ContentMismatch,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if this is an active state (page may still be processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Discovered | Self::Queued | Self::Fetching)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Crawled | Self::Extracted)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        self.is_terminal() && !self.is_success()
    }

    /// Converts the page state to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Crawled => "crawled",
            Self::Extracted => "extracted",
            Self::ExtractionFailed => "extraction_failed",
            Self::RobotsDenied => "robots_denied",
            Self::DeadLink => "dead_link",
            Self::Unreachable => "unreachable",
            Self::RateLimited => "rate_limited",
            Self::Failed => "failed",
            Self::ContentMismatch => "content_mismatch",
        }
    }

    /// Parses a page state from a database string representation
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn from_db_string(s: &str) -> Option<Self> {
        Self::all_states()
            .into_iter()
            .find(|state| state.to_db_string() == s)
    }

    /// Returns all possible page states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Discovered,
            Self::Queued,
            Self::Fetching,
            Self::Crawled,
            Self::Extracted,
            Self::ExtractionFailed,
            Self::RobotsDenied,
            Self::DeadLink,
            Self::Unreachable,
            Self::RateLimited,
            Self::Failed,
            Self::ContentMismatch,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
