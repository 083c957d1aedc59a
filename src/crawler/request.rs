//! Crawl requests and page kinds

use std::fmt;
use url::Url;

/// What a page is fetched for
///
/// The kind is decided by the rule that discovered the link and never
/// changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    /// Category grid page; scanned for links, never extracted
    Listing,

    /// Product detail page; extracted, never scanned for links
    Product,
}

impl PageKind {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::Product => "product",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "listing" => Some(Self::Listing),
            "product" => Some(Self::Product),
            _ => None,
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// A single page fetch, carrying the page that linked to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    pub url: Url,
    pub kind: PageKind,

    /// URL of the listing page this link was found on; `None` for seeds
    pub referer: Option<String>,
}

impl CrawlRequest {
    /// A seed request: a listing page with no referrer
    pub fn seed(url: Url) -> Self {
        Self {
            url,
            kind: PageKind::Listing,
            referer: None,
        }
    }

    /// A request for a link found on `referer`
    pub fn followed(url: Url, kind: PageKind, referer: &str) -> Self {
        Self {
            url,
            kind,
            referer: Some(referer.to_string()),
        }
    }
}
