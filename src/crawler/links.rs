//! Link discovery on listing pages
//!
//! Each rule names a CSS region; every `<a href>` or `<area href>` inside a
//! matched region (or the region element itself, when it is one) becomes a
//! link of the rule's [`PageKind`]. Rules are tried in order and the first
//! rule to claim a URL decides its kind.

use crate::config::{validate_selector, RulesConfig};
use crate::crawler::PageKind;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// File extensions never worth requesting from a catalog crawl
const IGNORED_EXTENSIONS: &[&str] = &[
    "7z", "avi", "bmp", "css", "csv", "doc", "docx", "exe", "gif", "gz", "ico", "jpeg", "jpg",
    "js", "mov", "mp3", "mp4", "pdf", "png", "ppt", "pptx", "rar", "svg", "tar", "tif", "tiff",
    "wav", "webm", "webp", "xls", "xlsx", "zip",
];

/// A compiled region selector and the kind of page its links lead to
#[derive(Debug)]
pub struct LinkRule {
    selector: Selector,
    kind: PageKind,
}

impl LinkRule {
    pub fn new(css: &str, kind: PageKind) -> Result<Self, ConfigError> {
        Ok(Self {
            selector: validate_selector(css)?,
            kind,
        })
    }
}

/// A link found on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLink {
    pub url: String,
    pub kind: PageKind,
}

/// Ordered list of link rules applied to listing pages
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<LinkRule>,
}

impl RuleSet {
    /// Builds the listing rule followed by the product rule
    pub fn from_config(config: &RulesConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            rules: vec![
                LinkRule::new(&config.listings_css, PageKind::Listing)?,
                LinkRule::new(&config.products_css, PageKind::Product)?,
            ],
        })
    }

    /// Finds the links on a listing page, deduplicated within the page
    ///
    /// Links are absolute, in document order per rule, and may still point
    /// off-site; the caller applies the domain filter.
    pub fn discover(&self, document: &Html, base_url: &Url) -> Vec<DiscoveredLink> {
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for rule in &self.rules {
            for region in document.select(&rule.selector) {
                for url in region_links(region, base_url) {
                    if seen.insert(url.clone()) {
                        links.push(DiscoveredLink {
                            url,
                            kind: rule.kind,
                        });
                    }
                }
            }
        }

        links
    }

    /// Parses raw HTML and discovers its links
    pub fn discover_html(&self, html: &str, base_url: &Url) -> Vec<DiscoveredLink> {
        let document = Html::parse_document(html);
        self.discover(&document, base_url)
    }
}

/// Anchors inside a region, including the region element itself
fn region_links(region: ElementRef<'_>, base_url: &Url) -> Vec<String> {
    region
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| matches!(element.value().name(), "a" | "area"))
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only anchors
/// - non-HTTP(S) URLs after resolution
/// - links to binary or static assets
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    if has_ignored_extension(&absolute_url) {
        return None;
    }

    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}

fn has_ignored_extension(url: &Url) -> bool {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|last| last.rsplit_once('.'))
        .map(|(_, ext)| IGNORED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
