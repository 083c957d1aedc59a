use crate::extract::SkuMode;
use serde::Deserialize;

/// Main configuration structure for the scraper
///
/// Built once at startup and handed to the crawl driver; nothing mutates it
/// afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Target site description: where to start and which hosts are in bounds
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Short name used in logs and summaries
    pub name: String,

    /// Domains the crawl may visit (subdomains included)
    pub allowed_domains: Vec<String>,

    /// Listing URL template; `{}` is replaced by a category id or name
    pub start_url_template: String,

    /// Numeric categories are seeded for every id in `1..category_id`
    pub category_id: u32,

    /// Named categories seeded after the numeric ones
    pub category_names: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "encuentro".to_string(),
            allowed_domains: vec!["encuentromoda.com".to_string()],
            start_url_template: "https://www.encuentromoda.com/on/demandware.store/Sites-emo_pen-Site/es/Search-UpdateGrid?cgid=0{}&start=0&sz=500".to_string(),
            category_id: 109,
            category_names: vec![
                "BIENESTAR".to_string(),
                "BÁSICOS".to_string(),
                "NOVEDADES".to_string(),
            ],
        }
    }
}

impl SiteConfig {
    /// Expands the start template into the seed listing URLs
    ///
    /// Numeric ids come first, in ascending order, followed by the named
    /// categories in configuration order.
    pub fn seed_urls(&self) -> Vec<String> {
        (1..self.category_id)
            .map(|id| id.to_string())
            .chain(self.category_names.iter().cloned())
            .map(|key| self.start_url_template.replace("{}", &key))
            .collect()
    }
}

/// Link-following rules applied to listing pages
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RulesConfig {
    /// Region selector for listing navigation links (followed, no callback)
    pub listings_css: String,

    /// Region selector for product tiles (extracted, not followed further)
    pub products_css: String,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            listings_css: "li.dropdown-item.dropdown a".to_string(),
            products_css: ".carousel-item a".to_string(),
        }
    }
}

/// Record extraction options
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtractionConfig {
    pub sku_mode: SkuMode,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of requests in flight at once
    pub max_concurrent_requests: u32,

    /// Minimum time between request dispatches (milliseconds)
    pub download_delay: u64,

    /// Per-request timeout (seconds)
    pub request_timeout: u64,

    /// How many times a 5xx or timed-out request is re-queued
    pub max_retries: u32,

    /// Whether robots.txt is fetched and honored
    pub obey_robots_txt: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 8,
            download_delay: 0,
            request_timeout: 30,
            max_retries: 2,
            obey_robots_txt: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path of the exported product records
    #[serde(rename = "records-path")]
    pub records_path: String,

    /// Serialization of the records file
    #[serde(default)]
    pub format: RecordFormat,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

/// Serialization format of the records file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// One JSON object per line
    #[default]
    Jsonl,
    /// A single JSON array
    Json,
}
