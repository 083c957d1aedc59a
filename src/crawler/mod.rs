//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and error classification
//! - Link discovery on listing pages
//! - Request scheduling and pacing
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
pub mod links;
mod request;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator, CrawlReport};
pub use fetcher::{build_http_client, fetch_page, FetchResult};
pub use links::{DiscoveredLink, RuleSet};
pub use request::{CrawlRequest, PageKind};
pub use scheduler::{QueuedRequest, Scheduler};
