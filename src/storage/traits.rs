//! Storage traits and error types

use crate::crawler::PageKind;
use crate::extract::ProductRecord;
use crate::state::PageState;
use crate::storage::{PageRecord, RunRecord, RunStatus};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the crawler.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run and returns its ID
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Updates the status of a run
    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Marks a run as completed with a finish timestamp
    fn complete_run(&mut self, run_id: i64) -> StorageResult<()>;

    /// Forgets every page and frontier entry, keeping runs and products
    ///
    /// Used when a fresh run starts so previously crawled pages are fetched again.
    fn reset_crawl_state(&mut self) -> StorageResult<()>;

    // ===== Page Management =====

    /// Inserts a new page or gets the existing page ID
    ///
    /// Pages are keyed by `canonical_url`. The URL, kind and referrer of an
    /// existing page are left untouched: the first discovery decides them.
    ///
    /// # Returns
    ///
    /// The page ID and whether the page was newly inserted
    fn insert_or_get_page(
        &mut self,
        url: &str,
        canonical_url: &str,
        kind: PageKind,
        referer: Option<&str>,
        discovered_run: i64,
    ) -> StorageResult<(i64, bool)>;

    /// Gets a page by ID
    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord>;

    /// Gets a page by the URL it is fetched from
    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>>;

    /// Moves a page to a new state, recording the visit
    fn update_page_state(
        &mut self,
        page_id: i64,
        state: PageState,
        status_code: Option<u16>,
        content_type: Option<&str>,
        error_message: Option<&str>,
    ) -> StorageResult<()>;

    /// Increments the retry count for a page and returns the new count
    fn increment_retry_count(&mut self, page_id: i64) -> StorageResult<u32>;

    /// Gets all pages in a specific state
    fn get_pages_by_state(&self, state: PageState) -> StorageResult<Vec<PageRecord>>;

    /// Gets pages that were being fetched (for crash recovery)
    fn get_interrupted_pages(&self) -> StorageResult<Vec<PageRecord>>;

    // ===== Frontier Management =====

    /// Appends a page to the crawl frontier
    fn add_to_frontier(&mut self, page_id: i64) -> StorageResult<()>;

    /// Removes a page from the frontier once it has been dispatched
    fn remove_from_frontier(&mut self, page_id: i64) -> StorageResult<()>;

    /// Loads the frontier page IDs in queue order
    fn load_frontier(&self) -> StorageResult<Vec<i64>>;

    /// Clears the frontier
    fn clear_frontier(&mut self) -> StorageResult<()>;

    // ===== Products =====

    /// Stores an emitted product record
    fn insert_product(&mut self, run_id: i64, record: &ProductRecord) -> StorageResult<i64>;

    /// Loads all product records emitted by a run, in emission order
    fn get_products(&self, run_id: i64) -> StorageResult<Vec<ProductRecord>>;

    /// Counts product records emitted by a run
    fn count_products(&self, run_id: i64) -> StorageResult<u64>;

    /// Counts distinct retailer skus among records emitted by a run
    fn count_distinct_retailer_skus(&self, run_id: i64) -> StorageResult<u64>;

    /// Counts sku entries across all records emitted by a run
    fn count_skus(&self, run_id: i64) -> StorageResult<u64>;

    // ===== Statistics =====

    /// Counts pages by state
    fn count_pages_by_state(&self, state: PageState) -> StorageResult<u64>;

    /// Counts pages by kind
    fn count_pages_by_kind(&self, kind: PageKind) -> StorageResult<u64>;

    /// Gets total page count
    fn count_total_pages(&self) -> StorageResult<u64>;

    /// Gets error summary (state -> count)
    fn get_error_summary(&self) -> StorageResult<HashMap<PageState, u64>>;

    /// Gets up to `limit` product pages that failed extraction, with the reason
    fn get_extraction_failures(&self, limit: usize) -> StorageResult<Vec<(String, String)>>;
}
