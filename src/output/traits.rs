//! Output traits and types
//!
//! This module defines the record sink interface and the data structure
//! behind crawl summaries.

use crate::extract::ProductRecord;
use crate::state::PageState;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Sink already finished")]
    Finished,

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for emitted product records
pub trait RecordSink: Send {
    /// Writes one record
    fn emit(&mut self, record: &ProductRecord) -> OutputResult<()>;

    /// Completes the output and flushes it; further emits fail
    fn finish(&mut self) -> OutputResult<()>;

    /// Number of records written so far
    fn records_written(&self) -> u64;
}

/// Summary statistics for a crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    // Run metadata
    pub run_id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub status: String,
    pub config_hash: String,

    // Pages
    pub total_pages: u64,
    pub listing_pages: u64,
    pub product_pages: u64,
    pub pages_by_state: HashMap<PageState, u64>,

    // Products
    pub products_stored: u64,
    pub distinct_retailer_skus: u64,
    pub sku_entries: u64,

    // Error summary (state -> count)
    pub error_summary: HashMap<PageState, u64>,

    /// First extraction failures, (url, reason)
    pub extraction_failures: Vec<(String, String)>,
}

impl CrawlSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for a state, zero when absent
    pub fn state_count(&self, state: PageState) -> u64 {
        self.pages_by_state.get(&state).copied().unwrap_or(0)
    }

    pub fn total_errors(&self) -> u64 {
        self.error_summary.values().sum()
    }

    /// Percentage of product pages that produced a record
    pub fn extraction_rate(&self) -> f64 {
        let attempted =
            self.state_count(PageState::Extracted) + self.state_count(PageState::ExtractionFailed);
        if attempted == 0 {
            0.0
        } else {
            self.state_count(PageState::Extracted) as f64 / attempted as f64 * 100.0
        }
    }

    /// Percentage of registered pages that ended in a success state
    pub fn success_rate(&self) -> f64 {
        if self.total_pages == 0 {
            return 0.0;
        }
        let succeeded =
            self.state_count(PageState::Crawled) + self.state_count(PageState::Extracted);
        succeeded as f64 / self.total_pages as f64 * 100.0
    }
}
