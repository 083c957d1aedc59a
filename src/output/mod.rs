//! Output module for product records and crawl reports
//!
//! This module handles:
//! - Writing emitted product records to the configured file sink
//! - Loading crawl statistics from storage
//! - Generating markdown summaries of crawl results

mod markdown;
mod sink;
pub mod stats;
mod traits;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use sink::{open_sink, JsonArraySink, JsonLinesSink};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
pub use traits::{CrawlSummary, OutputError, OutputResult, RecordSink};

use crate::crawler::PageKind;
use crate::storage::Storage;
use crate::ScraperError;
use chrono::{DateTime, Utc};

/// Generates a crawl summary for the latest run in storage
pub fn generate_summary(storage: &dyn Storage) -> Result<CrawlSummary, ScraperError> {
    let run = storage
        .get_latest_run()?
        .ok_or_else(|| ScraperError::Storage("No crawl runs found in database".to_string()))?;

    let duration_seconds = match (
        run.started_at.parse::<DateTime<Utc>>(),
        run.finished_at.as_deref().map(str::parse::<DateTime<Utc>>),
    ) {
        (Ok(started), Some(Ok(finished))) => Some((finished - started).num_seconds().max(0) as u64),
        _ => None,
    };

    let stats = stats::load_statistics(storage)?;
    let kind_count = |kind: PageKind| stats.pages_by_kind.get(&kind).copied().unwrap_or(0);

    Ok(CrawlSummary {
        run_id: run.id,
        started_at: run.started_at,
        finished_at: run.finished_at,
        duration_seconds,
        status: run.status.to_db_string().to_string(),
        config_hash: run.config_hash,
        total_pages: stats.total_pages,
        listing_pages: kind_count(PageKind::Listing),
        product_pages: kind_count(PageKind::Product),
        pages_by_state: stats.pages_by_state.clone(),
        products_stored: stats.products_stored,
        distinct_retailer_skus: stats.distinct_retailer_skus,
        sku_entries: stats.sku_entries,
        error_summary: stats.error_summary.clone(),
        extraction_failures: stats.extraction_failures.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;

    #[test]
    fn test_generate_summary_requires_a_run() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(
            generate_summary(&storage),
            Err(ScraperError::Storage(_))
        ));
    }

    #[test]
    fn test_generate_summary_for_completed_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("abc").unwrap();
        storage
            .insert_or_get_page(
                "https://example.com/grid",
                "https://example.com/grid",
                PageKind::Listing,
                None,
                run_id,
            )
            .unwrap();
        storage.complete_run(run_id).unwrap();

        let summary = generate_summary(&storage).unwrap();
        assert_eq!(summary.run_id, run_id);
        assert_eq!(summary.status, "completed");
        assert_eq!(summary.config_hash, "abc");
        assert_eq!(summary.listing_pages, 1);
        assert!(summary.duration_seconds.is_some());
    }
}
