//! Statistics generation from crawl database
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::crawler::PageKind;
use crate::state::PageState;
use crate::storage::Storage;
use crate::ScraperError;
use std::collections::HashMap;

/// How many extraction failures are listed in reports
pub const FAILURE_SAMPLE: usize = 20;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Run the product counts refer to
    pub run_id: Option<i64>,

    /// Total number of pages registered
    pub total_pages: u64,

    /// Count of pages by kind
    pub pages_by_kind: HashMap<PageKind, u64>,

    /// Count of pages by state
    pub pages_by_state: HashMap<PageState, u64>,

    /// Records stored by the run
    pub products_stored: u64,

    /// Distinct retailer skus among stored records
    pub distinct_retailer_skus: u64,

    /// Sku entries across stored records
    pub sku_entries: u64,

    /// Error summary (error states and their counts)
    pub error_summary: HashMap<PageState, u64>,

    /// First extraction failures, (url, reason)
    pub extraction_failures: Vec<(String, String)>,
}

/// Loads statistics from storage for the latest run
pub fn load_statistics(storage: &dyn Storage) -> Result<CrawlStatistics, ScraperError> {
    let run_id = storage.get_latest_run()?.map(|run| run.id);

    let mut pages_by_state = HashMap::new();
    for state in PageState::all_states() {
        let count = storage.count_pages_by_state(state)?;
        if count > 0 {
            pages_by_state.insert(state, count);
        }
    }

    let mut pages_by_kind = HashMap::new();
    for kind in [PageKind::Listing, PageKind::Product] {
        pages_by_kind.insert(kind, storage.count_pages_by_kind(kind)?);
    }

    let (products_stored, distinct_retailer_skus, sku_entries) = match run_id {
        Some(id) => (
            storage.count_products(id)?,
            storage.count_distinct_retailer_skus(id)?,
            storage.count_skus(id)?,
        ),
        None => (0, 0, 0),
    };

    Ok(CrawlStatistics {
        run_id,
        total_pages: storage.count_total_pages()?,
        pages_by_kind,
        pages_by_state,
        products_stored,
        distinct_retailer_skus,
        sku_entries,
        error_summary: storage.get_error_summary()?,
        extraction_failures: storage.get_extraction_failures(FAILURE_SAMPLE)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    if let Some(run_id) = stats.run_id {
        println!("  Run: #{}", run_id);
    }
    println!("  Total pages registered: {}", stats.total_pages);
    for kind in [PageKind::Listing, PageKind::Product] {
        println!(
            "  {} pages: {}",
            kind,
            stats.pages_by_kind.get(&kind).copied().unwrap_or(0)
        );
    }
    println!("  Products stored: {}", stats.products_stored);
    println!("  Distinct retailer skus: {}", stats.distinct_retailer_skus);
    println!("  Sku entries: {}", stats.sku_entries);
    println!();

    println!("Pages by State:");
    let mut state_counts: Vec<_> = stats.pages_by_state.iter().collect();
    state_counts.sort_by(|a, b| b.1.cmp(a.1));

    for (state, count) in state_counts {
        let percentage = if stats.total_pages > 0 {
            (*count as f64 / stats.total_pages as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", state, count, percentage);
    }
    println!();

    if !stats.extraction_failures.is_empty() {
        println!("Extraction Failures (first {}):", FAILURE_SAMPLE);
        for (url, reason) in &stats.extraction_failures {
            println!("  - {}: {}", url, reason);
        }
        println!();
    }

    let extracted = stats
        .pages_by_state
        .get(&PageState::Extracted)
        .copied()
        .unwrap_or(0);
    let products = stats
        .pages_by_kind
        .get(&PageKind::Product)
        .copied()
        .unwrap_or(0);
    let rate = if products > 0 {
        extracted as f64 / products as f64 * 100.0
    } else {
        0.0
    };
    println!(
        "Extraction Rate: {:.1}% ({} / {} product pages)",
        rate, extracted, products
    );
}
