//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Initializing storage and seeding or restoring the frontier
//! - Gating requests on robots.txt
//! - Fetching batches of pages concurrently
//! - Following listing links and extracting product pages
//! - Writing records and the final summary

use crate::config::Config;
use crate::crawler::links::RuleSet;
use crate::crawler::scheduler::{QueuedRequest, Scheduler};
use crate::crawler::{build_http_client, fetch_page, CrawlRequest, FetchResult, PageKind};
use crate::extract::{Extractor, PageSource};
use crate::output::{generate_markdown_summary, generate_summary, open_sink, RecordSink};
use crate::robots::RobotsCache;
use crate::state::PageState;
use crate::storage::{RunStatus, SqliteStorage, Storage, StorageResult};
use crate::url::{canonicalize_url, extract_domain, is_allowed_domain};
use crate::ScraperError;
use futures::future::join_all;
use reqwest::Client;
use scraper::Html;
use std::path::Path;
use std::time::{Duration, Instant};
use url::Url;

/// Counters for one invocation of the crawl loop
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    pub run_id: i64,
    pub resumed: bool,
    pub pages_fetched: u64,
    pub products_emitted: u64,
    pub extraction_failures: u64,
    pub robots_denied: u64,
    pub offsite_dropped: u64,
    pub elapsed: Duration,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    storage: SqliteStorage,
    scheduler: Scheduler,
    client: Client,
    extractor: Extractor,
    rules: RuleSet,
    robots: RobotsCache,
    sink: Box<dyn RecordSink>,
    run_id: i64,
    report: CrawlReport,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Resumes the latest run if it never finished, unless `fresh` is set.
    /// Otherwise starts a new run: previously registered pages are forgotten
    /// and the frontier is seeded from the site configuration.
    pub fn new(config: Config, fresh: bool, config_hash: &str) -> Result<Self, ScraperError> {
        let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

        let resumable = if fresh {
            None
        } else {
            storage
                .get_latest_run()?
                .filter(|run| run.status.is_resumable())
        };

        let resumed = resumable.is_some();
        let (run_id, frontier) = match resumable {
            Some(run) => {
                if run.config_hash != config_hash {
                    tracing::warn!(
                        "Configuration changed since run {} started; resuming anyway",
                        run.id
                    );
                }
                tracing::info!("Resuming interrupted run {}", run.id);
                storage.update_run_status(run.id, RunStatus::Running)?;
                (run.id, restore_frontier(&mut storage)?)
            }
            None => {
                storage.reset_crawl_state()?;
                let run_id = storage.create_run(config_hash)?;
                tracing::info!("Starting new run {}", run_id);
                (run_id, seed_frontier(&mut storage, &config, run_id)?)
            }
        };
        tracing::info!("{} requests in frontier", frontier.len());

        let client = build_http_client(&config.user_agent, &config.crawler)?;
        let extractor = Extractor::new(config.extraction.sku_mode)?;
        let rules = RuleSet::from_config(&config.rules)?;

        // The records file is rewritten on every start; a resumed run replays
        // what it already emitted so the file stays complete.
        let mut sink = open_sink(&config.output)?;
        if resumed {
            let previous = storage.get_products(run_id)?;
            tracing::info!("Replaying {} records from run {}", previous.len(), run_id);
            for record in &previous {
                sink.emit(record)?;
            }
        }

        let scheduler = Scheduler::new(&config.crawler, frontier);

        Ok(Self {
            config,
            storage,
            scheduler,
            client,
            extractor,
            rules,
            robots: RobotsCache::new(),
            sink,
            run_id,
            report: CrawlReport {
                run_id,
                resumed,
                ..CrawlReport::default()
            },
        })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// Runs the crawl loop until the frontier is exhausted
    pub async fn run(&mut self) -> Result<CrawlReport, ScraperError> {
        tracing::info!("Starting crawl run {}", self.run_id);
        let start_time = Instant::now();

        loop {
            let batch = self.scheduler.next_batch().await;
            if batch.is_empty() {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            }

            let mut dispatch = Vec::with_capacity(batch.len());
            for queued in batch {
                match self.admit(&queued).await {
                    Ok(true) => dispatch.push(queued),
                    Ok(false) => {}
                    Err(e) => tracing::error!("Error admitting {}: {}", queued.request.url, e),
                }
            }

            let results = join_all(
                dispatch
                    .iter()
                    .map(|queued| fetch_page(&self.client, &queued.request)),
            )
            .await;

            for (queued, result) in dispatch.iter().zip(results) {
                if let Err(e) = self.handle_result(queued, result) {
                    tracing::error!("Error processing {}: {}", queued.request.url, e);
                }

                self.report.pages_fetched += 1;
                if self.report.pages_fetched % 10 == 0 {
                    let rate =
                        self.report.pages_fetched as f64 / start_time.elapsed().as_secs_f64();
                    tracing::info!(
                        "Progress: {} pages fetched, {} products, {} in frontier, {:.2} pages/sec",
                        self.report.pages_fetched,
                        self.report.products_emitted,
                        self.scheduler.frontier_size(),
                        rate
                    );
                }
            }
        }

        self.sink.finish()?;
        self.storage.complete_run(self.run_id)?;

        self.report.elapsed = start_time.elapsed();
        tracing::info!(
            "Crawl completed: {} pages fetched, {} products emitted, {} extraction failures in {:?}",
            self.report.pages_fetched,
            self.report.products_emitted,
            self.report.extraction_failures,
            self.report.elapsed
        );
        tracing::info!(
            "robots.txt consulted for {} origins; final dispatch delay {:?}",
            self.robots.origin_count(),
            self.scheduler.delay()
        );

        Ok(self.report.clone())
    }

    /// Writes the markdown summary for the current run
    pub fn write_summary(&self) -> Result<(), ScraperError> {
        let summary = generate_summary(&self.storage)?;
        let path = Path::new(&self.config.output.summary_path);
        generate_markdown_summary(&summary, path)?;
        tracing::info!("Summary written to {}", path.display());
        Ok(())
    }

    /// Applies the robots.txt gate and marks the page as in flight
    ///
    /// Returns false when the page must not be fetched.
    async fn admit(&mut self, queued: &QueuedRequest) -> Result<bool, ScraperError> {
        let page_id = queued.page_id;

        if self.config.crawler.obey_robots_txt {
            let agent = self.config.user_agent.crawler_name.as_str();
            let (rules, fetched) = self.robots.rules_for(&self.client, &queued.request.url).await;
            let allowed = rules.is_allowed(queued.request.url.as_str(), agent);

            if fetched {
                if let Some(delay) = rules.crawl_delay(agent) {
                    self.scheduler.raise_delay(delay);
                }
            }

            if !allowed {
                tracing::info!("URL {} disallowed by robots.txt", queued.request.url);
                self.storage.remove_from_frontier(page_id)?;
                self.storage.update_page_state(
                    page_id,
                    PageState::RobotsDenied,
                    None,
                    None,
                    Some("Disallowed by robots.txt"),
                )?;
                self.report.robots_denied += 1;
                return Ok(false);
            }
        }

        self.storage.remove_from_frontier(page_id)?;
        self.storage
            .update_page_state(page_id, PageState::Fetching, None, None, None)?;
        Ok(true)
    }

    fn handle_result(
        &mut self,
        queued: &QueuedRequest,
        result: FetchResult,
    ) -> Result<(), ScraperError> {
        let page_id = queued.page_id;

        match result {
            FetchResult::Success {
                final_url,
                status_code,
                content_type,
                body,
            } => match queued.request.kind {
                PageKind::Listing => {
                    self.process_listing(page_id, &final_url, &body)?;
                    self.storage.update_page_state(
                        page_id,
                        PageState::Crawled,
                        Some(status_code),
                        Some(&content_type),
                        None,
                    )?;
                }
                PageKind::Product => {
                    let source = PageSource {
                        url: &final_url,
                        referer: queued.request.referer.as_deref(),
                    };
                    let (state, error) = self.process_product(&source, &body)?;
                    self.storage.update_page_state(
                        page_id,
                        state,
                        Some(status_code),
                        Some(&content_type),
                        error.as_deref(),
                    )?;
                }
            },
            FetchResult::ContentMismatch {
                status_code,
                content_type,
            } => {
                self.storage.update_page_state(
                    page_id,
                    PageState::ContentMismatch,
                    Some(status_code),
                    Some(&content_type),
                    Some(&format!("Expected HTML, got {}", content_type)),
                )?;
            }
            FetchResult::HttpError {
                status_code,
                state,
                retryable,
            } => {
                if retryable && self.retry(queued)? {
                    return Ok(());
                }
                tracing::debug!("{} returned HTTP {}", queued.request.url, status_code);
                self.storage.update_page_state(
                    page_id,
                    state,
                    Some(status_code),
                    None,
                    Some(&format!("HTTP {}", status_code)),
                )?;
            }
            FetchResult::NetworkError {
                error,
                state,
                retryable,
            } => {
                if retryable && self.retry(queued)? {
                    return Ok(());
                }
                tracing::warn!("Failed to fetch {}: {}", queued.request.url, error);
                self.storage
                    .update_page_state(page_id, state, None, None, Some(&error))?;
            }
        }

        Ok(())
    }

    /// Puts a page back in the frontier if it has retries left
    fn retry(&mut self, queued: &QueuedRequest) -> Result<bool, ScraperError> {
        let attempts = self.storage.increment_retry_count(queued.page_id)?;
        if attempts > self.config.crawler.max_retries {
            return Ok(false);
        }

        tracing::debug!(
            "Retrying {} (attempt {}/{})",
            queued.request.url,
            attempts,
            self.config.crawler.max_retries
        );
        self.storage
            .update_page_state(queued.page_id, PageState::Queued, None, None, None)?;
        self.storage.add_to_frontier(queued.page_id)?;
        self.scheduler.enqueue(queued.clone());
        Ok(true)
    }

    /// Registers the links of a listing page and queues the new ones
    fn process_listing(
        &mut self,
        page_id: i64,
        final_url: &str,
        body: &str,
    ) -> Result<(), ScraperError> {
        let base_url = Url::parse(final_url)?;
        let links = {
            let document = Html::parse_document(body);
            self.rules.discover(&document, &base_url)
        };

        let found = links.len();
        let mut queued = 0;

        for link in links {
            let canonical = match canonicalize_url(&link.url) {
                Ok(u) => u,
                Err(e) => {
                    tracing::debug!("Skipping link {}: {}", link.url, e);
                    continue;
                }
            };

            let onsite = extract_domain(&canonical)
                .is_some_and(|domain| is_allowed_domain(&domain, &self.config.site.allowed_domains));
            if !onsite {
                tracing::trace!("Dropping offsite link {}", link.url);
                self.report.offsite_dropped += 1;
                continue;
            }

            // Fetched as linked; the canonical form only decides duplicates
            let request = CrawlRequest::followed(Url::parse(&link.url)?, link.kind, final_url);
            if let Some(next) = register(&mut self.storage, self.run_id, request, &canonical)? {
                self.scheduler.enqueue(next);
                queued += 1;
            }
        }

        tracing::debug!(
            "Listing {} (page {}): {} links, {} newly queued",
            final_url,
            page_id,
            found,
            queued
        );
        Ok(())
    }

    /// Extracts and emits one product page
    ///
    /// Extraction errors are contained here: the page is reported as
    /// `ExtractionFailed` and the crawl goes on. Only output and storage
    /// failures are returned as errors.
    fn process_product(
        &mut self,
        source: &PageSource<'_>,
        body: &str,
    ) -> Result<(PageState, Option<String>), ScraperError> {
        match self.extractor.extract_html(body, source) {
            Ok(record) => {
                self.sink.emit(&record)?;
                self.storage.insert_product(self.run_id, &record)?;
                self.report.products_emitted += 1;
                tracing::debug!(
                    "Extracted {} ({} skus) from {}",
                    record.retailer_sku.as_deref().unwrap_or("-"),
                    record.skus.len(),
                    source.url
                );
                Ok((PageState::Extracted, None))
            }
            Err(e) => {
                tracing::warn!("Extraction failed for {}: {}", source.url, e);
                self.report.extraction_failures += 1;
                Ok((PageState::ExtractionFailed, Some(e.to_string())))
            }
        }
    }
}

/// Registers a request's page; returns it queued if its canonical URL is new
/// this run
fn register(
    storage: &mut SqliteStorage,
    run_id: i64,
    request: CrawlRequest,
    canonical: &Url,
) -> StorageResult<Option<QueuedRequest>> {
    let (page_id, inserted) = storage.insert_or_get_page(
        request.url.as_str(),
        canonical.as_str(),
        request.kind,
        request.referer.as_deref(),
        run_id,
    )?;

    if !inserted {
        return Ok(None);
    }

    storage.add_to_frontier(page_id)?;
    storage.update_page_state(page_id, PageState::Queued, None, None, None)?;
    Ok(Some(QueuedRequest { page_id, request }))
}

/// Seeds the frontier with the configured listing pages
fn seed_frontier(
    storage: &mut SqliteStorage,
    config: &Config,
    run_id: i64,
) -> Result<Vec<QueuedRequest>, ScraperError> {
    let mut frontier = Vec::new();

    for seed in config.site.seed_urls() {
        let canonical = canonicalize_url(&seed)?;
        let request = CrawlRequest::seed(Url::parse(&seed)?);
        if let Some(queued) = register(storage, run_id, request, &canonical)? {
            frontier.push(queued);
        }
    }

    tracing::info!("Seeded frontier with {} listing pages", frontier.len());
    Ok(frontier)
}

/// Rebuilds the frontier of an interrupted run
///
/// Pages that were in flight when the run stopped go back in the queue.
fn restore_frontier(storage: &mut SqliteStorage) -> Result<Vec<QueuedRequest>, ScraperError> {
    let interrupted = storage.get_interrupted_pages()?;
    if !interrupted.is_empty() {
        tracing::info!("Re-queueing {} interrupted pages", interrupted.len());
    }
    for page in interrupted {
        storage.update_page_state(page.id, PageState::Queued, None, None, None)?;
        storage.add_to_frontier(page.id)?;
    }

    let mut frontier = Vec::new();
    for page_id in storage.load_frontier()? {
        let page = storage.get_page(page_id)?;
        frontier.push(QueuedRequest {
            page_id,
            request: CrawlRequest {
                url: Url::parse(&page.url)?,
                kind: page.kind,
                referer: page.referer,
            },
        });
    }

    Ok(frontier)
}

/// Runs a complete crawl and writes the summary
pub async fn run_crawl(
    config: Config,
    fresh: bool,
    config_hash: &str,
) -> Result<CrawlReport, ScraperError> {
    let mut coordinator = Coordinator::new(config, fresh, config_hash)?;
    let report = coordinator.run().await?;
    coordinator.write_summary()?;
    Ok(report)
}
