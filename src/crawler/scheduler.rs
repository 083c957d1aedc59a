//! Scheduler for the crawl frontier and request pacing
//!
//! The frontier is first-in first-out. Without a download delay the scheduler
//! hands out batches of up to `max-concurrent-requests` pages that are fetched
//! together; with a delay it hands out one page at a time, spaced at least
//! the delay apart.

use crate::config::CrawlerConfig;
use crate::crawler::CrawlRequest;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A request waiting in the frontier, tied to its database page row
#[derive(Debug, Clone)]
pub struct QueuedRequest {
    pub page_id: i64,
    pub request: CrawlRequest,
}

/// Frontier queue plus pacing state
#[derive(Debug)]
pub struct Scheduler {
    frontier: VecDeque<QueuedRequest>,
    batch_size: usize,
    delay: Duration,
    last_dispatch: Option<Instant>,
}

impl Scheduler {
    /// Creates a scheduler over an initial frontier (seeds, or a resumed queue)
    pub fn new(config: &CrawlerConfig, initial_frontier: Vec<QueuedRequest>) -> Self {
        Self {
            frontier: initial_frontier.into(),
            batch_size: config.max_concurrent_requests.max(1) as usize,
            delay: Duration::from_millis(config.download_delay),
            last_dispatch: None,
        }
    }

    /// Takes the next batch of requests to fetch
    ///
    /// Waits out the download delay first when one is set. Returns an empty
    /// batch once the frontier is exhausted.
    pub async fn next_batch(&mut self) -> Vec<QueuedRequest> {
        if self.frontier.is_empty() {
            return Vec::new();
        }

        let take = if self.delay.is_zero() {
            self.batch_size
        } else {
            if let Some(last) = self.last_dispatch {
                let ready_at = last + self.delay;
                let now = Instant::now();
                if ready_at > now {
                    tokio::time::sleep(ready_at - now).await;
                }
            }
            1
        };

        let count = take.min(self.frontier.len());
        let batch: Vec<QueuedRequest> = self.frontier.drain(..count).collect();
        self.last_dispatch = Some(Instant::now());

        tracing::trace!(
            "Dispatching {} request(s); {} left in frontier",
            batch.len(),
            self.frontier.len()
        );

        batch
    }

    /// Appends a request to the back of the frontier
    pub fn enqueue(&mut self, queued: QueuedRequest) {
        self.frontier.push_back(queued);
    }

    /// Raises the download delay, e.g. to honour a robots.txt Crawl-delay
    ///
    /// A smaller value than the current delay is ignored.
    pub fn raise_delay(&mut self, delay: Duration) {
        if delay > self.delay {
            tracing::info!("Download delay raised to {:?}", delay);
            self.delay = delay;
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn queued(page_id: i64) -> QueuedRequest {
        QueuedRequest {
            page_id,
            request: CrawlRequest::seed(
                Url::parse(&format!("https://example.com/grid?cgid=0{}", page_id)).unwrap(),
            ),
        }
    }

    fn config(max_concurrent_requests: u32, download_delay: u64) -> CrawlerConfig {
        CrawlerConfig {
            max_concurrent_requests,
            download_delay,
            ..CrawlerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_batches_respect_concurrency_limit() {
        let mut scheduler = Scheduler::new(&config(2, 0), (1..=5).map(queued).collect());

        assert_eq!(scheduler.next_batch().await.len(), 2);
        assert_eq!(scheduler.next_batch().await.len(), 2);
        assert_eq!(scheduler.next_batch().await.len(), 1);
        assert!(scheduler.next_batch().await.is_empty());
    }

    #[tokio::test]
    async fn test_frontier_is_fifo() {
        let mut scheduler = Scheduler::new(&config(8, 0), vec![queued(1)]);
        scheduler.enqueue(queued(2));
        scheduler.enqueue(queued(3));

        let ids: Vec<i64> = scheduler
            .next_batch()
            .await
            .iter()
            .map(|q| q.page_id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_delay_serializes_and_spaces_requests() {
        let mut scheduler = Scheduler::new(&config(8, 50), vec![queued(1), queued(2)]);

        let start = Instant::now();
        assert_eq!(scheduler.next_batch().await.len(), 1);
        assert_eq!(scheduler.next_batch().await.len(), 1);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_raise_delay_only_increases() {
        let mut scheduler = Scheduler::new(&config(8, 100), Vec::new());
        scheduler.raise_delay(Duration::from_millis(10));
        assert_eq!(scheduler.delay(), Duration::from_millis(100));
        scheduler.raise_delay(Duration::from_secs(2));
        assert_eq!(scheduler.delay(), Duration::from_secs(2));
        assert_eq!(scheduler.frontier_size(), 0);
    }
}
