use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::config::ScrapeConfig;
use crate::detail::{ExtractError, Extraction, FinishRecord, extract_detail};
use crate::fetch::Fetch;
use crate::limiter::Limiter;
use crate::listing::{DetailLink, Listing, enumerate_page};
use crate::output::write_records;

const PROGRESS_EVERY: usize = 100;

/// Where a run is. Stages only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Idle,
    LaunchingEnumerators,
    CollectingLinks,
    LaunchingExtractors,
    CollectingRecords,
    Serialized,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub pages: usize,
    pub failed_pages: usize,
    pub links: usize,
    pub records: usize,
    pub degraded_records: usize,
}

#[derive(Debug)]
pub struct Crawl {
    pub records: Vec<FinishRecord>,
    pub summary: CrawlSummary,
}

// -------------------------
// Fan-out / fan-in
// -------------------------

/// Tasks of one stage, each owing exactly one message.
struct Batch<T> {
    rx: mpsc::Receiver<T>,
    expected: usize,
}

fn launch<I, T, F, Fut>(inputs: Vec<I>, task: F) -> Batch<T>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let expected = inputs.len();
    let (tx, rx) = mpsc::channel::<T>(expected.max(1));
    for input in inputs {
        let tx = tx.clone();
        let fut = task(input);
        tokio::spawn(async move {
            let out = fut.await;
            let _ = tx.send(out).await;
        });
    }
    Batch { rx, expected }
}

impl<T> Batch<T> {
    /// Reads exactly `expected` messages, in arrival order. Stops early only
    /// if every sender is gone, i.e. a task panicked.
    async fn collect(mut self, what: &'static str) -> Vec<T> {
        let mut out = Vec::with_capacity(self.expected);
        while out.len() < self.expected {
            match self.rx.recv().await {
                Some(v) => out.push(v),
                None => {
                    error!(
                        what,
                        received = out.len(),
                        expected = self.expected,
                        "tasks exited without reporting"
                    );
                    break;
                }
            }
            if out.len() % PROGRESS_EVERY == 0 {
                info!(what, done = out.len(), total = self.expected, "progress");
            }
        }
        out
    }
}

// -------------------------
// Orchestrator
// -------------------------

pub struct Pipeline {
    config: Arc<ScrapeConfig>,
    fetcher: Arc<dyn Fetch>,
    limiter: Limiter,
    stage: Stage,
}

impl Pipeline {
    pub fn new(config: ScrapeConfig, fetcher: Arc<dyn Fetch>) -> Self {
        let limiter = Limiter::new(config.parallelism);
        Self {
            config: Arc::new(config),
            fetcher,
            limiter,
            stage: Stage::Idle,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(next > self.stage, "{:?} -> {:?}", self.stage, next);
        info!(from = ?self.stage, to = ?next, "stage");
        self.stage = next;
    }

    /// Stage one: every listing page, flattened into detail links.
    pub async fn collect_links(&mut self) -> Vec<Listing> {
        self.advance(Stage::LaunchingEnumerators);
        let cfg = Arc::clone(&self.config);
        let fetcher = Arc::clone(&self.fetcher);
        let limiter = self.limiter.clone();
        let batch = launch(self.config.page_refs(), move |page| {
            let cfg = Arc::clone(&cfg);
            let fetcher = Arc::clone(&fetcher);
            let limiter = limiter.clone();
            async move {
                match cfg.listing_url(page) {
                    Ok(url) => {
                        enumerate_page(fetcher.as_ref(), &limiter, &cfg.schema, page, &url).await
                    }
                    Err(e) => {
                        let msg = format!("{e:#}");
                        error!(page = page.0, error = %msg, "bad listing url");
                        Listing {
                            page,
                            links: Vec::new(),
                            error: Some(msg),
                        }
                    }
                }
            }
        });

        self.advance(Stage::CollectingLinks);
        batch.collect("listing pages").await
    }

    /// Stage two: one extraction per link, never fewer.
    pub async fn collect_records(&mut self, links: Vec<DetailLink>) -> Vec<Extraction> {
        self.advance(Stage::LaunchingExtractors);
        let cfg = Arc::clone(&self.config);
        let fetcher = Arc::clone(&self.fetcher);
        let limiter = self.limiter.clone();
        let batch = launch(links, move |link| {
            let cfg = Arc::clone(&cfg);
            let fetcher = Arc::clone(&fetcher);
            let limiter = limiter.clone();
            async move {
                match cfg.detail_url(link.as_str()) {
                    Ok(url) => extract_detail(fetcher.as_ref(), &limiter, &cfg.schema, &url).await,
                    Err(e) => {
                        let msg = format!("{e:#}");
                        error!(link = link.as_str(), error = %msg, "bad detail url");
                        Extraction::failed(link.0, ExtractError::Fetch(msg))
                    }
                }
            }
        });

        self.advance(Stage::CollectingRecords);
        batch.collect("detail pages").await
    }

    /// Both stages, without writing anything.
    pub async fn crawl(&mut self) -> Crawl {
        info!(
            pages = self.config.pages.clone().count(),
            parallelism = self.limiter.capacity(),
            "gathering target pages"
        );
        let listings = self.collect_links().await;

        let mut summary = CrawlSummary {
            pages: listings.len(),
            failed_pages: listings.iter().filter(|l| l.error.is_some()).count(),
            ..CrawlSummary::default()
        };
        let links: Vec<DetailLink> = listings.into_iter().flat_map(|l| l.links).collect();
        summary.links = links.len();
        info!(links = summary.links, failed_pages = summary.failed_pages, "number of target pages");

        let extractions = self.collect_records(links).await;
        summary.records = extractions.len();
        summary.degraded_records = extractions.iter().filter(|e| !e.is_complete()).count();
        let records = extractions.into_iter().map(|e| e.record).collect();

        Crawl { records, summary }
    }

    /// Writes the records to the configured file. Failures are logged only.
    pub async fn serialize(&mut self, crawl: &Crawl) {
        let path = self.config.output.clone();
        match write_records(&path, &crawl.records).await {
            Ok(()) => info!(path = %path.display(), records = crawl.records.len(), "results written"),
            Err(e) => {
                let msg = format!("{e:#}");
                error!(path = %path.display(), error = %msg, "couldn't write results");
            }
        }
        self.advance(Stage::Serialized);
    }

    /// Crawl, then serialize.
    pub async fn run(mut self) -> Crawl {
        let crawl = self.crawl().await;
        self.serialize(&crawl).await;
        info!(summary = ?crawl.summary, "done");
        crawl
    }
}
