//! Race-result scraper: walks a paginated results listing, follows every
//! detail link and writes one JSON record per finisher.
//!
//! Both crawl stages share a single [`Limiter`] so no more than
//! `parallelism` fetches are ever in flight.

pub mod config;
pub mod detail;
pub mod fetch;
pub mod limiter;
pub mod listing;
pub mod output;
pub mod pipeline;

pub use config::{PageSchema, ScrapeConfig};
pub use detail::{ExtractError, Extraction, Field, FinishRecord};
pub use fetch::{Fetch, HttpFetcher};
pub use limiter::{Limiter, Permit};
pub use listing::{DetailLink, Listing, PageRef};
pub use pipeline::{Crawl, CrawlSummary, Pipeline, Stage};
