use std::time::Duration;

pub mod manager;
pub mod scrapers;

pub use manager::{DuplicatePolicy, PassReport, PipelineOptions, ScraperManager};
pub use scrapers::{Scraper, TvbsScraper};

pub const DEFAULT_CRAWL_TIMEOUT: Duration = Duration::from_secs(30);

/// Where and how the crawler fetches pages.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub index_url: String,
    /// Per request timeout, applied to the index and to every detail page
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            index_url: TvbsScraper::BASE_URL.to_string(),
            timeout: DEFAULT_CRAWL_TIMEOUT,
            user_agent: concat!("zh/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

pub mod prelude {
    pub use super::scrapers::Scraper;
    pub use super::{CrawlConfig, DuplicatePolicy, PipelineOptions, ScraperManager};
    pub use zh_core::{Error, Result, ScrapedRecord};
}
