use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use std::collections::HashSet;
use tracing::{debug, info};
use url::Url;
use zh_core::{Error, Result, ScrapedRecord};

use super::utils::{normalize_whitespace, own_text, parse_url, select_text, selector};
use super::Scraper;
use crate::CrawlConfig;

/// Scraper for the TVBS politics listing and its article pages.
pub struct TvbsScraper {
    client: Client,
    index_url: Url,
}

impl TvbsScraper {
    pub const BASE_URL: &'static str = "https://news.tvbs.com.tw/politics";

    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            index_url: parse_url(&config.index_url)?,
        })
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("{}: HTTP {}", url, status)));
        }

        response
            .text()
            .await
            .map_err(|e| Error::Fetch(format!("{}: {}", url, e)))
    }

    /// Pick article links out of the first `limit` entries of the index page.
    ///
    /// Every listed entry spends one unit of budget. Entries without a usable
    /// `href` and links already scheduled spend it without adding a visit.
    pub fn parse_index(&self, html: &str, limit: usize) -> Result<Vec<String>> {
        let document = Html::parse_document(html);
        let container = selector("div.news_now2")?;
        let entry = selector(".list ul li")?;
        let anchor = selector("a")?;

        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        let mut budget = limit;
        'containers: for block in document.select(&container) {
            for item in block.select(&entry) {
                if budget == 0 {
                    break 'containers;
                }
                budget -= 1;

                let Some(href) = item
                    .select(&anchor)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                else {
                    continue;
                };

                match self.index_url.join(href.trim()) {
                    Ok(url) => {
                        let url = url.to_string();
                        if seen.insert(url.clone()) {
                            urls.push(url);
                        }
                    }
                    Err(e) => debug!(%href, error = %e, "Skipping unresolvable link"),
                }
            }
        }

        Ok(urls)
    }

    /// Extract a record from an article page.
    ///
    /// The lead is the body's first paragraph; the rest is the text the body
    /// holds directly once its child elements are taken out. Missing elements
    /// leave the matching field empty.
    pub fn parse_article(&self, url: &str, html: &str) -> Result<ScrapedRecord> {
        let document = Html::parse_document(html);
        let article = selector("article")?;
        let title = selector("h1.title")?;
        let body = selector("div.article_content")?;
        let paragraph = selector("p")?;

        let root = document
            .select(&article)
            .next()
            .unwrap_or_else(|| document.root_element());

        let title = select_text(root, &title).trim().to_string();

        let content = match root.select(&body).next() {
            Some(body) => {
                let lead = body
                    .select(&paragraph)
                    .next()
                    .map(|p| p.text().collect::<String>())
                    .unwrap_or_default();
                let rest = own_text(body);
                normalize_whitespace(&lead) + &normalize_whitespace(&rest)
            }
            None => String::new(),
        };

        Ok(ScrapedRecord::new(url, title, content))
    }
}

#[async_trait]
impl Scraper for TvbsScraper {
    fn source(&self) -> &str {
        "TVBS"
    }

    async fn get_article_urls(&self, limit: usize) -> Result<Vec<String>> {
        info!(url = %self.index_url, "🔎 Visiting index");
        let html = self.fetch(self.index_url.as_str()).await?;
        let urls = self.parse_index(&html, limit)?;
        info!(count = urls.len(), limit, "Scheduled article visits");
        Ok(urls)
    }

    async fn scrape_article(&self, url: &str) -> Result<ScrapedRecord> {
        info!(%url, "📰 Scraping article");
        let html = self.fetch(url).await?;
        self.parse_article(url, &html)
    }
}
