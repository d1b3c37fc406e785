use async_trait::async_trait;
use tracing::{error, info, warn};
use zh_core::{Result, ScrapedRecord};

pub mod tvbs;

pub use tvbs::TvbsScraper;

#[async_trait]
pub trait Scraper: Send + Sync {
    /// Returns the name of the news source
    fn source(&self) -> &str;

    /// Visit the index page and return at most `limit` absolute article URLs,
    /// in listing order.
    async fn get_article_urls(&self, limit: usize) -> Result<Vec<String>>;

    /// Fetch one detail page and extract its title and body.
    async fn scrape_article(&self, url: &str) -> Result<ScrapedRecord>;

    /// Run both stages sequentially.
    ///
    /// A failed index fetch ends the crawl with no records. A failed detail
    /// fetch drops that one record and the crawl moves on.
    async fn crawl(&self, limit: usize) -> Vec<ScrapedRecord> {
        let urls = match self.get_article_urls(limit).await {
            Ok(urls) => urls,
            Err(e) => {
                error!(source = self.source(), error = %e, "❌ Index fetch failed, aborting crawl");
                return Vec::new();
            }
        };

        let mut records = Vec::with_capacity(urls.len());
        for url in urls {
            match self.scrape_article(&url).await {
                Ok(record) => {
                    if record.title.is_empty() || record.content.is_empty() {
                        warn!(%url, "Article extracted with empty title or content");
                    }
                    records.push(record);
                }
                Err(e) => error!(%url, error = %e, "❌ Failed to scrape article, skipping"),
            }
        }

        info!(source = self.source(), count = records.len(), "🦗 Crawl finished");
        records
    }
}

/// Common utilities for scrapers
pub mod utils {
    use scraper::{ElementRef, Selector};
    use url::Url;
    use zh_core::{Error, Result};

    pub fn parse_url(url: &str) -> Result<Url> {
        Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))
    }

    pub fn selector(css: &str) -> Result<Selector> {
        Selector::parse(css).map_err(|e| Error::Fetch(format!("Invalid selector {}: {:?}", css, e)))
    }

    /// Tabs and newlines become spaces, non-breaking spaces are dropped.
    pub fn normalize_whitespace(text: &str) -> String {
        text.chars()
            .filter(|c| *c != '\u{a0}')
            .map(|c| if c == '\t' || c == '\n' { ' ' } else { c })
            .collect()
    }

    /// Concatenated text of every element under `root` matching `selector`.
    pub fn select_text(root: ElementRef<'_>, selector: &Selector) -> String {
        root.select(selector).flat_map(|el| el.text()).collect()
    }

    /// Text held directly by `element`, skipping everything inside child elements.
    pub fn own_text(element: ElementRef<'_>) -> String {
        element
            .children()
            .filter_map(|node| node.value().as_text())
            .map(|text| &**text)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::utils;
    use scraper::Html;

    #[test]
    fn test_parse_url() {
        assert!(utils::parse_url("https://example.com").is_ok());
        assert!(utils::parse_url("invalid-url").is_err());
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(utils::normalize_whitespace("a\tb\nc\u{a0}d"), "a b cd");
        assert_eq!(utils::normalize_whitespace(""), "");
    }

    #[test]
    fn test_normalize_whitespace_is_idempotent() {
        let samples = [
            "\t\t記者 王小明／台北報導\n\n",
            "一段\u{a0}\u{a0}文字\r\n下一行",
            "already clean",
            "\n",
        ];
        for sample in samples {
            let once = utils::normalize_whitespace(sample);
            assert_eq!(utils::normalize_whitespace(&once), once);
            assert!(!once.contains(['\t', '\n', '\u{a0}']));
        }
    }

    #[test]
    fn test_select_text_and_own_text() {
        let html = r#"<div id="body">lead <p>first</p> middle <p>second <b>bold</b></p> tail</div>"#;
        let document = Html::parse_fragment(html);
        let body_selector = utils::selector("div#body").unwrap();
        let body = document.select(&body_selector).next().unwrap();

        let p = utils::selector("p").unwrap();
        assert_eq!(utils::select_text(body, &p), "firstsecond bold");
        assert_eq!(utils::own_text(body), "lead  middle  tail");
    }
}
