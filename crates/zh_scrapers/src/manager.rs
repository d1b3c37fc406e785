use std::sync::Arc;
use tracing::{error, info, warn};
use zh_core::{short_id, ArticleStorage, Error, GenerationModel, Result, ScrapedRecord};

use crate::scrapers::Scraper;

pub const DEFAULT_LIMIT: usize = 2;

/// What a pass does when it meets a link that is already stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Skip that record and keep checking the rest.
    #[default]
    Skip,
    /// End the pass at the first stored link.
    Stop,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub limit: usize,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

/// Counters for one pass over the crawl output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub scraped: usize,
    pub written: usize,
    pub duplicates: usize,
    pub generation_failures: usize,
    /// Failed existence checks and failed inserts
    pub write_failures: usize,
    pub stopped_early: bool,
    /// Ids of the rows written in this pass, in order
    pub written_ids: Vec<String>,
}

/// Drives crawl, dedup, generation and persistence for one site.
pub struct ScraperManager {
    storage: Arc<dyn ArticleStorage>,
    inference: Arc<dyn GenerationModel>,
    scraper: Arc<dyn Scraper>,
}

impl ScraperManager {
    pub fn new(
        storage: Arc<dyn ArticleStorage>,
        inference: Arc<dyn GenerationModel>,
        scraper: Arc<dyn Scraper>,
    ) -> Self {
        Self {
            storage,
            inference,
            scraper,
        }
    }

    /// Run one pass.
    ///
    /// Only a store that cannot be initialized fails the pass. Everything
    /// after that is handled per record and shows up in the report.
    pub async fn run(&self, options: &PipelineOptions) -> Result<PassReport> {
        self.storage.ensure_initialized().await?;

        info!(
            source = self.scraper.source(),
            limit = options.limit,
            backend = self.inference.name(),
            "🦗 Starting pass"
        );
        let records = self.scraper.crawl(options.limit).await;
        let report = self.process_records(records, options.duplicate_policy).await;

        info!(
            scraped = report.scraped,
            written = report.written,
            duplicates = report.duplicates,
            generation_failures = report.generation_failures,
            write_failures = report.write_failures,
            stopped_early = report.stopped_early,
            "✅ Pass finished"
        );
        Ok(report)
    }

    /// Dedup, generate and store already scraped records, in order.
    pub async fn process_records(
        &self,
        records: Vec<ScrapedRecord>,
        policy: DuplicatePolicy,
    ) -> PassReport {
        let mut report = PassReport {
            scraped: records.len(),
            ..PassReport::default()
        };

        for record in records {
            match self.storage.exists(&record.link).await {
                Ok(false) => {}
                Ok(true) => {
                    report.duplicates += 1;
                    if policy == DuplicatePolicy::Stop {
                        warn!(link = %record.link, "⏭️ Already stored, stopping pass");
                        report.stopped_early = true;
                        break;
                    }
                    info!(link = %record.link, "⏭️ Already stored, skipping");
                    continue;
                }
                Err(e) => {
                    error!(link = %record.link, error = %e, "❌ Existence check failed, skipping");
                    report.write_failures += 1;
                    continue;
                }
            }

            match self.process_article(&record).await {
                Ok(id) => {
                    report.written += 1;
                    report.written_ids.push(id);
                }
                Err(e @ (Error::Backend(_) | Error::BackendUnavailable(_))) => {
                    error!(link = %record.link, error = %e, "❌ Generation failed, skipping");
                    report.generation_failures += 1;
                }
                Err(e) => {
                    error!(link = %record.link, error = %e, "❌ Failed to store article");
                    report.write_failures += 1;
                }
            }
        }

        report
    }

    async fn process_article(&self, record: &ScrapedRecord) -> Result<String> {
        info!(title = %record.title, "🤖 Generating");
        let output = self.inference.generate(&record.content).await?;
        if let Some(rate) = output.tokens_per_second() {
            info!(link = %record.link, tokens_per_second = %format!("{:.1}", rate), "✨ Generated");
        }

        let id = short_id();
        self.storage
            .write(&id, &record.link, &record.title, &record.content, &output.text)
            .await?;
        info!(%id, link = %record.link, "💾 Stored article");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use zh_core::{GenerationOutput, StoredArticle};
    use zh_inference::models::EchoModel;
    use zh_storage::MemoryStorage;

    struct StaticScraper {
        records: Vec<ScrapedRecord>,
    }

    impl StaticScraper {
        fn new(links: &[&str]) -> Self {
            Self {
                records: links
                    .iter()
                    .map(|link| ScrapedRecord::new(*link, format!("title {}", link), format!("body {}", link)))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl Scraper for StaticScraper {
        fn source(&self) -> &str {
            "static"
        }

        async fn get_article_urls(&self, limit: usize) -> Result<Vec<String>> {
            Ok(self.records.iter().take(limit).map(|r| r.link.clone()).collect())
        }

        async fn scrape_article(&self, url: &str) -> Result<ScrapedRecord> {
            self.records
                .iter()
                .find(|r| r.link == url)
                .cloned()
                .ok_or_else(|| Error::Fetch(url.to_string()))
        }
    }

    /// Fails for any text containing "FAIL", counts calls.
    #[derive(Default)]
    struct FlakyModel {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GenerationModel for FlakyModel {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn generate(&self, text: &str) -> Result<GenerationOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.contains("FAIL") {
                return Err(Error::Backend("model crashed".to_string()));
            }
            Ok(GenerationOutput::from_text(format!("OK:{}", text)))
        }
    }

    /// Memory store whose writes fail for links containing "broken" and whose
    /// existence checks fail for links containing "unreadable".
    #[derive(Default)]
    struct BrokenWrites {
        inner: MemoryStorage,
        fail_init: bool,
    }

    #[async_trait]
    impl ArticleStorage for BrokenWrites {
        async fn ensure_initialized(&self) -> Result<()> {
            if self.fail_init {
                return Err(Error::Storage("read-only filesystem".to_string()));
            }
            self.inner.ensure_initialized().await
        }

        async fn exists(&self, link: &str) -> Result<bool> {
            if link.contains("unreadable") {
                return Err(Error::Storage("database is locked".to_string()));
            }
            self.inner.exists(link).await
        }

        async fn write(
            &self,
            id: &str,
            link: &str,
            title: &str,
            article: &str,
            article_gen: &str,
        ) -> Result<()> {
            if link.contains("broken") {
                return Err(Error::Storage("disk full".to_string()));
            }
            self.inner.write(id, link, title, article, article_gen).await
        }

        async fn fetch_all(&self) -> Result<Vec<StoredArticle>> {
            self.inner.fetch_all().await
        }

        async fn fetch_by_id(&self, id: &str) -> Result<StoredArticle> {
            self.inner.fetch_by_id(id).await
        }
    }

    fn manager(
        storage: Arc<dyn ArticleStorage>,
        inference: Arc<dyn GenerationModel>,
        links: &[&str],
    ) -> ScraperManager {
        ScraperManager::new(storage, inference, Arc::new(StaticScraper::new(links)))
    }

    fn options(limit: usize, duplicate_policy: DuplicatePolicy) -> PipelineOptions {
        PipelineOptions {
            limit,
            duplicate_policy,
        }
    }

    async fn stored_links(storage: &dyn ArticleStorage) -> Vec<String> {
        storage
            .fetch_all()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.link)
            .collect()
    }

    #[tokio::test]
    async fn test_written_article_matches_record_and_output() {
        let storage = Arc::new(MemoryStorage::new());
        let manager = manager(storage.clone(), Arc::new(EchoModel::default()), &["https://t/1"]);

        let report = manager.run(&options(5, DuplicatePolicy::Skip)).await.unwrap();
        assert_eq!(report.written, 1);

        let article = storage.fetch_by_id(&report.written_ids[0]).await.unwrap();
        assert_eq!(article.link, "https://t/1");
        assert_eq!(article.title, "title https://t/1");
        assert_eq!(article.article, "body https://t/1");
        assert_eq!(article.article_gen, "OK:body https://t/1");
    }

    #[tokio::test]
    async fn test_stop_policy_writes_nothing_after_first_duplicate() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .write("existing", "https://t/L", "t", "a", "g")
            .await
            .unwrap();
        let inference = Arc::new(FlakyModel::default());
        let manager = manager(storage.clone(), inference.clone(), &["https://t/L", "https://t/M"]);

        let report = manager.run(&options(5, DuplicatePolicy::Stop)).await.unwrap();

        assert!(report.stopped_early);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.written, 0);
        assert_eq!(inference.calls.load(Ordering::SeqCst), 0);
        assert_eq!(stored_links(storage.as_ref()).await, vec!["https://t/L"]);
    }

    #[tokio::test]
    async fn test_skip_policy_continues_past_duplicate() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .write("existing", "https://t/L", "t", "a", "g")
            .await
            .unwrap();
        let manager = manager(
            storage.clone(),
            Arc::new(EchoModel::default()),
            &["https://t/L", "https://t/M"],
        );

        let report = manager.run(&options(5, DuplicatePolicy::Skip)).await.unwrap();

        assert!(!report.stopped_early);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.written, 1);
        assert_eq!(stored_links(storage.as_ref()).await, vec!["https://t/L", "https://t/M"]);
    }

    #[tokio::test]
    async fn test_second_pass_writes_nothing_new() {
        let storage = Arc::new(MemoryStorage::new());
        let manager = manager(
            storage.clone(),
            Arc::new(EchoModel::default()),
            &["https://t/1", "https://t/2"],
        );

        let first = manager.run(&options(5, DuplicatePolicy::Skip)).await.unwrap();
        let second = manager.run(&options(5, DuplicatePolicy::Skip)).await.unwrap();

        assert_eq!(first.written, 2);
        assert_eq!(second.written, 0);
        assert_eq!(second.duplicates, 2);
        assert_eq!(storage.fetch_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_backend_failure_is_isolated() {
        let storage = Arc::new(MemoryStorage::new());
        let inference = Arc::new(FlakyModel::default());
        let manager = manager(
            storage.clone(),
            inference.clone(),
            &["https://t/FAIL", "https://t/2", "https://t/3"],
        );

        let report = manager.run(&options(5, DuplicatePolicy::Stop)).await.unwrap();

        assert_eq!(report.generation_failures, 1);
        assert_eq!(report.written, 2);
        assert_eq!(inference.calls.load(Ordering::SeqCst), 3);
        assert_eq!(stored_links(storage.as_ref()).await, vec!["https://t/2", "https://t/3"]);
    }

    #[tokio::test]
    async fn test_write_failure_is_isolated() {
        let storage = Arc::new(BrokenWrites::default());
        let manager = manager(
            storage.clone(),
            Arc::new(EchoModel::default()),
            &["https://t/broken", "https://t/ok"],
        );

        let report = manager.run(&options(5, DuplicatePolicy::Skip)).await.unwrap();

        assert_eq!(report.write_failures, 1);
        assert_eq!(report.written, 1);
        assert_eq!(stored_links(storage.as_ref()).await, vec!["https://t/ok"]);
    }

    #[tokio::test]
    async fn test_failed_existence_check_skips_record() {
        let storage = Arc::new(BrokenWrites::default());
        let inference = Arc::new(FlakyModel::default());
        let manager = manager(
            storage.clone(),
            inference.clone(),
            &["https://t/unreadable", "https://t/2", "https://t/3"],
        );

        let report = manager.run(&options(5, DuplicatePolicy::Stop)).await.unwrap();

        assert_eq!(report.write_failures, 1);
        assert_eq!(report.duplicates, 0);
        assert_eq!(report.written, 2);
        assert!(!report.stopped_early);
        assert_eq!(inference.calls.load(Ordering::SeqCst), 2);
        assert_eq!(stored_links(storage.as_ref()).await, vec!["https://t/2", "https://t/3"]);
    }

    #[tokio::test]
    async fn test_init_failure_is_fatal() {
        let storage = Arc::new(BrokenWrites {
            fail_init: true,
            ..BrokenWrites::default()
        });
        let inference = Arc::new(FlakyModel::default());
        let manager = manager(storage, inference.clone(), &["https://t/1"]);

        let result = manager.run(&options(5, DuplicatePolicy::Skip)).await;
        assert!(matches!(result, Err(Error::Storage(_))));
        assert_eq!(inference.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_limit_bounds_the_pass() {
        let storage = Arc::new(MemoryStorage::new());
        let manager = manager(
            storage.clone(),
            Arc::new(EchoModel::default()),
            &["https://t/1", "https://t/2", "https://t/3"],
        );

        let report = manager.run(&options(0, DuplicatePolicy::Skip)).await.unwrap();
        assert_eq!(report, PassReport::default());

        let report = manager.run(&options(2, DuplicatePolicy::Skip)).await.unwrap();
        assert_eq!(report.scraped, 2);
        assert_eq!(report.written, 2);
    }
}
