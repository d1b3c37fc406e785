use async_trait::async_trait;
use tokio::sync::RwLock;
use zh_core::{ArticleStorage, Error, Result, StoredArticle};

/// Process-local store with the same constraints as the SQLite table.
#[derive(Default)]
pub struct MemoryStorage {
    articles: RwLock<Vec<StoredArticle>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStorage for MemoryStorage {
    async fn ensure_initialized(&self) -> Result<()> {
        Ok(())
    }

    async fn exists(&self, link: &str) -> Result<bool> {
        let articles = self.articles.read().await;
        Ok(articles.iter().any(|a| a.link == link))
    }

    async fn write(
        &self,
        id: &str,
        link: &str,
        title: &str,
        article: &str,
        article_gen: &str,
    ) -> Result<()> {
        let mut articles = self.articles.write().await;
        if articles.iter().any(|a| a.id == id || a.link == link) {
            return Err(Error::DuplicateKey(format!("{} ({})", link, id)));
        }

        articles.push(StoredArticle {
            id: id.to_string(),
            link: link.to_string(),
            title: title.to_string(),
            article: article.to_string(),
            article_gen: article_gen.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        });
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<StoredArticle>> {
        Ok(self.articles.read().await.clone())
    }

    async fn fetch_by_id(&self, id: &str) -> Result<StoredArticle> {
        self.articles
            .read()
            .await
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("article {}", id)))
    }
}
