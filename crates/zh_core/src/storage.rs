use async_trait::async_trait;
use crate::types::StoredArticle;
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Create the backing table if it is missing. Safe to call on every start.
    async fn ensure_initialized(&self) -> Result<()>;

    /// Whether an article with this link was already written
    async fn exists(&self, link: &str) -> Result<bool>;

    /// Insert one row. `created_at` is stamped by the store.
    async fn write(
        &self,
        id: &str,
        link: &str,
        title: &str,
        article: &str,
        article_gen: &str,
    ) -> Result<()>;

    /// All rows in insertion order
    async fn fetch_all(&self) -> Result<Vec<StoredArticle>>;

    async fn fetch_by_id(&self, id: &str) -> Result<StoredArticle>;
}
