use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zh_core::{ArticleStorage, Error, Result, StoredArticle};

pub const DEFAULT_DB_PATH: &str = "zh.db";

// `link` is unique so that two runs racing past the `exists` check cannot
// both insert the same article; the loser gets `Error::DuplicateKey`.
const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id TEXT PRIMARY KEY,
        link TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        article TEXT NOT NULL,
        article_gen TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    // Add future migrations here
];

pub struct SQLiteStorage {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SQLiteStorage {
    /// Prepare a handle on `db_path`. Nothing touches the disk until
    /// [`ArticleStorage::ensure_initialized`] runs.
    pub fn new_with_path(db_path: impl AsRef<Path>) -> Self {
        let db_path = db_path.as_ref().to_path_buf();
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);
        // A single connection keeps writes serialized within the process.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_lazy_with(options);

        Self { pool, db_path }
    }
}

fn storage_err(context: &str, e: sqlx::Error) -> Error {
    Error::Storage(format!("{}: {}", context, e))
}

fn row_to_article(row: &SqliteRow) -> Result<StoredArticle> {
    let get = |column: &str| -> Result<String> {
        row.try_get::<String, _>(column)
            .map_err(|e| storage_err(&format!("Failed to read column {}", column), e))
    };

    Ok(StoredArticle {
        id: get("id")?,
        link: get("link")?,
        title: get("title")?,
        article: get("article")?,
        article_gen: get("article_gen")?,
        created_at: get("created_at")?,
    })
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn ensure_initialized(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    Error::Storage(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&self.pool)
                .await
                .map_err(|e| storage_err(&format!("Failed to run migration {}", i), e))?;
        }

        info!(path = %self.db_path.display(), "💾 Article store ready");
        Ok(())
    }

    async fn exists(&self, link: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM articles WHERE link = ? LIMIT 1")
            .bind(link)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_err("Failed to check article", e))?;

        Ok(row.is_some())
    }

    async fn write(
        &self,
        id: &str,
        link: &str,
        title: &str,
        article: &str,
        article_gen: &str,
    ) -> Result<()> {
        let created_at = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO articles
            (id, link, title, article, article_gen, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(link)
        .bind(title)
        .bind(article)
        .bind(article_gen)
        .bind(&created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return Error::DuplicateKey(format!("{} ({})", link, id));
                }
            }
            storage_err(&format!("Failed to store article {}", link), e)
        })?;

        debug!(%id, %link, "Wrote article");
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<StoredArticle>> {
        let rows = sqlx::query(
            r#"
            SELECT id, link, title, article, article_gen, created_at
            FROM articles
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to fetch articles", e))?;

        rows.iter().map(row_to_article).collect()
    }

    async fn fetch_by_id(&self, id: &str) -> Result<StoredArticle> {
        let row = sqlx::query(
            r#"
            SELECT id, link, title, article, article_gen, created_at
            FROM articles
            WHERE id = ?
            LIMIT 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_err(&format!("Failed to fetch article {}", id), e))?;

        match row {
            Some(row) => row_to_article(&row),
            None => Err(Error::NotFound(format!("article {}", id))),
        }
    }
}
