use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sc_core::{Error, RatingPage, RatingRecord, RatingStore, RatingWriter, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;

use crate::DEFAULT_SCAN_PAGE_SIZE;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS article_ratings (
        url TEXT PRIMARY KEY,
        average_rating REAL NOT NULL DEFAULT 0
    )
    "#,
];

pub struct SqliteRatingStore {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
    page_size: usize,
}

impl SqliteRatingStore {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::StoreUnavailable(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::StoreUnavailable(format!("Failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
            page_size: DEFAULT_SCAN_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

#[async_trait]
impl RatingStore for SqliteRatingStore {
    async fn scan_page(&self, continuation: Option<String>) -> Result<RatingPage> {
        // One extra row tells us whether another page exists.
        let limit = self.page_size as i64 + 1;
        let rows = match &continuation {
            Some(after) => {
                sqlx::query(
                    "SELECT url, average_rating FROM article_ratings WHERE url > ? ORDER BY url LIMIT ?",
                )
                .bind(after)
                .bind(limit)
                .fetch_all(&*self.pool)
                .await
            }
            None => {
                sqlx::query("SELECT url, average_rating FROM article_ratings ORDER BY url LIMIT ?")
                    .bind(limit)
                    .fetch_all(&*self.pool)
                    .await
            }
        }
        .map_err(|e| Error::StoreUnavailable(format!("Failed to scan ratings: {}", e)))?;

        let has_more = rows.len() > self.page_size;
        let items: Vec<RatingRecord> = rows
            .into_iter()
            .take(self.page_size)
            .map(|row| RatingRecord {
                url: row.get("url"),
                average_rating: row.get("average_rating"),
            })
            .collect();

        let continuation = if has_more {
            items.last().map(|r| r.url.clone())
        } else {
            None
        };
        Ok(RatingPage { items, continuation })
    }
}

#[async_trait]
impl RatingWriter for SqliteRatingStore {
    async fn put_rating(&self, record: &RatingRecord) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO article_ratings (url, average_rating) VALUES (?, ?)")
            .bind(&record.url)
            .bind(record.average_rating)
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::StoreUnavailable(format!("Failed to store rating: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_sqlite_scan_all_pages() {
        let dir = tempdir().unwrap();
        let store = SqliteRatingStore::new_with_path(&dir.path().join("ratings.db"))
            .await
            .unwrap()
            .with_page_size(2);

        for (url, rating) in [("c", 3.0), ("a", 1.0), ("b", 2.0)] {
            store
                .put_rating(&RatingRecord { url: url.to_string(), average_rating: rating })
                .await
                .unwrap();
        }

        let first = store.scan_page(None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.continuation.as_deref(), Some("b"));

        let all = store.scan_all().await.unwrap();
        let urls: Vec<&str> = all.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["a", "b", "c"]);
        assert_eq!(all[2].average_rating, 3.0);
    }

    #[tokio::test]
    async fn test_sqlite_upsert() {
        let dir = tempdir().unwrap();
        let store = SqliteRatingStore::new_with_path(&dir.path().join("nested/ratings.db"))
            .await
            .unwrap();
        let mut record = RatingRecord { url: "u".to_string(), average_rating: 1.0 };
        store.put_rating(&record).await.unwrap();
        record.average_rating = 4.5;
        store.put_rating(&record).await.unwrap();

        assert_eq!(store.scan_all().await.unwrap(), vec![record]);
    }
}
