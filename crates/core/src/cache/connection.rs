//! Opening the valuation cache.

use super::migrations;
use crate::Error;
use std::path::Path;
use tokio_rusqlite::Connection;

/// Applied to every connection before migrations run.
const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA busy_timeout=5000;
     PRAGMA foreign_keys=ON;";

/// Handle to the valuation cache.
///
/// Cloning is cheap and every clone talks to the same background thread,
/// which runs one statement batch at a time. Operations that are a single
/// SQL statement are therefore atomic with respect to each other.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open or create the cache file at `path` and bring its schema up to date.
    ///
    /// A file that exists but is not a SQLite database is an error, never
    /// an empty cache.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        tracing::debug!("opening valuation cache at {}", path.display());

        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    /// Private in-memory cache, gone when the last clone is dropped.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory().await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| conn.execute_batch(PRAGMAS))
            .await
            .map_err(Error::Database)?;

        migrations::run(&conn).await?;
        Ok(Self { conn })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory_is_empty() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert_eq!(db.count_valuations().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let other = db.clone();
        let listing = crate::Listing::default();
        other
            .upsert_valuation("abc", &listing, &crate::Valuation::Unavailable, chrono::Utc::now())
            .await
            .unwrap();
        assert_eq!(db.count_valuations().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_open_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");

        let db = CacheDb::open(&path).await.unwrap();
        assert_eq!(db.count_valuations().await.unwrap(), 0);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_reopen_keeps_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");

        let db = CacheDb::open(&path).await.unwrap();
        db.upsert_valuation("abc", &crate::Listing::default(), &crate::Valuation::Estimate(1), chrono::Utc::now())
            .await
            .unwrap();
        drop(db);

        let db = CacheDb::open(&path).await.unwrap();
        assert!(db.contains_valuation("abc").await.unwrap());
    }

    #[tokio::test]
    async fn test_open_rejects_non_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");
        std::fs::write(&path, "this is definitely not a sqlite database file, just some text").unwrap();

        let result = CacheDb::open(&path).await;
        assert!(matches!(result, Err(Error::Database(_)) | Err(Error::MigrationFailed(_))));
    }
}
