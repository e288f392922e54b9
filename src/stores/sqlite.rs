/*!
SQLite Document Index

Durable [`DocumentIndex`] backend on a shared `sqlx` connection pool.

## Behavior

- The conditional create is pushed down to the database:
  `INSERT .. ON CONFLICT(key) DO NOTHING` followed by a read, with
  `rows_affected` deciding the `created` flag. Two concurrent creators for
  the same key therefore race at the unique-key constraint, and exactly one
  wins.
- When the `sqlite-migrations` feature is enabled (default), embedded
  migrations (`sqlx::migrate!("./migrations")`) run on connect; disabling
  the feature assumes external migration orchestration.

## Database Schema

- `documents.key` ← encoded composite key (hash[::assistant][::model])
- `documents.file_size` ← byte length of the content
- `documents.file_names_json` ← JSON array of original filenames
- `documents.summary_json` ← tagged JSON of the summary state
  (`pending` / `ready` / `failed`)
*/

use std::sync::Arc;

use async_trait::async_trait;
use miette::Diagnostic;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::instrument;

use crate::document::{DocumentEntry, DocumentKey, SummaryState};
use crate::stores::{DocumentIndex, IndexError};

#[derive(Debug, Error, Diagnostic)]
pub enum SqliteIndexError {
    #[error("SQLx error: {0}")]
    #[diagnostic(
        code(sumvault::sqlite::sqlx),
        help("Ensure the SQLite database URL is valid and accessible.")
    )]
    Sqlx(#[from] sqlx::Error),

    #[error("JSON serialization error: {0}")]
    #[diagnostic(
        code(sumvault::sqlite::serde),
        help("Check serialized shapes for file_names and summary state.")
    )]
    Serde(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    #[diagnostic(code(sumvault::sqlite::backend))]
    Backend(String),
}

impl From<SqliteIndexError> for IndexError {
    fn from(e: SqliteIndexError) -> Self {
        match e {
            SqliteIndexError::Sqlx(err) => IndexError::Backend {
                message: err.to_string(),
            },
            SqliteIndexError::Serde(err) => IndexError::Serde(err),
            SqliteIndexError::Backend(msg) => IndexError::Backend { message: msg },
        }
    }
}

/// SQLite-backed document index.
pub struct SqliteDocumentIndex {
    /// Shared pool for concurrent index operations.
    pool: Arc<SqlitePool>,
}

impl std::fmt::Debug for SqliteDocumentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDocumentIndex").finish()
    }
}

impl SqliteDocumentIndex {
    /// Connect (or create) a SQLite database at `database_url`.
    /// Example URL: "sqlite://sumvault.db?mode=rwc"
    #[must_use = "index must be used to persist document entries"]
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> Result<Self, IndexError> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(|e| IndexError::Backend {
                message: format!("connect error: {e}"),
            })?;
        // Run embedded migrations only if the feature is enabled (idempotent).
        #[cfg(feature = "sqlite-migrations")]
        {
            if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
                return Err(IndexError::Backend {
                    message: format!("migration failure: {e}"),
                });
            }
        }
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    fn row_to_entry(
        key: &DocumentKey,
        row: &sqlx::sqlite::SqliteRow,
    ) -> Result<DocumentEntry, SqliteIndexError> {
        let file_size: i64 = row.get("file_size");
        let file_names_json: String = row.get("file_names_json");
        let summary_json: String = row.get("summary_json");
        Ok(DocumentEntry {
            key: key.clone(),
            file_size: file_size as u64,
            file_names: serde_json::from_str(&file_names_json)?,
            summary: serde_json::from_str::<SummaryState>(&summary_json)?,
        })
    }
}

#[async_trait]
impl DocumentIndex for SqliteDocumentIndex {
    #[instrument(skip(self, initial), fields(key = %initial.key), err)]
    async fn get_or_create(
        &self,
        initial: DocumentEntry,
    ) -> Result<(DocumentEntry, bool), IndexError> {
        let encoded = initial.key.encode();
        let file_names_json =
            serde_json::to_string(&initial.file_names).map_err(SqliteIndexError::Serde)?;
        let summary_json =
            serde_json::to_string(&initial.summary).map_err(SqliteIndexError::Serde)?;

        let result = sqlx::query(
            r#"
            INSERT INTO documents (key, file_size, file_names_json, summary_json)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO NOTHING
        "#,
        )
        .bind(&encoded)
        .bind(initial.file_size as i64)
        .bind(&file_names_json)
        .bind(&summary_json)
        .execute(&*self.pool)
        .await
        .map_err(SqliteIndexError::Sqlx)?;

        if result.rows_affected() == 1 {
            return Ok((initial, true));
        }

        // Lost the create race (or the entry predates this call): return
        // the stored entry untouched.
        let stored = self
            .get(&initial.key)
            .await?
            .ok_or_else(|| IndexError::Backend {
                message: format!("entry for {encoded} vanished between insert and read"),
            })?;
        Ok((stored, false))
    }

    #[instrument(skip(self, key), fields(key = %key), err)]
    async fn get(&self, key: &DocumentKey) -> Result<Option<DocumentEntry>, IndexError> {
        let row_opt = sqlx::query(
            r#"
            SELECT file_size, file_names_json, summary_json
            FROM documents
            WHERE key = ?1
            "#,
        )
        .bind(key.encode())
        .fetch_optional(&*self.pool)
        .await
        .map_err(SqliteIndexError::Sqlx)?;

        match row_opt {
            Some(row) => Ok(Some(Self::row_to_entry(key, &row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, entry), fields(key = %entry.key), err)]
    async fn update(&self, entry: &DocumentEntry) -> Result<(), IndexError> {
        let file_names_json =
            serde_json::to_string(&entry.file_names).map_err(SqliteIndexError::Serde)?;
        let summary_json =
            serde_json::to_string(&entry.summary).map_err(SqliteIndexError::Serde)?;

        sqlx::query(
            r#"
            UPDATE documents
            SET file_size = ?2,
                file_names_json = ?3,
                summary_json = ?4,
                updated_at = datetime('now')
            WHERE key = ?1
        "#,
        )
        .bind(entry.key.encode())
        .bind(entry.file_size as i64)
        .bind(&file_names_json)
        .bind(&summary_json)
        .execute(&*self.pool)
        .await
        .map_err(SqliteIndexError::Sqlx)?;

        Ok(())
    }
}
