//! DuckDB-backed page metadata store.
//!
//! Rows live in a single `page_metadata` table keyed by
//! `(document_id, page_no)`. Binary fields are stored as base64 text, the
//! same layout [`PageRecord`] serializes to.

use crate::error::{StorageError, StorageResult};
use crate::record::{PageMetadata, PageRecord};
use crate::MetadataStore;
use async_trait::async_trait;
use duckdb::{params, Connection, OptionalExt};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Page metadata store backed by DuckDB.
#[derive(Clone)]
pub struct DuckDbMetadataStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDbMetadataStore {
    /// Opens or creates a metadata store at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = crate::open_duckdb_with_wal_recovery(path, "128MB", 1)?;
        initialize_page_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory metadata store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_page_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Number of stored page rows.
    pub fn count(&self) -> StorageResult<u64> {
        let conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM page_metadata", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// Runs a blocking closure against the connection off the async executor.
    async fn with_conn<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StorageResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StorageError::LockPoisoned)?;
            f(&guard)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

#[async_trait]
impl MetadataStore for DuckDbMetadataStore {
    async fn upsert(&self, meta: &PageMetadata) -> StorageResult<()> {
        let record = PageRecord::from(meta);
        let updated_at = chrono::Utc::now().timestamp_millis();

        self.with_conn(move |conn| {
            conn.execute(
                r#"
                INSERT OR REPLACE INTO page_metadata (
                    document_id, page_no, blob_path,
                    content_iv, content_tag,
                    wrapped_key, wrap_iv, wrap_tag,
                    updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
                params![
                    record.document_id,
                    record.page_no,
                    record.blob_path,
                    record.content_iv,
                    record.content_tag,
                    record.wrapped_key,
                    record.wrap_iv,
                    record.wrap_tag,
                    updated_at,
                ],
            )?;
            debug!(
                document_id = %record.document_id,
                page_no = record.page_no,
                "upserted page metadata"
            );
            Ok(())
        })
        .await
    }

    async fn get(&self, document_id: &str, page_no: u32) -> StorageResult<Option<PageMetadata>> {
        let document_id = document_id.to_string();

        let record = self
            .with_conn(move |conn| {
                let row = conn
                    .query_row(
                        r#"
                        SELECT document_id, page_no, blob_path,
                               content_iv, content_tag,
                               wrapped_key, wrap_iv, wrap_tag
                        FROM page_metadata
                        WHERE document_id = ? AND page_no = ?
                        "#,
                        params![document_id, page_no],
                        |row| {
                            Ok(PageRecord {
                                document_id: row.get(0)?,
                                page_no: row.get(1)?,
                                blob_path: row.get(2)?,
                                content_iv: row.get(3)?,
                                content_tag: row.get(4)?,
                                wrapped_key: row.get(5)?,
                                wrap_iv: row.get(6)?,
                                wrap_tag: row.get(7)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(row)
            })
            .await?;

        record.map(PageMetadata::try_from).transpose()
    }
}

fn initialize_page_schema(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS page_metadata (
            document_id VARCHAR NOT NULL,
            page_no UINTEGER NOT NULL,
            blob_path VARCHAR NOT NULL,
            content_iv VARCHAR NOT NULL,
            content_tag VARCHAR NOT NULL,
            wrapped_key VARCHAR NOT NULL,
            wrap_iv VARCHAR NOT NULL,
            wrap_tag VARCHAR NOT NULL,
            updated_at BIGINT NOT NULL,
            PRIMARY KEY (document_id, page_no)
        );
        "#,
    )?;
    Ok(())
}
