//! Page metadata storage for PageVault.
//!
//! Maps `(document_id, page_no)` to the parameters needed to decrypt a
//! page: blob location, content IV and tag, and the wrapped page key.
//!
//! # Architecture
//!
//! - [`MetadataStore`] is the only interface the pipelines see: an upsert
//!   keyed by `(document_id, page_no)` and a point lookup
//! - [`DuckDbMetadataStore`] persists rows in DuckDB
//! - [`MemoryMetadataStore`] keeps rows in process memory

mod error;
mod memory_store;
mod page_store;
mod record;

use async_trait::async_trait;

pub use error::{StorageError, StorageResult};
pub use memory_store::MemoryMetadataStore;
pub use page_store::DuckDbMetadataStore;
pub use record::{PageMetadata, PageRecord};

/// Narrow interface over the relational metadata service.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Inserts or fully replaces the row for `(meta.document_id, meta.page_no)`.
    async fn upsert(&self, meta: &PageMetadata) -> StorageResult<()>;

    /// Looks up a single page.
    async fn get(&self, document_id: &str, page_no: u32) -> StorageResult<Option<PageMetadata>>;
}

/// Open a DuckDB connection with stale WAL recovery and resource limits.
///
/// If the initial open fails and a `.wal` file exists alongside the database,
/// it is removed and the open is retried once. This handles the common case
/// where an unclean shutdown leaves a WAL file that prevents reopening.
pub fn open_duckdb_with_wal_recovery(
    path: &std::path::Path,
    memory_limit: &str,
    threads: u32,
) -> StorageResult<duckdb::Connection> {
    let conn = match duckdb::Connection::open(path) {
        Ok(c) => c,
        Err(first_err) => {
            let wal_path = path.with_extension(
                path.extension()
                    .map(|ext| format!("{}.wal", ext.to_string_lossy()))
                    .unwrap_or_else(|| "wal".to_string()),
            );
            if wal_path.exists() {
                tracing::warn!(
                    wal = %wal_path.display(),
                    "DuckDB open failed, removing stale WAL and retrying"
                );
                if std::fs::remove_file(&wal_path).is_ok() {
                    let c = duckdb::Connection::open(path)?;
                    apply_resource_limits(&c, memory_limit, threads)?;
                    return Ok(c);
                }
            }
            return Err(first_err.into());
        }
    };
    apply_resource_limits(&conn, memory_limit, threads)?;
    Ok(conn)
}

/// Apply memory and thread limits to a DuckDB connection.
fn apply_resource_limits(
    conn: &duckdb::Connection,
    memory_limit: &str,
    threads: u32,
) -> StorageResult<()> {
    conn.execute_batch(&format!(
        "PRAGMA memory_limit='{}'; PRAGMA threads={};",
        memory_limit, threads
    ))?;
    Ok(())
}
