//! Storage contract for embedding records and the task snapshots they describe.

use async_trait::async_trait;

use crate::embeddings::{EmbeddingRecord, EmbeddingVector, RecordKind};
use crate::error::Result;
use crate::tasks::TaskSnapshot;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{quote_ident, PgStore, TableName};

/// Read/write boundary between the query engine and durable storage.
///
/// Implementations synchronize internally; callers share them behind `Arc`.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Inserts or replaces the vector stored for `(id, kind)`.
    async fn put_embedding(&self, id: i64, kind: &RecordKind, vector: &EmbeddingVector)
        -> Result<()>;

    /// Returns every decodable record of `kind`. Rows whose stored bytes do not
    /// decode into a valid vector are skipped.
    async fn get_all_embeddings(&self, kind: &RecordKind) -> Result<Vec<EmbeddingRecord>>;

    /// Removes the vector stored for `(id, kind)`; missing rows are not an error.
    async fn delete_embedding(&self, id: i64, kind: &RecordKind) -> Result<()>;

    /// Looks up live tasks by id. Unknown ids are omitted and the result order
    /// is unspecified.
    async fn get_tasks_by_ids(&self, ids: &[i64]) -> Result<Vec<TaskSnapshot>>;

    /// Inserts or replaces a task snapshot.
    async fn put_task(&self, task: &TaskSnapshot) -> Result<()>;

    /// Removes a task snapshot; missing rows are not an error.
    async fn delete_task(&self, id: i64) -> Result<()>;
}
