//! In-process store keeping vectors in their serialized blob form.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::warn;

use super::VectorStore;
use crate::embeddings::{EmbeddingRecord, EmbeddingVector, RecordKind, StoredEmbedding};
use crate::error::Result;
use crate::tasks::TaskSnapshot;

/// `VectorStore` backed by in-memory maps.
///
/// Vectors are held as blobs so reads go through the same decoding path as a
/// database-backed store. Embeddings are returned in id order.
#[derive(Default)]
pub struct MemoryStore {
    embeddings: RwLock<BTreeMap<(String, i64), StoredEmbedding>>,
    tasks: RwLock<HashMap<i64, TaskSnapshot>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw embedding without validation, mimicking rows written by
    /// older application versions.
    pub async fn put_raw_embedding(&self, id: i64, kind: &RecordKind, raw: StoredEmbedding) {
        self.embeddings
            .write()
            .await
            .insert((kind.as_str().to_string(), id), raw);
    }

    /// Number of stored embeddings across all kinds.
    pub async fn embedding_count(&self) -> usize {
        self.embeddings.read().await.len()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn put_embedding(
        &self,
        id: i64,
        kind: &RecordKind,
        vector: &EmbeddingVector,
    ) -> Result<()> {
        self.put_raw_embedding(id, kind, StoredEmbedding::Blob(vector.to_blob()))
            .await;
        Ok(())
    }

    async fn get_all_embeddings(&self, kind: &RecordKind) -> Result<Vec<EmbeddingRecord>> {
        let guard = self.embeddings.read().await;
        let mut out = Vec::new();
        for ((stored_kind, id), raw) in guard.iter() {
            if stored_kind != kind.as_str() {
                continue;
            }
            match raw.decode() {
                Ok(vector) => out.push(EmbeddingRecord {
                    id: *id,
                    kind: kind.clone(),
                    vector,
                }),
                Err(err) => warn!(id, error = %err, "skipping undecodable embedding"),
            }
        }
        Ok(out)
    }

    async fn delete_embedding(&self, id: i64, kind: &RecordKind) -> Result<()> {
        self.embeddings
            .write()
            .await
            .remove(&(kind.as_str().to_string(), id));
        Ok(())
    }

    async fn get_tasks_by_ids(&self, ids: &[i64]) -> Result<Vec<TaskSnapshot>> {
        let guard = self.tasks.read().await;
        Ok(ids.iter().filter_map(|id| guard.get(id).cloned()).collect())
    }

    async fn put_task(&self, task: &TaskSnapshot) -> Result<()> {
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(())
    }

    async fn delete_task(&self, id: i64) -> Result<()> {
        self.tasks.write().await.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(values: &[f32]) -> EmbeddingVector {
        EmbeddingVector::new(values.to_vec()).unwrap()
    }

    #[tokio::test(flavor = "current_thread")]
    async fn upsert_replaces_previous_vector() {
        let store = MemoryStore::new();
        store
            .put_embedding(1, &RecordKind::Task, &vector(&[1.0, 0.0]))
            .await
            .unwrap();
        store
            .put_embedding(1, &RecordKind::Task, &vector(&[0.0, 1.0]))
            .await
            .unwrap();

        let records = store.get_all_embeddings(&RecordKind::Task).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].vector.as_slice(), &[0.0, 1.0]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn filters_by_kind_and_skips_corrupt_rows() {
        let store = MemoryStore::new();
        let note = RecordKind::from("note");
        store
            .put_embedding(1, &RecordKind::Task, &vector(&[1.0]))
            .await
            .unwrap();
        store.put_embedding(2, &note, &vector(&[1.0])).await.unwrap();
        store
            .put_raw_embedding(3, &RecordKind::Task, StoredEmbedding::Blob(vec![1, 2, 3]))
            .await;
        store
            .put_raw_embedding(4, &RecordKind::Task, StoredEmbedding::Json("[0.5]".into()))
            .await;

        let ids: Vec<i64> = store
            .get_all_embeddings(&RecordKind::Task)
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn deletes_are_idempotent() {
        let store = MemoryStore::new();
        store.put_task(&TaskSnapshot::new(1, "a")).await.unwrap();
        store.delete_task(1).await.unwrap();
        store.delete_task(1).await.unwrap();
        store.delete_embedding(1, &RecordKind::Task).await.unwrap();
        assert!(store.get_tasks_by_ids(&[1]).await.unwrap().is_empty());
    }
}
