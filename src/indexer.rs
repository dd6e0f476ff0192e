//! Write path: keeps each task's embedding in step with the task itself.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::embedder::EmbeddingProvider;
use crate::embeddings::{EmbeddingVector, RecordKind};
use crate::error::Result;
use crate::tasks::TaskSnapshot;
use crate::vector_store::VectorStore;

/// Embeds tasks on create/update and removes their vectors on delete.
#[derive(Clone)]
pub struct TaskIndexer {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl TaskIndexer {
    /// Creates an indexer writing through `store`.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Stores the snapshot and replaces its embedding.
    ///
    /// When embedding fails the snapshot is still saved, the previous vector
    /// (if any) is removed since it describes the old content, and the error is
    /// returned.
    pub async fn index_task(&self, task: &TaskSnapshot) -> Result<EmbeddingVector> {
        self.store.put_task(task).await?;
        let input = task.embedding_input();
        let vector = match self.embedder.embed(&input).await {
            Ok(vector) => vector,
            Err(err) => {
                warn!(id = task.id, error = %err, "failed to embed task; clearing stale vector");
                if let Err(clear_err) = self.store.delete_embedding(task.id, &task.kind).await {
                    warn!(id = task.id, error = %clear_err, "failed to clear stale vector");
                }
                return Err(err);
            }
        };
        self.store
            .put_embedding(task.id, &task.kind, &vector)
            .await?;
        debug!(id = task.id, dimensions = vector.dimensions(), "indexed task");
        Ok(vector)
    }

    /// Deletes the task snapshot and its embedding.
    pub async fn remove_task(&self, id: i64, kind: &RecordKind) -> Result<()> {
        self.store.delete_embedding(id, kind).await?;
        self.store.delete_task(id).await?;
        debug!(id, "removed task");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagError;
    use crate::vector_store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedEmbedder {
        outputs: Mutex<Vec<Result<Vec<f32>>>>,
        inputs: Mutex<Vec<String>>,
    }

    impl ScriptedEmbedder {
        fn new(outputs: Vec<Result<Vec<f32>>>) -> Arc<Self> {
            Arc::new(Self {
                outputs: Mutex::new(outputs),
                inputs: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl EmbeddingProvider for ScriptedEmbedder {
        async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
            self.inputs.lock().unwrap().push(text.to_string());
            self.outputs
                .lock()
                .unwrap()
                .remove(0)
                .and_then(EmbeddingVector::new)
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn update_replaces_vector_and_failure_clears_it() {
        let store = Arc::new(MemoryStore::new());
        let embedder = ScriptedEmbedder::new(vec![
            Ok(vec![1.0, 0.0]),
            Ok(vec![0.0, 1.0]),
            Err(RagError::Provider {
                status: 429,
                body: "slow down".into(),
            }),
        ]);
        let indexer = TaskIndexer::new(embedder.clone(), store.clone());
        let mut task = TaskSnapshot::new(5, "Draft");

        indexer.index_task(&task).await.unwrap();
        task.title = Some("Final".into());
        indexer.index_task(&task).await.unwrap();

        let records = store.get_all_embeddings(&RecordKind::Task).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].vector.as_slice(), &[0.0, 1.0]);

        task.title = Some("Renamed to tax filing".into());
        assert!(indexer.index_task(&task).await.is_err());
        assert!(store
            .get_all_embeddings(&RecordKind::Task)
            .await
            .unwrap()
            .is_empty());
        let saved = store.get_tasks_by_ids(&[5]).await.unwrap();
        assert_eq!(saved[0].title.as_deref(), Some("Renamed to tax filing"));

        let inputs = embedder.inputs.lock().unwrap();
        assert!(inputs[0].contains("Task Title: Draft"));
        assert!(inputs[1].contains("Task Title: Final"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn remove_deletes_task_and_vector() {
        let store = Arc::new(MemoryStore::new());
        let embedder = ScriptedEmbedder::new(vec![Ok(vec![1.0])]);
        let indexer = TaskIndexer::new(embedder, store.clone());
        let task = TaskSnapshot::new(1, "Gone soon");

        indexer.index_task(&task).await.unwrap();
        indexer.remove_task(task.id, &task.kind).await.unwrap();

        assert_eq!(store.embedding_count().await, 0);
        assert!(store.get_tasks_by_ids(&[1]).await.unwrap().is_empty());
    }
}
