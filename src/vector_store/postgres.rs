//! Postgres-backed store using `tokio-postgres`.

use async_trait::async_trait;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{error, warn};

use super::VectorStore;
use crate::embeddings::{EmbeddingRecord, EmbeddingVector, RecordKind, StoredEmbedding};
use crate::error::{RagError, Result};
use crate::tasks::TaskSnapshot;

/// Fully-qualified Postgres table name (schema + table).
#[derive(Debug, Clone)]
pub struct TableName {
    schema: String,
    table: String,
}

impl TableName {
    /// Builds a new table identifier.
    pub fn new<S, T>(schema: S, table: T) -> Result<Self>
    where
        S: Into<String>,
        T: Into<String>,
    {
        let schema = schema.into();
        let table = table.into();
        if schema.trim().is_empty() || table.trim().is_empty() {
            return Err(RagError::InvalidInput(
                "schema and table names are required".into(),
            ));
        }
        Ok(Self { schema, table })
    }

    /// Fully-qualified table reference with quoted identifiers.
    pub fn qualified(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table))
    }
}

/// Quotes Postgres identifiers, escaping embedded quotes.
pub fn quote_ident(input: &str) -> String {
    let escaped = input.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// `VectorStore` over two Postgres tables: task snapshots and embeddings.
///
/// Vectors live in a `BYTEA` column as little-endian `f32` blobs. Rows written
/// by older clients may instead carry a JSON array in `embedding_json`.
pub struct PgStore {
    client: Client,
    embeddings: TableName,
    tasks: TableName,
}

impl PgStore {
    /// Connects and spawns the connection driver onto the current runtime.
    pub async fn connect(database_url: &str, schema: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(database_url, NoTls).await?;
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                error!(error = %err, "postgres connection error");
            }
        });
        Self::with_client(client, schema)
    }

    /// Wraps an existing client.
    pub fn with_client(client: Client, schema: &str) -> Result<Self> {
        Ok(Self {
            client,
            embeddings: TableName::new(schema, "task_embeddings")?,
            tasks: TableName::new(schema, "tasks")?,
        })
    }

    /// Creates both tables if they are missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        let tasks_ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id BIGINT PRIMARY KEY,
                parent_id BIGINT,
                title TEXT,
                description TEXT,
                status TEXT,
                priority TEXT,
                due_date TEXT,
                created_at TEXT,
                completion_date TEXT,
                type TEXT NOT NULL DEFAULT 'task'
            )",
            self.tasks.qualified()
        );
        let embeddings_ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id BIGINT NOT NULL,
                type TEXT NOT NULL,
                embedding BYTEA,
                embedding_json TEXT,
                PRIMARY KEY (id, type)
            )",
            self.embeddings.qualified()
        );
        self.client.batch_execute(&tasks_ddl).await?;
        self.client.batch_execute(&embeddings_ddl).await?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for PgStore {
    async fn put_embedding(
        &self,
        id: i64,
        kind: &RecordKind,
        vector: &EmbeddingVector,
    ) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (id, type, embedding, embedding_json) VALUES ($1, $2, $3, NULL) \
                ON CONFLICT (id, type) DO UPDATE SET \
                    embedding = EXCLUDED.embedding, \
                    embedding_json = NULL",
            self.embeddings.qualified()
        );
        let blob = vector.to_blob();
        self.client
            .execute(&sql, &[&id, &kind.as_str(), &blob])
            .await?;
        Ok(())
    }

    async fn get_all_embeddings(&self, kind: &RecordKind) -> Result<Vec<EmbeddingRecord>> {
        let sql = format!(
            "SELECT id, embedding, embedding_json FROM {} WHERE type = $1 ORDER BY id",
            self.embeddings.qualified()
        );
        let rows = self.client.query(&sql, &[&kind.as_str()]).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.get("id");
            let blob: Option<Vec<u8>> = row.get("embedding");
            let json: Option<String> = row.get("embedding_json");
            let stored = match (blob, json) {
                (Some(bytes), _) => StoredEmbedding::Blob(bytes),
                (None, Some(text)) => StoredEmbedding::Json(text),
                (None, None) => {
                    warn!(id, "embedding row has no payload");
                    continue;
                }
            };
            match stored.decode() {
                Ok(vector) => out.push(EmbeddingRecord {
                    id,
                    kind: kind.clone(),
                    vector,
                }),
                Err(err) => warn!(id, error = %err, "skipping undecodable embedding"),
            }
        }
        Ok(out)
    }

    async fn delete_embedding(&self, id: i64, kind: &RecordKind) -> Result<()> {
        let sql = format!(
            "DELETE FROM {} WHERE id = $1 AND type = $2",
            self.embeddings.qualified()
        );
        self.client.execute(&sql, &[&id, &kind.as_str()]).await?;
        Ok(())
    }

    async fn get_tasks_by_ids(&self, ids: &[i64]) -> Result<Vec<TaskSnapshot>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, parent_id, title, description, status, priority, due_date, \
                created_at, completion_date, type \
             FROM {} WHERE id = ANY($1)",
            self.tasks.qualified()
        );
        let ids = ids.to_vec();
        let rows = self.client.query(&sql, &[&ids]).await?;
        Ok(rows.iter().map(task_from_row).collect())
    }

    async fn put_task(&self, task: &TaskSnapshot) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} \
                (id, parent_id, title, description, status, priority, due_date, created_at, completion_date, type) \
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (id) DO UPDATE SET \
                parent_id = EXCLUDED.parent_id, \
                title = EXCLUDED.title, \
                description = EXCLUDED.description, \
                status = EXCLUDED.status, \
                priority = EXCLUDED.priority, \
                due_date = EXCLUDED.due_date, \
                created_at = EXCLUDED.created_at, \
                completion_date = EXCLUDED.completion_date, \
                type = EXCLUDED.type",
            self.tasks.qualified()
        );
        self.client
            .execute(
                &sql,
                &[
                    &task.id,
                    &task.parent_id,
                    &task.title,
                    &task.description,
                    &task.status,
                    &task.priority,
                    &task.due_date,
                    &task.created_at,
                    &task.completion_date,
                    &task.kind.as_str(),
                ],
            )
            .await?;
        Ok(())
    }

    async fn delete_task(&self, id: i64) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.tasks.qualified());
        self.client.execute(&sql, &[&id]).await?;
        Ok(())
    }
}

fn task_from_row(row: &Row) -> TaskSnapshot {
    let kind: String = row.get("type");
    TaskSnapshot {
        id: row.get("id"),
        parent_id: row.get("parent_id"),
        title: row.get("title"),
        description: row.get("description"),
        status: row.get("status"),
        priority: row.get("priority"),
        due_date: row.get("due_date"),
        created_at: row.get("created_at"),
        completion_date: row.get("completion_date"),
        kind: RecordKind::from(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_identifiers() {
        let table = TableName::new("public", "task\"embeddings").unwrap();
        assert_eq!(table.qualified(), "\"public\".\"task\"\"embeddings\"");
    }

    #[test]
    fn rejects_blank_names() {
        assert!(TableName::new(" ", "tasks").is_err());
        assert!(TableName::new("public", "").is_err());
    }
}
