#![warn(missing_docs)]
//! Core library entry points for the taskrag query engine.

pub mod answer;
pub mod config;
pub mod context;
pub mod embedder;
pub mod embeddings;
pub mod error;
pub mod indexer;
pub mod providers;
pub mod ranker;
pub mod tasks;
pub mod vector_store;

pub use answer::{AnswerGenerator, GENERIC_ERROR_MESSAGE, NO_CONTEXT_MESSAGE};
pub use config::{AzureArgs, AzureConfig, RagOptions};
pub use context::{sanitize_field, ContextAssembler, ContextEntry};
pub use embedder::{AzureEmbedder, EmbeddingProvider};
pub use embeddings::{EmbeddingRecord, EmbeddingVector, RecordKind, StoredEmbedding};
pub use error::RagError;
pub use indexer::TaskIndexer;
pub use providers::{AzureChatProvider, CompletionProvider};
pub use ranker::{cosine_similarity, rank_top_n, RankedCandidate};
pub use tasks::TaskSnapshot;
pub use vector_store::{MemoryStore, PgStore, VectorStore};
