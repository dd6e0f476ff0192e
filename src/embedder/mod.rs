//! Text-to-vector clients.

use async_trait::async_trait;

use crate::embeddings::EmbeddingVector;
use crate::error::Result;

pub mod azure;

pub use azure::AzureEmbedder;

/// Trait implemented by concrete embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds `text`, returning a validated vector or a typed failure.
    ///
    /// Empty input fails with `InvalidInput` before any network traffic.
    async fn embed(&self, text: &str) -> Result<EmbeddingVector>;
}
