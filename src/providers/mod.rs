//! Text-generation providers.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

mod azure;

pub use azure::AzureChatProvider;

/// Trait implemented by concrete LLM providers.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Sends the conversation and returns the generated text.
    ///
    /// An empty string is a valid return here; the caller decides whether it
    /// is usable.
    async fn complete(&self, request: &ProviderRequest<'_>) -> Result<String>;
}

/// Chat role attached to each message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructional framing.
    System,
    /// End-user turn.
    User,
}

/// One role-tagged message.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChatMessage<'a> {
    /// Message role.
    pub role: Role,
    /// Message body.
    pub content: &'a str,
}

/// Request envelope shared by the various providers.
#[derive(Debug, Clone)]
pub struct ProviderRequest<'a> {
    /// Ordered conversation.
    pub messages: Vec<ChatMessage<'a>>,
    /// Completion token budget.
    pub max_tokens: usize,
}
