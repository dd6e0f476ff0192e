//! End-to-end question answering over the stored task embeddings.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::RagOptions;
use crate::context::ContextAssembler;
use crate::embedder::EmbeddingProvider;
use crate::embeddings::RecordKind;
use crate::error::{RagError, Result};
use crate::providers::{ChatMessage, CompletionProvider, ProviderRequest, Role};
use crate::ranker::rank_top_n;
use crate::vector_store::VectorStore;

/// Returned for every failure other than "nothing matched".
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred while processing your request.";
/// Returned when no stored task is relevant to the query.
pub const NO_CONTEXT_MESSAGE: &str = "No relevant context found to answer your query.";

const SYSTEM_PROMPT: &str = "You are a helpful, context-aware assistant.";

/// Builds the user prompt around the literal query and the rendered context.
pub fn build_prompt(query: &str, context: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are an intelligent assistant tasked with answering user queries based on on_going_task and past_completed_task information.\n\n");
    prompt.push_str("User Query: ");
    prompt.push_str(query);
    prompt.push_str("\n\nRelevant Context:\n");
    prompt.push_str(context);
    prompt.push_str("\n\nPlease generate a helpful, concise, and actionable response.");
    prompt
}

/// Retrieval-augmented answerer.
///
/// Holds only shared, immutable collaborators, so one instance can serve
/// concurrent queries.
#[derive(Clone)]
pub struct AnswerGenerator {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    completions: Arc<dyn CompletionProvider>,
    assembler: ContextAssembler,
    options: RagOptions,
}

impl AnswerGenerator {
    /// Wires the pipeline from its three collaborators.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        completions: Arc<dyn CompletionProvider>,
        options: RagOptions,
    ) -> Self {
        Self {
            embedder,
            assembler: ContextAssembler::new(Arc::clone(&store)),
            store,
            completions,
            options,
        }
    }

    /// Answers `query`, always returning displayable text.
    ///
    /// Failures collapse into [`GENERIC_ERROR_MESSAGE`]; an empty match set
    /// yields [`NO_CONTEXT_MESSAGE`].
    pub async fn answer(&self, query: Option<&str>) -> String {
        match self.try_answer(query).await {
            Ok(text) => text,
            Err(RagError::NoContext) => {
                info!("no relevant context for query");
                NO_CONTEXT_MESSAGE.to_string()
            }
            Err(err) => {
                error!(kind = err.kind(), error = %err, "failed to answer query");
                GENERIC_ERROR_MESSAGE.to_string()
            }
        }
    }

    /// Typed variant of [`AnswerGenerator::answer`].
    pub async fn try_answer(&self, query: Option<&str>) -> Result<String> {
        let query = validate_query(query)?;
        self.options.validate()?;
        let context = self.retrieve_context(query).await?;

        let prompt = build_prompt(query, &context);
        let request = ProviderRequest {
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: Role::User,
                    content: &prompt,
                },
            ],
            max_tokens: self.options.max_completion_tokens,
        };
        let answer = self.completions.complete(&request).await?;
        if answer.trim().is_empty() {
            return Err(RagError::EmptyCompletion);
        }
        debug!(chars = answer.len(), "generated answer");
        Ok(answer)
    }

    /// Embeds the query, ranks stored tasks, and renders the context block
    /// without calling the generation provider.
    pub async fn retrieve_context(&self, query: &str) -> Result<String> {
        let query = validate_query(Some(query))?;
        let (query_vector, candidates) = tokio::join!(
            self.embedder.embed(query),
            self.store.get_all_embeddings(&RecordKind::Task)
        );
        let query_vector = query_vector?;
        let candidates = candidates?;
        if candidates.is_empty() {
            return Err(RagError::NoContext);
        }

        let ranked = rank_top_n(&query_vector, &candidates, self.options.top_k)?;
        let ids: Vec<i64> = ranked
            .iter()
            .filter(|candidate| candidate.kind == RecordKind::Task)
            .map(|candidate| candidate.id)
            .collect();
        self.assembler
            .assemble(&ids, self.options.max_entries)
            .await
    }
}

fn validate_query(query: Option<&str>) -> Result<&str> {
    query
        .filter(|q| !q.is_empty())
        .ok_or_else(|| RagError::InvalidInput("query must be a non-empty string".into()))
}
