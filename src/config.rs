//! Provider and pipeline configuration shared by the library and the CLI.

use std::time::Duration;

use clap::Args;

use crate::context::DEFAULT_MAX_ENTRIES;
use crate::error::{RagError, Result};

/// Default Azure OpenAI REST API version.
pub const DEFAULT_API_VERSION: &str = "2024-02-15-preview";
/// Default embedding model name sent in the request body.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
/// Default chat model name sent in the request body.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
/// Dimensionality of `text-embedding-ada-002`.
pub const DEFAULT_DIMENSIONS: usize = 1536;

/// Connection settings for an Azure OpenAI resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AzureConfig {
    endpoint: String,
    api_key: String,
    embedding_deployment: String,
    chat_deployment: String,
    api_version: String,
    embedding_model: String,
    chat_model: String,
    dimensions: Option<usize>,
    timeout: Duration,
}

impl AzureConfig {
    /// Builds a config from the four required fields, using defaults for the rest.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        embedding_deployment: impl Into<String>,
        chat_deployment: impl Into<String>,
    ) -> Result<Self> {
        let endpoint = endpoint.into().trim().trim_end_matches('/').to_string();
        let api_key = api_key.into().trim().to_string();
        let embedding_deployment = embedding_deployment.into().trim().to_string();
        let chat_deployment = chat_deployment.into().trim().to_string();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(RagError::InvalidInput(
                "Azure endpoint must be an http(s) URL".into(),
            ));
        }
        if api_key.is_empty() {
            return Err(RagError::InvalidInput("missing Azure OpenAI API key".into()));
        }
        if embedding_deployment.is_empty() || chat_deployment.is_empty() {
            return Err(RagError::InvalidInput(
                "embedding and chat deployment names are required".into(),
            ));
        }
        Ok(Self {
            endpoint,
            api_key,
            embedding_deployment,
            chat_deployment,
            api_version: DEFAULT_API_VERSION.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            dimensions: Some(DEFAULT_DIMENSIONS),
            timeout: Duration::from_secs(30),
        })
    }

    /// Overrides the REST API version query parameter.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Overrides the embedding and chat model names.
    pub fn with_models(mut self, embedding: impl Into<String>, chat: impl Into<String>) -> Self {
        self.embedding_model = embedding.into();
        self.chat_model = chat.into();
        self
    }

    /// Sets the expected embedding length; `None` accepts any length.
    pub fn with_dimensions(mut self, dimensions: Option<usize>) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Sets the per-request transport timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resource endpoint without a trailing slash.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Value for the `api-key` header.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Deployment serving embeddings.
    pub fn embedding_deployment(&self) -> &str {
        &self.embedding_deployment
    }

    /// Deployment serving chat completions.
    pub fn chat_deployment(&self) -> &str {
        &self.chat_deployment
    }

    /// REST API version.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Embedding model name.
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Chat model name.
    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    /// Expected embedding length, if enforced.
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Per-request transport timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn deployment_url(&self, deployment: &str, operation: &str) -> Result<url::Url> {
        let raw = format!(
            "{}/openai/deployments/{}/{}",
            self.endpoint, deployment, operation
        );
        let mut url = url::Url::parse(&raw)
            .map_err(|err| RagError::InvalidInput(format!("invalid Azure URL {raw}: {err}")))?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }
}

/// Tunables for a single `answer()` invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RagOptions {
    /// Candidates kept after similarity ranking.
    pub top_k: usize,
    /// Entries rendered into the prompt context.
    pub max_entries: usize,
    /// Token budget for the generated answer.
    pub max_completion_tokens: usize,
}

impl Default for RagOptions {
    fn default() -> Self {
        Self {
            top_k: 10,
            max_entries: DEFAULT_MAX_ENTRIES,
            max_completion_tokens: 500,
        }
    }
}

impl RagOptions {
    /// Rejects zero limits, which would make every query fail downstream.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("top_k", self.top_k),
            ("max_entries", self.max_entries),
            ("max_completion_tokens", self.max_completion_tokens),
        ] {
            if value == 0 {
                return Err(RagError::InvalidInput(format!("{name} must be at least 1")));
            }
        }
        Ok(())
    }
}

/// Command-line flags for binaries that talk to Azure OpenAI.
#[derive(Args, Debug, Clone)]
pub struct AzureArgs {
    /// Azure OpenAI resource endpoint (https://<resource>.openai.azure.com)
    #[arg(long, env = "AZURE_OPENAI_ENDPOINT")]
    pub azure_endpoint: String,

    /// Azure OpenAI API key
    #[arg(long, env = "AZURE_OPENAI_KEY", hide_env_values = true)]
    pub azure_key: String,

    /// Deployment name serving embeddings
    #[arg(long, env = "AZURE_EMBEDDING_DEPLOYMENT")]
    pub embedding_deployment: String,

    /// Deployment name serving chat completions
    #[arg(long, env = "AZURE_CHAT_DEPLOYMENT")]
    pub chat_deployment: String,

    /// REST API version
    #[arg(long, env = "AZURE_OPENAI_API_VERSION", default_value = DEFAULT_API_VERSION)]
    pub api_version: String,

    /// Embedding model name sent with each request
    #[arg(long, env = "TASKRAG_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    pub embedding_model: String,

    /// Chat model name sent with each request
    #[arg(long, env = "TASKRAG_CHAT_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    pub chat_model: String,

    /// Expected embedding length (0 disables the check)
    #[arg(long, env = "TASKRAG_DIMENSIONS", default_value_t = DEFAULT_DIMENSIONS)]
    pub dimensions: usize,

    /// Seconds before provider requests time out
    #[arg(long, env = "TASKRAG_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl AzureArgs {
    /// Converts the parsed flags into an [`AzureConfig`].
    pub fn build_config(&self) -> Result<AzureConfig> {
        Ok(AzureConfig::new(
            &self.azure_endpoint,
            &self.azure_key,
            &self.embedding_deployment,
            &self.chat_deployment,
        )?
        .with_api_version(&self.api_version)
        .with_models(&self.embedding_model, &self.chat_model)
        .with_dimensions((self.dimensions > 0).then_some(self.dimensions))
        .with_timeout(Duration::from_secs(self.timeout_secs.max(1))))
    }
}
