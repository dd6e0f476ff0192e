use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ChatMessage, CompletionProvider, ProviderRequest};
use crate::config::AzureConfig;
use crate::error::{RagError, Result};

/// Chat-completions client for an Azure OpenAI chat deployment.
pub struct AzureChatProvider {
    client: Client,
    endpoint: url::Url,
    model: String,
}

impl AzureChatProvider {
    /// Builds a new client from the shared Azure settings.
    pub fn new(config: &AzureConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "api-key",
            HeaderValue::from_str(config.api_key())
                .map_err(|_| RagError::InvalidInput("invalid Azure OpenAI API key".into()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|err| RagError::Transport(format!("failed to build chat HTTP client: {err}")))?;
        let endpoint = config.deployment_url(config.chat_deployment(), "chat/completions")?;
        Ok(Self {
            client,
            endpoint,
            model: config.chat_model().to_string(),
        })
    }
}

#[async_trait]
impl CompletionProvider for AzureChatProvider {
    async fn complete(&self, request: &ProviderRequest<'_>) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
        };
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            warn!(status = status.as_u16(), "chat completion rejected");
            return Err(RagError::Provider {
                status: status.as_u16(),
                body: text,
            });
        }
        let parsed: ChatResponse = resp.json().await?;
        let answer = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        Ok(answer)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage<'a>],
    max_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Role;
    use serde_json::json;

    #[test]
    fn request_body_matches_chat_shape() {
        let messages = [
            ChatMessage {
                role: Role::System,
                content: "sys",
            },
            ChatMessage {
                role: Role::User,
                content: "hi",
            },
        ];
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            max_tokens: 500,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "model": "gpt-4o-mini",
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "hi" }
                ],
                "max_tokens": 500
            })
        );
    }

    #[test]
    fn null_content_parses_as_missing() {
        let parsed: ChatResponse =
            serde_json::from_value(json!({ "choices": [{ "message": { "content": null } }] }))
                .unwrap();
        assert_eq!(parsed.choices[0].message.content, None);
    }
}
