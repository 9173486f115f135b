//! OpenAiClient implementation.

use reqwest::Client;
use safety_core::{
    async_trait, Completion, CompletionRequest, LanguageModel, ModerationProvider,
    ModerationVerdict, SafetyError, TokenUsage,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api_types::{
    ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ModerationRequest,
    ModerationResponse,
};
use crate::config::OpenAiConfig;

/// Client for OpenAI-compatible completion and moderation endpoints.
///
/// Stateless: every call is a single request with no retries and no caching.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self, SafetyError> {
        let client = Client::builder().build().map_err(|e| {
            SafetyError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        info!(
            "OpenAiClient initialized with model: {}, moderation model: {}",
            config.model, config.moderation_model
        );

        Ok(Self { client, config })
    }

    /// Create a client from environment variables.
    ///
    /// See [`OpenAiConfig::from_env`] for required environment variables.
    pub fn from_env() -> Result<Self, SafetyError> {
        Self::new(OpenAiConfig::from_env()?)
    }

    /// Build the chat request body, applying config defaults.
    fn build_chat_request(&self, request: CompletionRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(request.user));

        ChatCompletionRequest {
            model: request.model.unwrap_or_else(|| self.config.model.clone()),
            messages,
            max_tokens: request.max_tokens.or(self.config.max_tokens),
            temperature: request.temperature.or(self.config.temperature),
        }
    }

    /// POST a JSON body and decode a JSON response.
    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, SafetyError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.config.api_url.trim_end_matches('/'), path);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| SafetyError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| SafetyError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

/// Map a non-success response body to an error, preferring the API's own message.
fn api_error(status: u16, body: &str) -> SafetyError {
    let message = match serde_json::from_str::<ApiError>(body) {
        Ok(ApiError { error }) => match error.error_type {
            Some(kind) => format!("{} ({})", error.message, kind),
            None => error.message,
        },
        Err(_) => body.to_string(),
    };

    SafetyError::Api { status, message }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, SafetyError> {
        let body = self.build_chat_request(request);
        debug!(model = %body.model, "Sending chat completion request");

        let completion: ChatCompletionResponse =
            self.post_json("/v1/chat/completions", &body).await?;

        let choice = completion.choices.first();
        debug!(
            id = %completion.id,
            finish_reason = ?choice.and_then(|c| c.finish_reason.as_deref()),
            "Chat completion received"
        );

        let text = choice
            .and_then(|c| c.message.content.clone())
            .unwrap_or_else(|| {
                warn!(id = %completion.id, "No content in completion response");
                String::new()
            });

        let usage = completion
            .usage
            .map(|u| TokenUsage {
                input: u.prompt_tokens,
                output: u.completion_tokens,
                total: u.total_tokens,
            })
            .unwrap_or_default();

        debug!(
            "Token usage - prompt: {}, completion: {}, total: {}",
            usage.input, usage.output, usage.total
        );

        let model = if completion.model.is_empty() {
            body.model
        } else {
            completion.model
        };

        Ok(Completion { text, model, usage })
    }

    fn name(&self) -> &str {
        "OpenAiClient"
    }
}

#[async_trait]
impl ModerationProvider for OpenAiClient {
    async fn moderate(&self, text: &str) -> Result<ModerationVerdict, SafetyError> {
        let body = ModerationRequest {
            model: self.config.moderation_model.clone(),
            input: text.to_string(),
        };

        let response: ModerationResponse = self.post_json("/v1/moderations", &body).await?;

        let result = response.results.into_iter().next().ok_or_else(|| {
            SafetyError::InvalidResponse("moderation response had no results".to_string())
        })?;

        Ok(ModerationVerdict {
            flagged: result.flagged,
            categories: result.categories,
            category_scores: result.category_scores,
        })
    }
}
