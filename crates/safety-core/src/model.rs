//! Seams to hosted models: text generation and moderation.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SafetyError;

/// Token counts reported by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u32,
    pub output: u32,
    pub total: u32,
}

impl TokenUsage {
    pub fn new(input: u32, output: u32) -> Self {
        Self {
            input,
            output,
            total: input + output,
        }
    }
}

/// A single-turn completion request.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// System instructions.
    pub system: Option<String>,
    /// The user turn.
    pub user: String,
    /// Model override; the client's default is used when unset.
    pub model: Option<String>,
    /// Sampling temperature override.
    pub temperature: Option<f32>,
    /// Response length cap override.
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Create a request for the given user text.
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..Default::default()
        }
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Pin the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Cap the response length.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A completion returned by a model.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Generated text.
    pub text: String,
    /// Model that produced the text.
    pub model: String,
    /// Token usage for the call.
    pub usage: TokenUsage,
}

/// Output of a general-purpose moderation classifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModerationVerdict {
    /// Whether the provider flagged the text at all.
    pub flagged: bool,
    /// Per-category decisions, keyed by provider category name
    /// (e.g. `self-harm/intent`).
    pub categories: HashMap<String, bool>,
    /// Per-category scores in `[0, 1]`.
    pub category_scores: HashMap<String, f64>,
}

impl ModerationVerdict {
    /// True if the named category was flagged.
    pub fn category(&self, name: &str) -> bool {
        self.categories.get(name).copied().unwrap_or(false)
    }

    /// True if any category in the family (`name` or `name/...`) was flagged.
    pub fn family(&self, name: &str) -> bool {
        self.categories.iter().any(|(category, flagged)| {
            *flagged
                && (category == name
                    || category
                        .strip_prefix(name)
                        .is_some_and(|rest| rest.starts_with('/')))
        })
    }
}

/// A hosted text-generation model.
///
/// Object-safe so implementations can be shared as `Arc<dyn LanguageModel>`.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run a single completion.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, SafetyError>;

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}

/// A hosted general-purpose moderation classifier.
#[async_trait]
pub trait ModerationProvider: Send + Sync {
    /// Classify a text.
    async fn moderate(&self, text: &str) -> Result<ModerationVerdict, SafetyError>;
}
