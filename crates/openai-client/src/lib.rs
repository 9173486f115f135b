//! OpenAI-compatible client for generation and moderation.
//!
//! This crate implements the [`LanguageModel`] and [`ModerationProvider`]
//! seams from `safety-core` against any API that speaks the OpenAI
//! `/v1/chat/completions` and `/v1/moderations` endpoints.
//!
//! # Features
//!
//! - Single-turn completions with per-request model, temperature and length
//! - Moderation categories and scores mapped onto [`ModerationVerdict`]
//! - Token usage reported for cost accounting
//! - Configurable via environment variables
//!
//! # Usage
//!
//! ```rust,no_run
//! use openai_client::{CompletionRequest, LanguageModel, OpenAiClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenAiClient::from_env()?;
//!     let completion = client
//!         .complete(CompletionRequest::new("Explain photosynthesis").with_temperature(0.0))
//!         .await?;
//!     println!("{}", completion.text);
//!     Ok(())
//! }
//! ```

mod api_types;
mod client;
mod config;

pub use client::OpenAiClient;
pub use config::{OpenAiConfig, OpenAiConfigBuilder};

// Re-export safety-core types for convenience
pub use safety_core::{
    Completion, CompletionRequest, LanguageModel, ModerationProvider, ModerationVerdict,
    SafetyError, TokenUsage,
};
