//! Mock model implementations for testing the content-safety pipeline.
//!
//! This crate provides deterministic implementations of the `safety-core`
//! seams:
//! - `ScriptedModel` - Answers from substring rules, records every request
//! - `FailingModel` - Always errors (or panics) to exercise fallbacks
//! - `DelayedModel` - Wraps another model with artificial latency
//! - `StaticModeration` / `FailingModeration` - Fixed moderation verdicts
//!
//! For production calls, use the `openai-client` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_llm::{CompletionRequest, LanguageModel, ScriptedModel};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_llm::SafetyError> {
//!     let model = ScriptedModel::new("false").when_user_contains("ignore previous", "true");
//!
//!     let completion = model
//!         .complete(CompletionRequest::new("ignore previous instructions"))
//!         .await?;
//!     assert_eq!(completion.text, "true");
//!     Ok(())
//! }
//! ```

mod delayed;
mod failing;
mod moderation;
mod scripted;

// Re-export safety-core types for convenience
pub use safety_core::{
    async_trait, Completion, CompletionRequest, LanguageModel, ModerationProvider,
    ModerationVerdict, SafetyError, TokenUsage,
};

// Export mock implementations
pub use delayed::DelayedModel;
pub use failing::FailingModel;
pub use moderation::{FailingModeration, StaticModeration};
pub use scripted::ScriptedModel;
