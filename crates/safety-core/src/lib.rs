//! Core types and traits for the educator tools content-safety pipeline.
//!
//! This crate provides the vocabulary shared by every other crate in the
//! workspace. It defines:
//!
//! - [`ContentFlags`] / [`Flag`] - The fixed ten-dimension safety record
//! - [`PartialFlags`] - A single classifier's sparse verdict
//! - [`ModerationStatus`] and [`transition`] - The moderation lifecycle
//! - [`LanguageModel`] / [`ModerationProvider`] - Seams to hosted models
//! - [`SafetyError`] - Error types for model operations
//!
//! # Example
//!
//! ```rust
//! use safety_core::{ContentFlags, Flag, PartialFlags};
//!
//! let mut flags = ContentFlags::default();
//! flags.merge(&PartialFlags::new().with(Flag::PromptInjectionDetected, true));
//!
//! assert!(flags.any());
//! assert_eq!(flags.raised(), vec![Flag::PromptInjectionDetected]);
//! ```

mod error;
mod flags;
mod model;
mod moderation;
mod prompt;

pub use error::SafetyError;
pub use flags::{ContentFlags, Flag, PartialFlags, Severity};
pub use model::{
    Completion, CompletionRequest, LanguageModel, ModerationProvider, ModerationVerdict,
    TokenUsage,
};
pub use moderation::{transition, ModerationAction, ModerationStatus, Role, TransitionError};
pub use prompt::hash_prompt;

// Re-export async_trait for convenience
pub use async_trait::async_trait;
