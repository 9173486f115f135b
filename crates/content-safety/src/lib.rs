//! Content-safety pipeline for educator tool requests.
//!
//! This crate decides whether a tool request may reach the generation model
//! and records what every call cost.
//!
//! # Architecture
//!
//! ```text
//! Tool request text
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CONTENT CHECKER                          │
//! │                                                             │
//! │  JoinSet fan-out, one task per classifier:                  │
//! │     • moderation_check      → several flags                 │
//! │     • detect_injection      → prompt_injection_detected     │
//! │     • detect_misinformation → misinformation_detected       │
//! │     • detect_pii            → pii_detected                  │
//! │     • detect_bias           → bias_detected                 │
//! │     • detect_fraudulent_intent → fraudulent_intent_detected │
//! │     • detect_automation_misuse → automation_misuse_detected │
//! │         ↓                                                   │
//! │  OR-merge into ContentFlags, apply BlockPolicy              │
//! └─────────────────────────────────────────────────────────────┘
//!          ↓
//! ContentCheck { violations, should_proceed }
//!          ↓
//! MetricsRecorder → ai_tool_metrics row
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use content_safety::{BlockPolicy, ClassifierBank, ContentChecker};
//! use openai_client::OpenAiClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(OpenAiClient::from_env()?);
//!     let checker = ContentChecker::new(
//!         ClassifierBank::new(client.clone(), client),
//!         BlockPolicy::default(),
//!     );
//!
//!     let check = checker.perform_content_checks("Explain photosynthesis").await;
//!     if !check.should_proceed {
//!         println!("{}", check.blocked_message());
//!     }
//!     Ok(())
//! }
//! ```

mod aggregator;
mod bank;
mod classifier;
mod error;
mod pricing;
mod recorder;

pub use aggregator::{BlockPolicy, ContentCheck, ContentChecker};
pub use bank::{moderation_flags, ClassifierBank};
pub use classifier::{parse_verdict, Classifier};
pub use error::ContentSafetyError;
pub use pricing::{usd_to_micros, ModelPrice, PricingTable};
pub use recorder::{MetricsParams, MetricsRecorder};
