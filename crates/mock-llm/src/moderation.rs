//! Fixed moderation verdicts.

use std::collections::HashMap;

use async_trait::async_trait;
use safety_core::{ModerationProvider, ModerationVerdict, SafetyError};

/// A moderation provider that returns the same verdict for every input.
#[derive(Debug, Clone, Default)]
pub struct StaticModeration {
    verdict: ModerationVerdict,
}

impl StaticModeration {
    /// Never flags anything.
    pub fn clean() -> Self {
        Self::default()
    }

    /// Flags the given provider categories (e.g. `"self-harm/intent"`).
    pub fn flagging(categories: &[&str]) -> Self {
        let categories: HashMap<String, bool> = categories
            .iter()
            .map(|category| (category.to_string(), true))
            .collect();
        let category_scores = categories.keys().map(|k| (k.clone(), 0.99)).collect();

        Self {
            verdict: ModerationVerdict {
                flagged: !categories.is_empty(),
                categories,
                category_scores,
            },
        }
    }
}

#[async_trait]
impl ModerationProvider for StaticModeration {
    async fn moderate(&self, _text: &str) -> Result<ModerationVerdict, SafetyError> {
        Ok(self.verdict.clone())
    }
}

/// A moderation provider whose every call fails.
#[derive(Debug, Clone, Default)]
pub struct FailingModeration;

#[async_trait]
impl ModerationProvider for FailingModeration {
    async fn moderate(&self, _text: &str) -> Result<ModerationVerdict, SafetyError> {
        Err(SafetyError::Network("moderation endpoint unreachable".to_string()))
    }
}
