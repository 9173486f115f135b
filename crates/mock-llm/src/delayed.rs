//! Delayed model - wraps another model with artificial delay.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use safety_core::{Completion, CompletionRequest, LanguageModel, SafetyError};
use tokio::time::sleep;

/// A model that wraps another model and adds artificial delay.
///
/// Useful for showing that classifier calls overlap instead of running in turn.
pub struct DelayedModel<M: LanguageModel> {
    inner: Arc<M>,
    delay: Duration,
}

impl<M: LanguageModel> DelayedModel<M> {
    /// Create a new DelayedModel wrapping the given model with the specified delay.
    pub fn new(inner: M, delay: Duration) -> Self {
        Self::shared(Arc::new(inner), delay)
    }

    /// Wrap a model the caller keeps a handle to, e.g. to count calls.
    pub fn shared(inner: Arc<M>, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Create a model with a delay in milliseconds.
    pub fn with_millis(inner: M, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }
}

#[async_trait]
impl<M: LanguageModel> LanguageModel for DelayedModel<M> {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, SafetyError> {
        sleep(self.delay).await;
        self.inner.complete(request).await
    }

    fn name(&self) -> &str {
        "DelayedModel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedModel;
    use std::time::Instant;

    #[tokio::test]
    async fn test_delayed_model() {
        let model = DelayedModel::with_millis(ScriptedModel::new("ok"), 100);

        let start = Instant::now();
        let completion = model.complete(CompletionRequest::new("test")).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(completion.text, "ok");
        assert!(elapsed >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_shared_inner_sees_calls() {
        let inner = Arc::new(ScriptedModel::new("ok"));
        let model = DelayedModel::shared(inner.clone(), Duration::from_millis(1));

        model.complete(CompletionRequest::new("a")).await.unwrap();
        model.complete(CompletionRequest::new("b")).await.unwrap();

        assert_eq!(inner.call_count(), 2);
    }

    #[tokio::test]
    async fn test_model_name() {
        let model = DelayedModel::with_millis(ScriptedModel::new("ok"), 0);
        assert_eq!(model.name(), "DelayedModel");
    }
}
