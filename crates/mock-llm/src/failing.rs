//! Failing model - always errors, or panics, to exercise fallbacks.

use async_trait::async_trait;
use safety_core::{Completion, CompletionRequest, LanguageModel, SafetyError};

/// How a [`FailingModel`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Network,
    Api(u16),
    Panic,
}

/// A model whose every call fails.
#[derive(Debug, Clone)]
pub struct FailingModel {
    mode: Mode,
}

impl FailingModel {
    /// Fail with a network error.
    pub fn network() -> Self {
        Self { mode: Mode::Network }
    }

    /// Fail with an API error carrying `status`.
    pub fn api(status: u16) -> Self {
        Self {
            mode: Mode::Api(status),
        }
    }

    /// Panic inside the call, simulating a bug rather than a transport error.
    pub fn panicking() -> Self {
        Self { mode: Mode::Panic }
    }
}

#[async_trait]
impl LanguageModel for FailingModel {
    async fn complete(&self, _request: CompletionRequest) -> Result<Completion, SafetyError> {
        match self.mode {
            Mode::Network => Err(SafetyError::Network("connection refused".to_string())),
            Mode::Api(status) => Err(SafetyError::Api {
                status,
                message: "upstream failure".to_string(),
            }),
            Mode::Panic => panic!("FailingModel configured to panic"),
        }
    }

    fn name(&self) -> &str {
        "FailingModel"
    }
}
