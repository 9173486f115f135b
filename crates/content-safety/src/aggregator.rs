//! Concurrent fan-out over the classifier bank and the block decision.

use safety_core::{ContentFlags, Flag, PartialFlags, Severity};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::bank::ClassifierBank;
use crate::classifier::Classifier;
use crate::error::ContentSafetyError;

/// Which raised flags block a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPolicy {
    /// Flags at or above this severity block.
    pub threshold: Severity,
}

impl Default for BlockPolicy {
    /// Every flag blocks.
    fn default() -> Self {
        Self {
            threshold: Severity::Low,
        }
    }
}

impl BlockPolicy {
    pub fn new(threshold: Severity) -> Self {
        Self { threshold }
    }

    /// Read the threshold from `BLOCK_SEVERITY` (`low`, `medium`, `high` or
    /// `critical`). Unset means `low`.
    pub fn from_env() -> Result<Self, ContentSafetyError> {
        match std::env::var("BLOCK_SEVERITY") {
            Ok(value) => value
                .parse::<Severity>()
                .map(Self::new)
                .map_err(|e| ContentSafetyError::Configuration(format!("BLOCK_SEVERITY: {}", e))),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Raised flags that block under this policy.
    pub fn blocking(&self, flags: &ContentFlags) -> Vec<Flag> {
        flags
            .raised()
            .into_iter()
            .filter(|flag| flag.severity() >= self.threshold)
            .collect()
    }

    pub fn blocks(&self, flags: &ContentFlags) -> bool {
        !self.blocking(flags).is_empty()
    }
}

/// Outcome of running every classifier over one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentCheck {
    /// Merged verdict; every key present.
    pub violations: ContentFlags,
    /// False if the request must be blocked.
    pub should_proceed: bool,
    /// Flags that caused the block, in declaration order.
    #[serde(default)]
    pub blocking: Vec<Flag>,
}

impl ContentCheck {
    /// The result used when the checks themselves could not complete.
    pub fn fail_closed() -> Self {
        Self {
            violations: ContentFlags::default(),
            should_proceed: false,
            blocking: Vec::new(),
        }
    }

    /// User-facing explanation of a block.
    ///
    /// Names every blocking flag, e.g. `Content blocked: prompt injection detected`.
    pub fn blocked_message(&self) -> String {
        if self.blocking.is_empty() {
            return "Content blocked: safety checks could not be completed".to_string();
        }

        let labels: Vec<&str> = self.blocking.iter().map(Flag::label).collect();
        format!("Content blocked: {} detected", labels.join(", "))
    }
}

/// Runs the classifier bank concurrently and decides pass or block.
#[derive(Clone)]
pub struct ContentChecker {
    bank: ClassifierBank,
    policy: BlockPolicy,
}

impl ContentChecker {
    pub fn new(bank: ClassifierBank, policy: BlockPolicy) -> Self {
        info!("Content checker blocks at severity {} and above", policy.threshold);
        Self { bank, policy }
    }

    /// Run every classifier on `text` and merge the verdicts.
    ///
    /// Classifiers run as sibling tasks; one failing classifier only loses its
    /// own verdict. If a task panics or is cancelled the whole check fails
    /// closed.
    pub async fn perform_content_checks(&self, text: &str) -> ContentCheck {
        let text: std::sync::Arc<str> = text.into();
        let mut tasks = JoinSet::new();

        {
            let bank = self.bank.clone();
            let text = text.clone();
            tasks.spawn(async move { bank.moderation_check(&text).await });
        }

        for classifier in Classifier::ALL {
            let bank = self.bank.clone();
            let text = text.clone();
            tasks.spawn(async move {
                let verdict = bank.detect(classifier, &text).await;
                PartialFlags::new().with(classifier.flag(), verdict)
            });
        }

        let mut violations = ContentFlags::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(partial) => violations.merge(&partial),
                Err(e) => {
                    error!(error = %e, panicked = e.is_panic(), "CONTENT_CHECKS_FAILED");
                    tasks.abort_all();
                    return ContentCheck::fail_closed();
                }
            }
        }

        let blocking = self.policy.blocking(&violations);
        let check = ContentCheck {
            violations,
            should_proceed: blocking.is_empty(),
            blocking,
        };

        debug!(
            should_proceed = check.should_proceed,
            raised = ?check.violations.raised(),
            "CONTENT_CHECKS_COMPLETE"
        );

        check
    }
}
