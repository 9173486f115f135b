//! The classifier bank: independent safety questions over one text.

use std::sync::Arc;

use safety_core::{
    hash_prompt, CompletionRequest, Flag, LanguageModel, ModerationProvider, ModerationVerdict,
    PartialFlags,
};
use tracing::{debug, info, trace, warn};

use crate::classifier::{parse_verdict, Classifier};

/// Moderation families that count toward the automation-misuse composite.
const AUTOMATION_FAMILIES: [&str; 4] = ["hate", "violence", "self-harm", "illicit"];

/// Classifier answers are a single word.
const CLASSIFIER_MAX_TOKENS: u32 = 5;

/// A set of independent classifiers sharing one model and one moderation
/// provider.
///
/// Every check swallows its own failures: a transport error, an API error
/// or an unparseable answer yields the conservative default (`false`, or an
/// empty verdict for the moderation check) and a warning.
#[derive(Clone)]
pub struct ClassifierBank {
    model: Arc<dyn LanguageModel>,
    moderation: Arc<dyn ModerationProvider>,
    classifier_model: Option<String>,
}

impl ClassifierBank {
    /// Create a bank over the given model and moderation provider.
    pub fn new(model: Arc<dyn LanguageModel>, moderation: Arc<dyn ModerationProvider>) -> Self {
        for classifier in Classifier::ALL {
            info!(
                "Classifier {} prompt fingerprint: {}",
                classifier.name(),
                hash_prompt(&classifier.system_prompt())
            );
        }

        Self {
            model,
            moderation,
            classifier_model: None,
        }
    }

    /// Use a specific model for classifier calls instead of the client default.
    pub fn with_classifier_model(mut self, model: impl Into<String>) -> Self {
        self.classifier_model = Some(model.into());
        self
    }

    /// Run the general-purpose moderation classifier.
    pub async fn moderation_check(&self, text: &str) -> PartialFlags {
        if text.trim().is_empty() {
            return PartialFlags::new();
        }

        match self.moderation.moderate(text).await {
            Ok(verdict) => {
                trace!(flagged = verdict.flagged, categories = ?verdict.categories, "MODERATION_VERDICT");
                moderation_flags(&verdict)
            }
            Err(e) => {
                warn!(error = %e, "MODERATION_CHECK_FAILED");
                PartialFlags::new()
            }
        }
    }

    /// Ask one LLM classifier about `text`.
    pub async fn detect(&self, classifier: Classifier, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }

        let mut request = CompletionRequest::new(text)
            .with_system(classifier.system_prompt())
            .with_temperature(0.0)
            .with_max_tokens(CLASSIFIER_MAX_TOKENS);
        request.model = self.classifier_model.clone();

        match self.model.complete(request).await {
            Ok(completion) => match parse_verdict(&completion.text) {
                Some(verdict) => {
                    debug!(classifier = classifier.name(), verdict, "CLASSIFIER_VERDICT");
                    verdict
                }
                None => {
                    warn!(
                        classifier = classifier.name(),
                        raw_response = %completion.text,
                        "CLASSIFIER_PARSE_FAILED"
                    );
                    false
                }
            },
            Err(e) => {
                warn!(
                    classifier = classifier.name(),
                    model = self.model.name(),
                    error = %e,
                    "CLASSIFIER_FAILED"
                );
                false
            }
        }
    }

    pub async fn detect_injection(&self, text: &str) -> bool {
        self.detect(Classifier::Injection, text).await
    }

    pub async fn detect_misinformation(&self, text: &str) -> bool {
        self.detect(Classifier::Misinformation, text).await
    }

    pub async fn detect_pii(&self, text: &str) -> bool {
        self.detect(Classifier::Pii, text).await
    }

    pub async fn detect_bias(&self, text: &str) -> bool {
        self.detect(Classifier::Bias, text).await
    }

    pub async fn detect_fraudulent_intent(&self, text: &str) -> bool {
        self.detect(Classifier::FraudulentIntent, text).await
    }

    pub async fn detect_automation_misuse(&self, text: &str) -> bool {
        self.detect(Classifier::AutomationMisuse, text).await
    }
}

/// Map a moderation verdict onto content flags.
pub fn moderation_flags(verdict: &ModerationVerdict) -> PartialFlags {
    let automation_families = AUTOMATION_FAMILIES
        .iter()
        .filter(|family| verdict.family(family))
        .count();

    PartialFlags::new()
        .with(Flag::ContentViolation, verdict.flagged)
        .with(Flag::SelfHarmDetected, verdict.family("self-harm"))
        .with(
            Flag::ExtremistContentDetected,
            verdict.category("violence")
                || verdict.category("hate/threatening")
                || verdict.category("illicit/violent"),
        )
        .with(Flag::ChildSafetyViolation, verdict.category("sexual/minors"))
        .with(
            Flag::BiasDetected,
            verdict.family("harassment") || verdict.family("hate"),
        )
        .with(Flag::AutomationMisuseDetected, automation_families >= 2)
}
