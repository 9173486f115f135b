//! Content flags: the fixed-shape safety record and per-classifier verdicts.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How serious a raised flag is.
///
/// Ordered so that `Severity::Low < Severity::Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Lowercase name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity: {}", other)),
        }
    }
}

/// One safety dimension.
///
/// The serialized names are the storage and wire keys of [`ContentFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    PiiDetected,
    ContentViolation,
    BiasDetected,
    PromptInjectionDetected,
    FraudulentIntentDetected,
    MisinformationDetected,
    SelfHarmDetected,
    ExtremistContentDetected,
    ChildSafetyViolation,
    AutomationMisuseDetected,
}

impl Flag {
    /// Every flag, in declaration order.
    pub const ALL: [Flag; 10] = [
        Flag::PiiDetected,
        Flag::ContentViolation,
        Flag::BiasDetected,
        Flag::PromptInjectionDetected,
        Flag::FraudulentIntentDetected,
        Flag::MisinformationDetected,
        Flag::SelfHarmDetected,
        Flag::ExtremistContentDetected,
        Flag::ChildSafetyViolation,
        Flag::AutomationMisuseDetected,
    ];

    /// The storage key, e.g. `prompt_injection_detected`.
    pub fn key(&self) -> &'static str {
        match self {
            Flag::PiiDetected => "pii_detected",
            Flag::ContentViolation => "content_violation",
            Flag::BiasDetected => "bias_detected",
            Flag::PromptInjectionDetected => "prompt_injection_detected",
            Flag::FraudulentIntentDetected => "fraudulent_intent_detected",
            Flag::MisinformationDetected => "misinformation_detected",
            Flag::SelfHarmDetected => "self_harm_detected",
            Flag::ExtremistContentDetected => "extremist_content_detected",
            Flag::ChildSafetyViolation => "child_safety_violation",
            Flag::AutomationMisuseDetected => "automation_misuse_detected",
        }
    }

    /// Human-readable label used in block messages and emails.
    pub fn label(&self) -> &'static str {
        match self {
            Flag::PiiDetected => "personal information",
            Flag::ContentViolation => "content policy violation",
            Flag::BiasDetected => "bias",
            Flag::PromptInjectionDetected => "prompt injection",
            Flag::FraudulentIntentDetected => "fraudulent intent",
            Flag::MisinformationDetected => "misinformation",
            Flag::SelfHarmDetected => "self-harm",
            Flag::ExtremistContentDetected => "extremist content",
            Flag::ChildSafetyViolation => "child safety violation",
            Flag::AutomationMisuseDetected => "automation misuse",
        }
    }

    /// Severity tier of this flag.
    pub fn severity(&self) -> Severity {
        match self {
            Flag::ChildSafetyViolation
            | Flag::SelfHarmDetected
            | Flag::ExtremistContentDetected
            | Flag::PromptInjectionDetected => Severity::Critical,
            Flag::ContentViolation | Flag::FraudulentIntentDetected | Flag::PiiDetected => {
                Severity::High
            }
            Flag::BiasDetected | Flag::MisinformationDetected => Severity::Medium,
            Flag::AutomationMisuseDetected => Severity::Low,
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The full safety record: one boolean per [`Flag`].
///
/// Every key is always present. Missing keys deserialize as `false`, so a
/// stored record from a failed classifier never yields an absent field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentFlags {
    pub pii_detected: bool,
    pub content_violation: bool,
    pub bias_detected: bool,
    pub prompt_injection_detected: bool,
    pub fraudulent_intent_detected: bool,
    pub misinformation_detected: bool,
    pub self_harm_detected: bool,
    pub extremist_content_detected: bool,
    pub child_safety_violation: bool,
    pub automation_misuse_detected: bool,
}

impl ContentFlags {
    /// Read one flag.
    pub fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::PiiDetected => self.pii_detected,
            Flag::ContentViolation => self.content_violation,
            Flag::BiasDetected => self.bias_detected,
            Flag::PromptInjectionDetected => self.prompt_injection_detected,
            Flag::FraudulentIntentDetected => self.fraudulent_intent_detected,
            Flag::MisinformationDetected => self.misinformation_detected,
            Flag::SelfHarmDetected => self.self_harm_detected,
            Flag::ExtremistContentDetected => self.extremist_content_detected,
            Flag::ChildSafetyViolation => self.child_safety_violation,
            Flag::AutomationMisuseDetected => self.automation_misuse_detected,
        }
    }

    fn slot(&mut self, flag: Flag) -> &mut bool {
        match flag {
            Flag::PiiDetected => &mut self.pii_detected,
            Flag::ContentViolation => &mut self.content_violation,
            Flag::BiasDetected => &mut self.bias_detected,
            Flag::PromptInjectionDetected => &mut self.prompt_injection_detected,
            Flag::FraudulentIntentDetected => &mut self.fraudulent_intent_detected,
            Flag::MisinformationDetected => &mut self.misinformation_detected,
            Flag::SelfHarmDetected => &mut self.self_harm_detected,
            Flag::ExtremistContentDetected => &mut self.extremist_content_detected,
            Flag::ChildSafetyViolation => &mut self.child_safety_violation,
            Flag::AutomationMisuseDetected => &mut self.automation_misuse_detected,
        }
    }

    /// Overwrite one flag.
    pub fn set(&mut self, flag: Flag, value: bool) {
        *self.slot(flag) = value;
    }

    /// OR a value into one flag.
    pub fn raise(&mut self, flag: Flag, value: bool) {
        *self.slot(flag) |= value;
    }

    /// OR a classifier verdict into this record.
    pub fn merge(&mut self, partial: &PartialFlags) {
        for (flag, value) in partial.iter() {
            self.raise(flag, value);
        }
    }

    /// True if any flag is raised.
    pub fn any(&self) -> bool {
        Flag::ALL.iter().any(|flag| self.get(*flag))
    }

    /// Raised flags in declaration order.
    pub fn raised(&self) -> Vec<Flag> {
        Flag::ALL.into_iter().filter(|flag| self.get(*flag)).collect()
    }

    /// Count fraud-flagged content under automation misuse as well.
    pub fn with_automation_widened(mut self) -> Self {
        self.automation_misuse_detected |= self.fraudulent_intent_detected;
        self
    }
}

/// A sparse verdict produced by a single classifier.
///
/// Absent keys mean "this classifier has no opinion", which is distinct from
/// an explicit `false` only for logging purposes; merging treats both alike.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartialFlags(BTreeMap<Flag, bool>);

impl PartialFlags {
    /// Create an empty verdict.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, flag: Flag, value: bool) -> Self {
        self.insert(flag, value);
        self
    }

    /// Record a value for a flag, OR-ing with any earlier value.
    pub fn insert(&mut self, flag: Flag, value: bool) {
        *self.0.entry(flag).or_insert(false) |= value;
    }

    /// Value for a flag, if this classifier reported one.
    pub fn get(&self, flag: Flag) -> Option<bool> {
        self.0.get(&flag).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over reported flags.
    pub fn iter(&self) -> impl Iterator<Item = (Flag, bool)> + '_ {
        self.0.iter().map(|(flag, value)| (*flag, *value))
    }
}
