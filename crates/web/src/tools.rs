//! The educator tools: request validation, prompts and output parsing.

use std::fmt;
use std::str::FromStr;

use safety_core::{Completion, CompletionRequest, LanguageModel, SafetyError};
use serde_json::{Map, Value};

/// Appended to every tool prompt.
const JSON_ONLY: &str = "Respond with a single JSON object and nothing else. Do not wrap it in markdown.";

/// A content-generation tool exposed at `/api/tools/:tool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Quiz,
    Rubric,
    SchemeOfWork,
    Report,
    PromptRefinement,
    PeelParagraph,
    PerspectiveAnalysis,
    LongQa,
    LessonPlanEvaluation,
}

impl ToolKind {
    pub const ALL: [ToolKind; 9] = [
        ToolKind::Quiz,
        ToolKind::Rubric,
        ToolKind::SchemeOfWork,
        ToolKind::Report,
        ToolKind::PromptRefinement,
        ToolKind::PeelParagraph,
        ToolKind::PerspectiveAnalysis,
        ToolKind::LongQa,
        ToolKind::LessonPlanEvaluation,
    ];

    /// URL slug, also stored as the metrics `prompt_type`.
    pub fn slug(&self) -> &'static str {
        match self {
            ToolKind::Quiz => "quiz",
            ToolKind::Rubric => "rubric",
            ToolKind::SchemeOfWork => "scheme-of-work",
            ToolKind::Report => "report",
            ToolKind::PromptRefinement => "prompt-refinement",
            ToolKind::PeelParagraph => "peel-paragraph",
            ToolKind::PerspectiveAnalysis => "perspective-analysis",
            ToolKind::LongQa => "long-qa",
            ToolKind::LessonPlanEvaluation => "lesson-plan-evaluation",
        }
    }

    /// Fields the request body must carry as non-empty values.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            ToolKind::Quiz => &["topic", "yearGroup", "questionCount"],
            ToolKind::Rubric => &["assignment", "yearGroup"],
            ToolKind::SchemeOfWork => &["subject", "topic", "yearGroup", "lessonCount"],
            ToolKind::Report => &["studentName", "subject", "strengths", "targets"],
            ToolKind::PromptRefinement => &["prompt"],
            ToolKind::PeelParagraph => &["topic", "yearGroup"],
            ToolKind::PerspectiveAnalysis => &["text"],
            ToolKind::LongQa => &["question", "yearGroup"],
            ToolKind::LessonPlanEvaluation => &["lessonPlan"],
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            ToolKind::Quiz => {
                "You write classroom quizzes. Produce {\"title\", \"questions\": [{\"question\", \"options\", \"answer\", \"explanation\"}]} with exactly the requested number of questions, pitched at the given year group."
            }
            ToolKind::Rubric => {
                "You write marking rubrics. Produce {\"title\", \"criteria\": [{\"name\", \"levels\": [{\"label\", \"descriptor\", \"points\"}]}]} for the assignment and year group given."
            }
            ToolKind::SchemeOfWork => {
                "You plan schemes of work. Produce {\"title\", \"overview\", \"lessons\": [{\"number\", \"title\", \"objectives\", \"activities\", \"assessment\"}]} with the requested number of lessons."
            }
            ToolKind::Report => {
                "You write end-of-term student reports. Produce {\"report\"} as one professional, encouraging paragraph that covers the strengths and targets given."
            }
            ToolKind::PromptRefinement => {
                "You improve prompts that teachers write for AI assistants. Produce {\"refinedPrompt\", \"changes\": [string]} keeping the teacher's intent."
            }
            ToolKind::PeelParagraph => {
                "You write model PEEL paragraphs (Point, Evidence, Explanation, Link). Produce {\"point\", \"evidence\", \"explanation\", \"link\", \"paragraph\"} for the topic and year group given."
            }
            ToolKind::PerspectiveAnalysis => {
                "You analyse texts from several perspectives for classroom discussion. Produce {\"summary\", \"perspectives\": [{\"viewpoint\", \"analysis\"}], \"discussionQuestions\": [string]}."
            }
            ToolKind::LongQa => {
                "You write extended exam-style answers with a mark scheme. Produce {\"answer\", \"markScheme\": [{\"point\", \"marks\"}]} for the question and year group given."
            }
            ToolKind::LessonPlanEvaluation => {
                "You review lesson plans for teachers. Produce {\"strengths\": [string], \"improvements\": [string], \"score\"} with a score from 1 to 10."
            }
        }
    }

    /// Check the request body and return it as an object.
    pub fn validate<'a>(&self, input: &'a Value) -> Result<&'a Map<String, Value>, String> {
        let fields = input
            .as_object()
            .ok_or_else(|| "Request body must be a JSON object".to_string())?;

        let missing: Vec<&str> = self
            .required_fields()
            .iter()
            .copied()
            .filter(|name| fields.get(*name).map_or(true, is_blank))
            .collect();

        if missing.is_empty() {
            Ok(fields)
        } else {
            Err(format!("Missing required fields: {}", missing.join(", ")))
        }
    }

    /// Generate the tool output for a validated request body.
    pub async fn generate(
        &self,
        model: &dyn LanguageModel,
        input: &Value,
    ) -> Result<(Value, Completion), SafetyError> {
        let request = CompletionRequest::new(input.to_string())
            .with_system(format!("{}\n\n{}", self.system_prompt(), JSON_ONLY))
            .with_temperature(0.7);

        let completion = model.complete(request).await?;
        Ok((parse_output(&completion.text), completion))
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|tool| tool.slug() == s)
            .ok_or_else(|| format!("Unknown tool: {}", s))
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// All user-written text in a request body, one value per line.
///
/// This is what the content checks run on.
pub fn safety_text(input: &Value) -> String {
    let mut parts = Vec::new();
    collect_strings(input, &mut parts);
    parts.join("\n")
}

fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) if !s.trim().is_empty() => out.push(s),
        Value::Array(items) => items.iter().for_each(|item| collect_strings(item, out)),
        Value::Object(fields) => fields.values().for_each(|item| collect_strings(item, out)),
        _ => {}
    }
}

/// Parse model output as JSON, falling back to `{"text": ...}`.
pub fn parse_output(text: &str) -> Value {
    let trimmed = strip_code_fence(text.trim());
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => value,
        _ => serde_json::json!({ "text": text.trim() }),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
