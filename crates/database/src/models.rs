//! Database models.

use safety_core::{ContentFlags, ModerationStatus};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{DatabaseError, Result};

/// One AI tool invocation, including blocked ones.
///
/// Token and cost columns are written once at insert. Only the moderation
/// columns change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// UUID of the row.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Organization of the owning user, if any.
    pub org_id: Option<String>,
    /// Model that served the call ("none" when blocked before generation).
    pub model: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_tokens: i64,
    /// Wall-clock duration of the call in milliseconds.
    pub duration_ms: i64,
    /// Price in millionths of a US dollar.
    pub price_micros: i64,
    /// Safety verdict for the input.
    pub content_flags: ContentFlags,
    /// True if any content flag is raised.
    pub flagged: bool,
    /// Error category when the call did not succeed.
    pub error_type: Option<String>,
    /// HTTP status returned to the caller when the call did not succeed.
    pub status_code: Option<i64>,
    /// Linked generated content row.
    pub prompt_id: String,
    /// Tool slug of the linked content.
    pub prompt_type: String,
    pub moderator_approval: ModerationStatus,
    pub moderator_notes: Option<String>,
    pub moderator_id: Option<String>,
    /// Whether the owner asked for human review.
    pub user_requested_moderation: bool,
    /// Where to send the review outcome.
    pub owner_email: Option<String>,
    pub moderation_updated_at: Option<String>,
    pub created_at: String,
}

impl MetricsRecord {
    /// Price in US dollars.
    pub fn price_usd(&self) -> f64 {
        self.price_micros as f64 / 1_000_000.0
    }
}

/// Raw `ai_tool_metrics` row as stored.
#[derive(Debug, FromRow)]
pub(crate) struct MetricsRow {
    pub id: String,
    pub user_id: String,
    pub org_id: Option<String>,
    pub model: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_tokens: i64,
    pub duration_ms: i64,
    pub price_micros: i64,
    pub content_flags: String,
    pub flagged: bool,
    pub error_type: Option<String>,
    pub status_code: Option<i64>,
    pub prompt_id: String,
    pub prompt_type: String,
    pub moderator_approval: String,
    pub moderator_notes: Option<String>,
    pub moderator_id: Option<String>,
    pub user_requested_moderation: bool,
    pub owner_email: Option<String>,
    pub moderation_updated_at: Option<String>,
    pub created_at: String,
}

impl TryFrom<MetricsRow> for MetricsRecord {
    type Error = DatabaseError;

    fn try_from(row: MetricsRow) -> Result<Self> {
        let content_flags: ContentFlags = serde_json::from_str(&row.content_flags)?;
        let moderator_approval = row
            .moderator_approval
            .parse::<ModerationStatus>()
            .map_err(DatabaseError::Decode)?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            org_id: row.org_id,
            model: row.model,
            input_tokens: row.input_tokens,
            output_tokens: row.output_tokens,
            total_tokens: row.total_tokens,
            duration_ms: row.duration_ms,
            price_micros: row.price_micros,
            content_flags,
            flagged: row.flagged,
            error_type: row.error_type,
            status_code: row.status_code,
            prompt_id: row.prompt_id,
            prompt_type: row.prompt_type,
            moderator_approval,
            moderator_notes: row.moderator_notes,
            moderator_id: row.moderator_id,
            user_requested_moderation: row.user_requested_moderation,
            owner_email: row.owner_email,
            moderation_updated_at: row.moderation_updated_at,
            created_at: row.created_at,
        })
    }
}

/// Values for a new metrics row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMetricsRecord {
    pub id: String,
    pub user_id: String,
    pub org_id: Option<String>,
    pub model: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_tokens: i64,
    pub duration_ms: i64,
    pub price_micros: i64,
    pub content_flags: ContentFlags,
    pub flagged: bool,
    pub error_type: Option<String>,
    pub status_code: Option<i64>,
    pub prompt_id: String,
    pub prompt_type: String,
}

/// Filter for the moderator console listing.
#[derive(Debug, Clone, Default)]
pub struct FlaggedFilter {
    /// Restrict to one organization.
    pub org_id: Option<String>,
    /// Restrict to one moderation status.
    pub status: Option<ModerationStatus>,
    pub limit: i64,
    pub offset: i64,
}

/// Usage aggregate for one tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ToolUsage {
    /// Tool slug.
    pub prompt_type: String,
    pub invocations: i64,
    pub flagged: i64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub price_micros: i64,
}

/// Input and output of one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    /// UUID of the row (the metrics `prompt_id`).
    pub id: String,
    pub user_id: String,
    pub org_id: Option<String>,
    /// Tool slug, e.g. `quiz`.
    pub tool: String,
    /// Request body as submitted.
    pub input: serde_json::Value,
    /// Generated result; `None` while generation is withheld.
    pub payload: Option<serde_json::Value>,
    pub created_at: String,
}

/// Raw `generated_content` row as stored.
#[derive(Debug, FromRow)]
pub(crate) struct ContentRow {
    pub id: String,
    pub user_id: String,
    pub org_id: Option<String>,
    pub tool: String,
    pub input: String,
    pub payload: Option<String>,
    pub created_at: String,
}

impl TryFrom<ContentRow> for GeneratedContent {
    type Error = DatabaseError;

    fn try_from(row: ContentRow) -> Result<Self> {
        let payload = row
            .payload
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            org_id: row.org_id,
            tool: row.tool,
            input: serde_json::from_str(&row.input)?,
            payload,
            created_at: row.created_at,
        })
    }
}

/// Values for a new content row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGeneratedContent {
    pub id: String,
    pub user_id: String,
    pub org_id: Option<String>,
    pub tool: String,
    pub input: serde_json::Value,
    pub payload: Option<serde_json::Value>,
}
