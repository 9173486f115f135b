//! Educator tool routes: the safety-gated write path and the approval-gated
//! read path.

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use content_safety::MetricsParams;
use database::{content, metrics, DatabaseError, GeneratedContent, NewGeneratedContent};
use safety_core::{ContentFlags, ModerationStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::{Result, WebError};
use crate::state::AppState;
use crate::tools::{safety_text, ToolKind};

/// Model name stored for calls that never reached a model.
const NO_MODEL: &str = "none";

const DEFAULT_HISTORY_LIMIT: i64 = 20;
const MAX_HISTORY_LIMIT: i64 = 100;

/// A generated content row plus the metrics row that accounts for it.
#[derive(Debug, Serialize)]
pub struct ToolResponse {
    #[serde(flatten)]
    pub content: GeneratedContent,
    pub metrics_id: String,
    pub flagged: bool,
}

#[derive(Debug, Deserialize)]
pub struct ToolQuery {
    /// Metrics row id of a moderator-approved request.
    pub approved: Option<String>,
    pub limit: Option<i64>,
}

fn parse_tool(slug: &str) -> Result<ToolKind> {
    slug.parse()
        .map_err(|_| WebError::NotFound(format!("Unknown tool: {}", slug)))
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Remove a content row whose metrics row could not be written.
async fn discard_content(state: &AppState, id: &str) {
    if let Err(e) = content::delete_content(state.db.pool(), id).await {
        error!(error = %e, content_id = %id, "Failed to remove unaccounted content");
    }
}

/// Run a tool: check the input, then generate or block.
pub async fn run_tool(
    State(state): State<AppState>,
    principal: Principal,
    Path(slug): Path<String>,
    Json(input): Json<Value>,
) -> Result<Json<ToolResponse>> {
    let tool = parse_tool(&slug)?;
    tool.validate(&input).map_err(WebError::BadRequest)?;

    let started = Instant::now();
    let pool = state.db.pool();
    let check = state
        .checker
        .perform_content_checks(&safety_text(&input))
        .await;

    let new_content = NewGeneratedContent {
        id: Uuid::new_v4().to_string(),
        user_id: principal.user_id.clone(),
        org_id: principal.org_id.clone(),
        tool: tool.slug().to_string(),
        input,
        payload: None,
    };

    if !check.should_proceed {
        let stored = content::insert_content(pool, &new_content).await?;
        let error_type = if check.blocking.is_empty() {
            "content_check_failed"
        } else {
            "content_violation"
        };

        let recorded = state
            .recorder
            .record_ai_tools_metrics(MetricsParams {
                user_id: principal.user_id,
                org_id: principal.org_id,
                model: NO_MODEL.to_string(),
                duration_ms: elapsed_ms(started),
                content_flags: check.violations,
                flagged: true,
                error_type: Some(error_type.to_string()),
                status_code: Some(400),
                prompt_id: Some(stored.id.clone()),
                prompt_type: tool.slug().to_string(),
                ..Default::default()
            })
            .await;
        let record = match recorded {
            Ok(record) => record,
            Err(e) => {
                discard_content(&state, &stored.id).await;
                return Err(e.into());
            }
        };

        warn!(
            metrics_id = %record.id,
            tool = %tool,
            blocking = ?check.blocking,
            "Tool request blocked by content checks"
        );

        return Err(WebError::Blocked {
            message: check.blocked_message(),
            violations: check.violations,
            metrics_id: record.id,
        });
    }

    let (payload, completion) = match tool.generate(state.generator.as_ref(), &new_content.input).await {
        Ok(generated) => generated,
        Err(e) => {
            let params = MetricsParams {
                user_id: principal.user_id,
                org_id: principal.org_id,
                model: NO_MODEL.to_string(),
                duration_ms: elapsed_ms(started),
                content_flags: check.violations,
                error_type: Some("generation_failed".to_string()),
                status_code: Some(502),
                prompt_type: tool.slug().to_string(),
                ..Default::default()
            };
            if let Err(record_err) = state.recorder.record_ai_tools_metrics(params).await {
                error!(error = %record_err, "Failed to record failed generation");
            }
            return Err(e.into());
        }
    };

    let stored = content::insert_content(
        pool,
        &NewGeneratedContent {
            payload: Some(payload),
            ..new_content
        },
    )
    .await?;

    let usage = completion.usage;
    let recorded = state
        .recorder
        .record_ai_tools_metrics(MetricsParams {
            user_id: principal.user_id,
            org_id: principal.org_id,
            model: completion.model.clone(),
            input_tokens: usage.input as f64,
            output_tokens: usage.output as f64,
            total_tokens: usage.total as f64,
            duration_ms: elapsed_ms(started),
            price_usd: state.pricing.price_usd(&completion.model, &usage),
            content_flags: check.violations,
            prompt_id: Some(stored.id.clone()),
            prompt_type: tool.slug().to_string(),
            ..Default::default()
        })
        .await;

    let record = match recorded {
        Ok(record) => record,
        Err(e) => {
            discard_content(&state, &stored.id).await;
            return Err(e.into());
        }
    };

    info!(metrics_id = %record.id, tool = %tool, total_tokens = record.total_tokens, "Tool request served");

    Ok(Json(ToolResponse {
        content: stored,
        metrics_id: record.id,
        flagged: record.flagged,
    }))
}

/// `?approved=<metricsId>` returns approved content; otherwise the caller's
/// history for the tool.
pub async fn tool_content(
    State(state): State<AppState>,
    principal: Principal,
    Path(slug): Path<String>,
    Query(query): Query<ToolQuery>,
) -> Result<Response> {
    let tool = parse_tool(&slug)?;

    match query.approved {
        Some(metrics_id) => {
            let content = approved_content(&state, &principal, tool, &metrics_id).await?;
            Ok(Json(content).into_response())
        }
        None => {
            let limit = query
                .limit
                .unwrap_or(DEFAULT_HISTORY_LIMIT)
                .clamp(1, MAX_HISTORY_LIMIT);
            let history =
                content::list_content_for_user(state.db.pool(), &principal.user_id, tool.slug(), limit)
                    .await?;
            Ok(Json(history).into_response())
        }
    }
}

/// Content released by a moderator. Withheld content is generated now.
async fn approved_content(
    state: &AppState,
    principal: &Principal,
    tool: ToolKind,
    metrics_id: &str,
) -> Result<GeneratedContent> {
    let pool = state.db.pool();

    let record = match metrics::get_metrics(pool, metrics_id).await {
        Ok(record) if record.prompt_type == tool.slug() => record,
        Ok(_) | Err(DatabaseError::NotFound { .. }) => {
            return Err(WebError::NotFound("Metrics record not found".to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    if !principal.can_view(&record.user_id, record.org_id.as_deref()) {
        return Err(WebError::Forbidden("Not allowed to view this content".to_string()));
    }

    if record.moderator_approval != ModerationStatus::Approved {
        return Err(WebError::NotApproved {
            status: record.moderator_approval,
            content_flags: record.content_flags,
        });
    }

    let content = content::get_content(pool, &record.prompt_id).await?;
    if content.payload.is_some() {
        return Ok(content);
    }

    state
        .in_flight
        .run(&content.id, generate_withheld(state, tool, metrics_id, &content.id))
        .await
}

/// Generate and store the payload of an approved row that has none yet.
///
/// Callers hold the row's in-flight lock. A row that already has a payload is
/// returned as stored, and no second metrics row is written for it.
async fn generate_withheld(
    state: &AppState,
    tool: ToolKind,
    metrics_id: &str,
    content_id: &str,
) -> Result<GeneratedContent> {
    let pool = state.db.pool();

    let content = content::get_content(pool, content_id).await?;
    if content.payload.is_some() {
        return Ok(content);
    }

    let started = Instant::now();
    let (payload, completion) = tool.generate(state.generator.as_ref(), &content.input).await?;
    let Some(content) = content::set_payload(pool, &content.id, &payload).await? else {
        info!(metrics_id, content_id, "Approved content was filled concurrently");
        return Ok(content::get_content(pool, content_id).await?);
    };

    let usage = completion.usage;
    let recorded = state
        .recorder
        .record_ai_tools_metrics(MetricsParams {
            user_id: content.user_id.clone(),
            org_id: content.org_id.clone(),
            model: completion.model.clone(),
            input_tokens: usage.input as f64,
            output_tokens: usage.output as f64,
            total_tokens: usage.total as f64,
            duration_ms: elapsed_ms(started),
            price_usd: state.pricing.price_usd(&completion.model, &usage),
            content_flags: ContentFlags::default(),
            prompt_id: Some(content.id.clone()),
            prompt_type: tool.slug().to_string(),
            ..Default::default()
        })
        .await;

    if let Err(e) = recorded {
        error!(error = %e, metrics_id, "Failed to record approved generation");
    }

    info!(metrics_id, content_id = %content.id, "Generated approved content");
    Ok(content)
}
