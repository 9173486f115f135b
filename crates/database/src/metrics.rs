//! AI tool metrics rows and their moderation state.

use safety_core::ModerationStatus;
use sqlx::SqlitePool;

use crate::error::{map_insert_error, DatabaseError};
use crate::models::{FlaggedFilter, MetricsRecord, MetricsRow, NewMetricsRecord, ToolUsage};
use crate::Result;

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, org_id, model, input_tokens, output_tokens, total_tokens,
           duration_ms, price_micros, content_flags, flagged, error_type, status_code,
           prompt_id, prompt_type, moderator_approval, moderator_notes, moderator_id,
           user_requested_moderation, owner_email, moderation_updated_at, created_at
    FROM ai_tool_metrics
"#;

fn not_found(id: &str) -> DatabaseError {
    DatabaseError::NotFound {
        entity: "MetricsRecord",
        id: id.to_string(),
    }
}

/// Insert a metrics row. Moderation columns take their defaults.
pub async fn insert_metrics(pool: &SqlitePool, record: &NewMetricsRecord) -> Result<MetricsRecord> {
    let flags = serde_json::to_string(&record.content_flags)?;

    sqlx::query(
        r#"
        INSERT INTO ai_tool_metrics (
            id, user_id, org_id, model, input_tokens, output_tokens, total_tokens,
            duration_ms, price_micros, content_flags, flagged, error_type, status_code,
            prompt_id, prompt_type
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(&record.user_id)
    .bind(&record.org_id)
    .bind(&record.model)
    .bind(record.input_tokens)
    .bind(record.output_tokens)
    .bind(record.total_tokens)
    .bind(record.duration_ms)
    .bind(record.price_micros)
    .bind(&flags)
    .bind(record.flagged)
    .bind(&record.error_type)
    .bind(record.status_code)
    .bind(&record.prompt_id)
    .bind(&record.prompt_type)
    .execute(pool)
    .await
    .map_err(|e| map_insert_error(e, "MetricsRecord", &record.id))?;

    get_metrics(pool, &record.id).await
}

/// Get a metrics row by id.
pub async fn get_metrics(pool: &SqlitePool, id: &str) -> Result<MetricsRecord> {
    let row = sqlx::query_as::<_, MetricsRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found(id))?;

    row.try_into()
}

/// Record a moderation outcome.
///
/// Only the moderation columns are written. `notes` of `None` keeps any
/// existing notes.
pub async fn apply_moderation(
    pool: &SqlitePool,
    id: &str,
    status: ModerationStatus,
    moderator_id: Option<&str>,
    notes: Option<&str>,
) -> Result<MetricsRecord> {
    let result = sqlx::query(
        r#"
        UPDATE ai_tool_metrics
        SET moderator_approval = ?,
            moderator_id = COALESCE(?, moderator_id),
            moderator_notes = COALESCE(?, moderator_notes),
            moderation_updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(moderator_id)
    .bind(notes)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }

    tracing::debug!(id, status = %status, "Applied moderation status");
    get_metrics(pool, id).await
}

/// Mark a row as awaiting review at the owner's request.
pub async fn request_review(
    pool: &SqlitePool,
    id: &str,
    owner_email: Option<&str>,
) -> Result<MetricsRecord> {
    let result = sqlx::query(
        r#"
        UPDATE ai_tool_metrics
        SET moderator_approval = 'pending',
            user_requested_moderation = 1,
            owner_email = COALESCE(?, owner_email),
            moderation_updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(owner_email)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }

    get_metrics(pool, id).await
}

/// Replace moderator notes without changing the status.
pub async fn update_notes(pool: &SqlitePool, id: &str, notes: &str) -> Result<MetricsRecord> {
    let result = sqlx::query(
        r#"
        UPDATE ai_tool_metrics
        SET moderator_notes = ?,
            moderation_updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(notes)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }

    get_metrics(pool, id).await
}

/// List flagged rows, newest first.
pub async fn list_flagged(pool: &SqlitePool, filter: &FlaggedFilter) -> Result<Vec<MetricsRecord>> {
    let status = filter.status.map(|s| s.as_str());

    let rows = sqlx::query_as::<_, MetricsRow>(&format!(
        r#"{SELECT_COLUMNS}
        WHERE flagged = 1
          AND (? IS NULL OR org_id = ?)
          AND (? IS NULL OR moderator_approval = ?)
        ORDER BY created_at DESC, rowid DESC
        LIMIT ? OFFSET ?
        "#
    ))
    .bind(&filter.org_id)
    .bind(&filter.org_id)
    .bind(status)
    .bind(status)
    .bind(filter.limit)
    .bind(filter.offset)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(MetricsRecord::try_from).collect()
}

/// Count flagged rows matching the filter, ignoring limit and offset.
pub async fn count_flagged(pool: &SqlitePool, filter: &FlaggedFilter) -> Result<i64> {
    let status = filter.status.map(|s| s.as_str());

    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM ai_tool_metrics
        WHERE flagged = 1
          AND (? IS NULL OR org_id = ?)
          AND (? IS NULL OR moderator_approval = ?)
        "#,
    )
    .bind(&filter.org_id)
    .bind(&filter.org_id)
    .bind(status)
    .bind(status)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Per-tool usage totals, optionally for one organization.
pub async fn usage_by_tool(pool: &SqlitePool, org_id: Option<&str>) -> Result<Vec<ToolUsage>> {
    let usage = sqlx::query_as::<_, ToolUsage>(
        r#"
        SELECT prompt_type,
               COUNT(*) AS invocations,
               COALESCE(SUM(flagged), 0) AS flagged,
               COALESCE(SUM(input_tokens), 0) AS input_tokens,
               COALESCE(SUM(output_tokens), 0) AS output_tokens,
               COALESCE(SUM(price_micros), 0) AS price_micros
        FROM ai_tool_metrics
        WHERE (? IS NULL OR org_id = ?)
        GROUP BY prompt_type
        ORDER BY invocations DESC, prompt_type
        "#,
    )
    .bind(org_id)
    .bind(org_id)
    .fetch_all(pool)
    .await?;

    Ok(usage)
}

/// Metrics rows linked to a content row.
pub async fn metrics_for_prompt(pool: &SqlitePool, prompt_id: &str) -> Result<Vec<MetricsRecord>> {
    let rows = sqlx::query_as::<_, MetricsRow>(&format!(
        "{SELECT_COLUMNS} WHERE prompt_id = ? ORDER BY created_at DESC, rowid DESC"
    ))
    .bind(prompt_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(MetricsRecord::try_from).collect()
}
