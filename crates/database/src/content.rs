//! Generated content rows.

use sqlx::SqlitePool;

use crate::error::{map_insert_error, DatabaseError};
use crate::models::{ContentRow, GeneratedContent, NewGeneratedContent};
use crate::Result;

fn not_found(id: &str) -> DatabaseError {
    DatabaseError::NotFound {
        entity: "GeneratedContent",
        id: id.to_string(),
    }
}

/// Store a tool input, with or without its generated payload.
pub async fn insert_content(
    pool: &SqlitePool,
    content: &NewGeneratedContent,
) -> Result<GeneratedContent> {
    let input = serde_json::to_string(&content.input)?;
    let payload = content
        .payload
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    sqlx::query(
        r#"
        INSERT INTO generated_content (id, user_id, org_id, tool, input, payload)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&content.id)
    .bind(&content.user_id)
    .bind(&content.org_id)
    .bind(&content.tool)
    .bind(&input)
    .bind(&payload)
    .execute(pool)
    .await
    .map_err(|e| map_insert_error(e, "GeneratedContent", &content.id))?;

    get_content(pool, &content.id).await
}

/// Get a content row by id.
pub async fn get_content(pool: &SqlitePool, id: &str) -> Result<GeneratedContent> {
    let row = sqlx::query_as::<_, ContentRow>(
        r#"
        SELECT id, user_id, org_id, tool, input, payload, created_at
        FROM generated_content
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| not_found(id))?;

    row.try_into()
}

/// Persist the generated payload for a withheld row.
///
/// The write only lands while `payload` is still NULL. Returns `None` when
/// another writer filled the row first; the stored payload is left as is.
pub async fn set_payload(
    pool: &SqlitePool,
    id: &str,
    payload: &serde_json::Value,
) -> Result<Option<GeneratedContent>> {
    let payload = serde_json::to_string(payload)?;

    let result = sqlx::query(
        r#"
        UPDATE generated_content
        SET payload = ?
        WHERE id = ? AND payload IS NULL
        "#,
    )
    .bind(&payload)
    .bind(id)
    .execute(pool)
    .await?;

    let stored = get_content(pool, id).await?;
    Ok((result.rows_affected() > 0).then_some(stored))
}

/// Delete a content row. Returns true if a row was removed.
pub async fn delete_content(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM generated_content
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// A user's content for one tool, newest first.
pub async fn list_content_for_user(
    pool: &SqlitePool,
    user_id: &str,
    tool: &str,
    limit: i64,
) -> Result<Vec<GeneratedContent>> {
    let rows = sqlx::query_as::<_, ContentRow>(
        r#"
        SELECT id, user_id, org_id, tool, input, payload, created_at
        FROM generated_content
        WHERE user_id = ? AND tool = ?
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(tool)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(GeneratedContent::try_from).collect()
}
