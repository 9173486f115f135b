//! Usage analytics for organization admins.

use axum::extract::State;
use axum::Json;
use database::{metrics, FlaggedFilter, ToolUsage};
use safety_core::{ModerationStatus, Role};
use serde::Serialize;

use crate::auth::Principal;
use crate::error::{Result, WebError};
use crate::state::AppState;

/// Usage and moderation totals for the caller's organization.
#[derive(Debug, Serialize)]
pub struct AdminMetrics {
    pub tools: Vec<ToolUsage>,
    pub flagged_total: i64,
    pub pending_review: i64,
}

pub async fn metrics_api(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<AdminMetrics>> {
    if principal.role != Role::Admin {
        return Err(WebError::Forbidden("Admin role required".to_string()));
    }

    let pool = state.db.pool();
    let org_id = principal.org_id.as_deref();

    let tools = metrics::usage_by_tool(pool, org_id).await?;

    let all_flagged = FlaggedFilter {
        org_id: principal.org_id.clone(),
        ..Default::default()
    };
    let flagged_total = metrics::count_flagged(pool, &all_flagged).await?;
    let pending_review = metrics::count_flagged(
        pool,
        &FlaggedFilter {
            status: Some(ModerationStatus::Pending),
            ..all_flagged
        },
    )
    .await?;

    Ok(Json(AdminMetrics {
        tools,
        flagged_total,
        pending_review,
    }))
}
