//! Moderation routes: the in-app console and the one-click email links.

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use database::validation::validate_notes;
use database::{metrics, DatabaseError, FlaggedFilter, MetricsRecord};
use safety_core::{transition, ModerationAction, ModerationStatus, Role, TransitionError};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::auth::Principal;
use crate::error::{Result, WebError};
use crate::state::AppState;

const DEFAULT_PAGE_LIMIT: i64 = 50;
const MAX_PAGE_LIMIT: i64 = 200;

/// Body of `PATCH /api/moderator/violations/:id`.
#[derive(Debug, Default, Deserialize)]
pub struct ViolationUpdate {
    pub moderator_approval: Option<String>,
    pub moderator_notes: Option<String>,
    pub user_requested_moderation: Option<bool>,
}

impl ViolationUpdate {
    /// The status change this body asks for, if any.
    fn action(&self) -> Result<Option<ModerationAction>> {
        match (self.moderator_approval.as_deref(), self.user_requested_moderation) {
            (Some("pending"), _) | (None, Some(true)) => Ok(Some(ModerationAction::RequestReview)),
            (Some(decision), _) => ModerationAction::from_decision(decision)
                .map(Some)
                .ok_or_else(|| WebError::BadRequest(format!("Invalid moderator_approval: {}", decision))),
            (None, _) => Ok(None),
        }
    }
}

async fn load_record(state: &AppState, id: &str) -> Result<MetricsRecord> {
    match metrics::get_metrics(state.db.pool(), id).await {
        Ok(record) => Ok(record),
        Err(DatabaseError::NotFound { .. }) => Err(WebError::NotFound("Violation not found".to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Request review of, or decide on, a flagged row.
pub async fn update_violation(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(update): Json<ViolationUpdate>,
) -> Result<Json<MetricsRecord>> {
    let record = load_record(&state, &id).await?;
    if !principal.can_view(&record.user_id, record.org_id.as_deref()) {
        return Err(WebError::Forbidden("Not allowed to moderate this content".to_string()));
    }

    let notes = update
        .moderator_notes
        .as_deref()
        .map(validate_notes)
        .transpose()?;
    if notes.is_some() {
        principal.require_moderator()?;
    }

    let pool = state.db.pool();
    let current = record.moderator_approval;

    let updated = match update.action()? {
        Some(action @ ModerationAction::RequestReview) => {
            let next = transition(current, record.flagged, action, principal.role)?;
            let mut updated = record;

            if next != current {
                let owner_email = if principal.user_id == updated.user_id {
                    principal.email.as_deref()
                } else {
                    None
                };
                updated = metrics::request_review(pool, &id, owner_email).await?;
                info!(metrics_id = %id, user_id = %principal.user_id, "Review requested");
                state.notifier.review_requested(&updated).await;
            }
            if let Some(notes) = &notes {
                updated = metrics::update_notes(pool, &id, notes).await?;
            }
            updated
        }
        Some(action) => {
            if principal.user_id == record.user_id {
                return Err(WebError::Forbidden(
                    "Moderators cannot decide on their own content".to_string(),
                ));
            }
            let next = transition(current, record.flagged, action, principal.role)?;

            if next != current {
                let updated = metrics::apply_moderation(
                    pool,
                    &id,
                    next,
                    Some(principal.user_id.as_str()),
                    notes.as_deref(),
                )
                .await?;
                info!(metrics_id = %id, moderator_id = %principal.user_id, status = %next, "Moderation decision applied");
                state.notifier.decision_made(&updated).await;
                updated
            } else if let Some(notes) = &notes {
                metrics::update_notes(pool, &id, notes).await?
            } else {
                record
            }
        }
        None => match &notes {
            Some(notes) => metrics::update_notes(pool, &id, notes).await?,
            None => return Err(WebError::BadRequest("Nothing to update".to_string())),
        },
    };

    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct ViolationQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// One page of the moderator console.
#[derive(Debug, Serialize)]
pub struct ViolationPage {
    pub items: Vec<MetricsRecord>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Flagged rows in the caller's organization, newest first.
pub async fn list_violations(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ViolationQuery>,
) -> Result<Json<ViolationPage>> {
    principal.require_moderator()?;
    let org_id = principal
        .org_id
        .clone()
        .ok_or_else(|| WebError::Forbidden("An organization is required".to_string()))?;

    let status = query
        .status
        .as_deref()
        .map(str::parse::<ModerationStatus>)
        .transpose()
        .map_err(WebError::BadRequest)?;

    let filter = FlaggedFilter {
        org_id: Some(org_id),
        status,
        limit: query.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        offset: query.offset.unwrap_or(0).max(0),
    };

    let pool = state.db.pool();
    let items = metrics::list_flagged(pool, &filter).await?;
    let total = metrics::count_flagged(pool, &filter).await?;

    Ok(Json(ViolationPage {
        items,
        total,
        limit: filter.limit,
        offset: filter.offset,
    }))
}

/// Query of a one-click email link.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailActionQuery {
    pub id: Option<String>,
    pub action: Option<String>,
    pub moderator_id: Option<String>,
    pub token: Option<String>,
}

/// Page shown after following an email link.
#[derive(Template)]
#[template(path = "email_action.html")]
pub struct EmailActionPage {
    pub success: bool,
    pub title: String,
    pub message: String,
}

impl EmailActionPage {
    fn success(status: ModerationStatus) -> (StatusCode, Self) {
        (
            StatusCode::OK,
            Self {
                success: true,
                title: format!("Content {}", status),
                message: format!("The content has been {}. The teacher has been notified.", status),
            },
        )
    }

    fn failure(code: StatusCode, message: impl Into<String>) -> (StatusCode, Self) {
        (
            code,
            Self {
                success: false,
                title: "Action failed".to_string(),
                message: message.into(),
            },
        )
    }
}

/// Apply a decision from a signed email link. Always answers with HTML.
pub async fn email_action(
    State(state): State<AppState>,
    Query(query): Query<EmailActionQuery>,
) -> (StatusCode, EmailActionPage) {
    let (Some(id), Some(action), Some(moderator_id), Some(token)) =
        (query.id, query.action, query.moderator_id, query.token)
    else {
        return EmailActionPage::failure(StatusCode::BAD_REQUEST, "This link is incomplete.");
    };

    let Some(decision) = ModerationAction::from_decision(&action) else {
        return EmailActionPage::failure(StatusCode::BAD_REQUEST, "This link has an unknown action.");
    };

    if !state.notifier.signer().verify(&id, &action, &moderator_id, &token) {
        warn!(metrics_id = %id, moderator_id = %moderator_id, "Rejected email action with invalid token");
        return EmailActionPage::failure(StatusCode::FORBIDDEN, "This link is invalid or has been altered.");
    }

    let record = match metrics::get_metrics(state.db.pool(), &id).await {
        Ok(record) => record,
        Err(DatabaseError::NotFound { .. }) => {
            return EmailActionPage::failure(StatusCode::NOT_FOUND, "This content no longer exists.")
        }
        Err(e) => {
            error!(error = %e, metrics_id = %id, "Failed to load record for email action");
            return EmailActionPage::failure(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong. Please try again.");
        }
    };

    if record.user_id == moderator_id {
        warn!(metrics_id = %id, moderator_id = %moderator_id, "Refused email action on own content");
        return EmailActionPage::failure(
            StatusCode::FORBIDDEN,
            "Content you created must be reviewed by another moderator.",
        );
    }

    let current = record.moderator_approval;
    let next = match transition(current, record.flagged, decision, Role::Moderator) {
        Ok(next) => next,
        Err(TransitionError::AlreadyDecided(status)) => {
            return EmailActionPage::failure(
                StatusCode::CONFLICT,
                format!("This content has already been {}.", status),
            )
        }
        Err(e) => {
            return EmailActionPage::failure(StatusCode::CONFLICT, format!("This action cannot be applied: {}.", e))
        }
    };

    if next == current {
        return EmailActionPage::success(next);
    }

    match metrics::apply_moderation(state.db.pool(), &id, next, Some(moderator_id.as_str()), None).await {
        Ok(updated) => {
            info!(metrics_id = %id, moderator_id = %moderator_id, status = %next, "Email action applied");
            state.notifier.decision_made(&updated).await;
            EmailActionPage::success(next)
        }
        Err(e) => {
            error!(error = %e, metrics_id = %id, "Failed to apply email action");
            EmailActionPage::failure(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong. Please try again.")
        }
    }
}
