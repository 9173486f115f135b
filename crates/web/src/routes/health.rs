//! Liveness probe.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// `status` is `degraded` while the metrics table cannot be read.
#[derive(Serialize)]
pub struct Health {
    pub status: String,
    pub database: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<Health> {
    let database = database_reachable(&state).await;
    Json(Health {
        status: if database { "ok" } else { "degraded" }.to_string(),
        database,
    })
}

async fn database_reachable(state: &AppState) -> bool {
    database::metrics::count_flagged(state.db.pool(), &Default::default())
        .await
        .is_ok()
}
