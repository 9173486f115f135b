//! Metrics recording for AI tool calls.

use database::{metrics, Database, MetricsRecord, NewMetricsRecord};
use safety_core::ContentFlags;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::error::ContentSafetyError;
use crate::pricing::usd_to_micros;

/// Everything known about one tool call when it is recorded.
#[derive(Debug, Clone, Default)]
pub struct MetricsParams {
    pub user_id: String,
    pub org_id: Option<String>,
    pub model: String,
    pub input_tokens: f64,
    pub output_tokens: f64,
    pub total_tokens: f64,
    pub duration_ms: f64,
    /// Cost in US dollars.
    pub price_usd: f64,
    pub content_flags: ContentFlags,
    /// Caller's opinion of whether the call was flagged. Not stored; the
    /// recorder derives `flagged` from `content_flags`.
    pub flagged: bool,
    pub error_type: Option<String>,
    pub status_code: Option<u16>,
    /// Content row this call produced. A fresh id is generated when absent.
    pub prompt_id: Option<String>,
    /// Tool slug.
    pub prompt_type: String,
}

/// Writes one metrics row per tool call.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    db: Database,
}

impl MetricsRecorder {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Persist metrics for one call and return the stored row.
    ///
    /// Counters are rounded to integers and the price to six decimals.
    /// `automation_misuse_detected` is widened with the fraud flag before
    /// `flagged` is derived. Database errors are logged and returned.
    #[instrument(skip(self, params), fields(user_id = %params.user_id, prompt_type = %params.prompt_type))]
    pub async fn record_ai_tools_metrics(
        &self,
        params: MetricsParams,
    ) -> Result<MetricsRecord, ContentSafetyError> {
        let record = build_record(params);

        match metrics::insert_metrics(self.db.pool(), &record).await {
            Ok(stored) => {
                info!(
                    id = %stored.id,
                    flagged = stored.flagged,
                    total_tokens = stored.total_tokens,
                    price_micros = stored.price_micros,
                    "Recorded tool metrics"
                );
                Ok(stored)
            }
            Err(e) => {
                error!(error = %e, prompt_id = %record.prompt_id, "Failed to record tool metrics");
                Err(e.into())
            }
        }
    }
}

/// Normalize caller input into a row.
fn build_record(params: MetricsParams) -> NewMetricsRecord {
    let content_flags = params.content_flags.with_automation_widened();

    NewMetricsRecord {
        id: Uuid::new_v4().to_string(),
        user_id: params.user_id,
        org_id: params.org_id,
        model: params.model,
        input_tokens: params.input_tokens.round() as i64,
        output_tokens: params.output_tokens.round() as i64,
        total_tokens: params.total_tokens.round() as i64,
        duration_ms: params.duration_ms.round() as i64,
        price_micros: usd_to_micros(params.price_usd),
        flagged: content_flags.any(),
        content_flags,
        error_type: params.error_type,
        status_code: params.status_code.map(i64::from),
        prompt_id: params
            .prompt_id
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        prompt_type: params.prompt_type,
    }
}
