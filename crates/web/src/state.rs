//! Application state shared across handlers.

use std::collections::HashMap;
use std::sync::Arc;

use content_safety::{ContentChecker, MetricsRecorder, PricingTable};
use database::Database;
use safety_core::LanguageModel;
use tokio::sync::Mutex;

use crate::notify::Notifier;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Runs the classifier bank over tool input.
    pub checker: ContentChecker,
    /// Model that generates tool output.
    pub generator: Arc<dyn LanguageModel>,
    /// Writes one metrics row per tool call.
    pub recorder: MetricsRecorder,
    /// Per-model token prices.
    pub pricing: Arc<PricingTable>,
    /// Moderation emails.
    pub notifier: Notifier,
    /// One deferred generation at a time per content row.
    pub in_flight: InFlight,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        db: Database,
        checker: ContentChecker,
        generator: Arc<dyn LanguageModel>,
        notifier: Notifier,
    ) -> Self {
        Self {
            recorder: MetricsRecorder::new(db.clone()),
            db,
            checker,
            generator,
            pricing: Arc::new(PricingTable::default()),
            notifier,
            in_flight: InFlight::default(),
        }
    }
}

/// Per-key async locks.
///
/// Callers for the same key run one after another; the entry is dropped once
/// nobody else is waiting on it.
#[derive(Clone, Default)]
pub struct InFlight {
    slots: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl InFlight {
    /// Run `work` while holding the lock for `key`.
    pub async fn run<F, T>(&self, key: &str, work: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        let slot = {
            let mut slots = self.slots.lock().await;
            Arc::clone(slots.entry(key.to_string()).or_default())
        };

        let output = {
            let _guard = slot.lock().await;
            work.await
        };

        let mut slots = self.slots.lock().await;
        // The map and this call hold the only references.
        if Arc::strong_count(&slot) == 2 {
            slots.remove(key);
        }
        output
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }
}
