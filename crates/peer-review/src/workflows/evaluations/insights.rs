use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::domain::EvaluationId;

/// Handle for one pending insight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightTicket {
    evaluation_id: EvaluationId,
    generation: u64,
}

impl InsightTicket {
    pub fn evaluation_id(&self) -> &EvaluationId {
        &self.evaluation_id
    }
}

/// Delays insight delivery and drops results that were superseded while
/// waiting, either by a newer request for the same evaluation or by
/// [`InsightScheduler::cancel`].
#[derive(Debug, Default)]
pub struct InsightScheduler {
    delay: Duration,
    generation: AtomicU64,
    pending: Mutex<HashMap<EvaluationId, u64>>,
}

impl InsightScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: AtomicU64::new(0),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Register a request; any older ticket for the same evaluation goes stale.
    pub fn issue(&self, evaluation_id: &EvaluationId) -> InsightTicket {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.with_pending(|pending| {
            pending.insert(evaluation_id.clone(), generation);
        });
        InsightTicket {
            evaluation_id: evaluation_id.clone(),
            generation,
        }
    }

    /// Discard whatever request is in flight for the evaluation.
    pub fn cancel(&self, evaluation_id: &EvaluationId) -> bool {
        self.with_pending(|pending| pending.remove(evaluation_id).is_some())
    }

    pub fn is_current(&self, ticket: &InsightTicket) -> bool {
        self.with_pending(|pending| pending.get(&ticket.evaluation_id) == Some(&ticket.generation))
    }

    /// Release the ticket once its result has been applied.
    pub fn complete(&self, ticket: &InsightTicket) {
        self.with_pending(|pending| {
            if pending.get(&ticket.evaluation_id) == Some(&ticket.generation) {
                pending.remove(&ticket.evaluation_id);
            }
        });
    }

    /// Wait out the configured delay, then run `compute` only if the ticket
    /// is still current. Superseded requests yield `None`.
    pub async fn run<T, F>(&self, evaluation_id: &EvaluationId, compute: F) -> Option<T>
    where
        F: FnOnce() -> T,
    {
        let ticket = self.issue(evaluation_id);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if !self.is_current(&ticket) {
            tracing::debug!(evaluation_id = %evaluation_id, "discarding superseded insight request");
            return None;
        }

        let output = compute();
        self.complete(&ticket);
        Some(output)
    }

    fn with_pending<T>(&self, f: impl FnOnce(&mut HashMap<EvaluationId, u64>) -> T) -> T {
        // Entries are plain integers; a poisoned map is still consistent.
        let mut guard = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}
