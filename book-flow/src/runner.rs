//! RecommendationRunner – runs one recommendation attempt against a stored session.
//!
//! The runner splits an attempt into three steps so that no storage lock is held
//! while the outbound request is pending:
//!
//! 1. **Begin**: under the session's entry lock, validate the selection, reject the
//!    trigger if a request is already in flight, and move the state to `Loading`.
//! 2. **Fetch**: call the recommendation service with the selection captured in
//!    step 1. Other sessions, and reads of this one, proceed meanwhile.
//! 3. **Finish**: under the entry lock again, fold the tagged outcome into the
//!    session's state, then notify the observer once the lock is released.
//!
//! Steps 2 and 3 run on a spawned task. Dropping the caller's future, as axum does
//! when a client disconnects, does not strand the session in `Loading`: the task
//! still settles it, and a service that never answers is cut off after the
//! runner's timeout and recorded as a failure.
//!
//! Concurrent triggers on one session are rejected with
//! [`FlowError::RequestInFlight`]; they are never queued or coalesced. If the
//! session is deleted while the request is pending, the outcome is dropped and
//! [`FlowError::SessionNotFound`] is returned.
//!
//! ```rust,ignore
//! let runner = RecommendationRunner::new(controller, storage.clone());
//! let state = runner.run(&session_id).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::{
    controller::RecommendationController,
    error::{FlowError, Result},
    state::{Action, AppState, FetchOutcome, begin_fetch, reduce},
    storage::SessionStorage,
};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct RecommendationRunner {
    controller: Arc<RecommendationController>,
    storage: Arc<dyn SessionStorage>,
    timeout: Duration,
}

impl RecommendationRunner {
    pub fn new(
        controller: Arc<RecommendationController>,
        storage: Arc<dyn SessionStorage>,
    ) -> Self {
        Self {
            controller,
            storage,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Upper bound on one outbound call before it is recorded as a failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    /// Execute one attempt for `session_id` and return the session's final state.
    pub async fn run(&self, session_id: &str) -> Result<AppState> {
        // 1. Enter Loading atomically
        let loading = self.storage.update(session_id, &begin_fetch).await?;
        info!(session_id = %session_id, "Recommendation request started");

        // 2 + 3. Detached from the caller so the session always leaves Loading
        let attempt = tokio::spawn({
            let controller = self.controller.clone();
            let storage = self.storage.clone();
            let session_id = session_id.to_string();
            let timeout = self.timeout;
            async move {
                let outcome =
                    match tokio::time::timeout(timeout, controller.fetch(&loading.selection)).await {
                        Ok(Ok(outcome)) => outcome,
                        Ok(Err(e)) => FetchOutcome::Failure(e.to_string()),
                        Err(_) => {
                            warn!(
                                session_id = %session_id,
                                timeout_secs = timeout.as_secs_f64(),
                                "Recommendation request timed out"
                            );
                            FetchOutcome::Failure(format!(
                                "no response within {}s",
                                timeout.as_secs_f64()
                            ))
                        }
                    };
                settle(&controller, storage.as_ref(), &session_id, outcome).await
            }
        });

        match attempt.await {
            Ok(result) => result,
            Err(e) => {
                error!(session_id = %session_id, error = %e, "Recommendation task aborted");
                settle(
                    &self.controller,
                    self.storage.as_ref(),
                    session_id,
                    FetchOutcome::Failure(e.to_string()),
                )
                .await
            }
        }
    }
}

/// Fold `outcome` into the stored state, then announce any appended entry.
async fn settle(
    controller: &RecommendationController,
    storage: &dyn SessionStorage,
    session_id: &str,
    outcome: FetchOutcome,
) -> Result<AppState> {
    let appended = !matches!(outcome, FetchOutcome::Failure(_));
    let finished = storage
        .update(session_id, &|state| {
            Ok(reduce(state.clone(), Action::FetchFinished(outcome.clone())))
        })
        .await
        .inspect_err(|e| {
            if matches!(e, FlowError::SessionNotFound(_)) {
                warn!(session_id = %session_id, "Session closed before the response arrived");
            }
        })?;

    if appended {
        controller.announce(&finished);
    }

    info!(
        session_id = %session_id,
        state = ?finished.request,
        results = finished.recommendations.len(),
        "Recommendation request finished"
    );
    Ok(finished)
}
