use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{FlowError, Result};
use crate::observer::{LoggingObserver, RecommendationObserver};
use crate::selection::Selection;
use crate::service::RecommendationService;
use crate::state::{Action, AppState, FetchOutcome, ResultMode, begin_fetch, reduce};

/// Validates a selection, calls the recommendation service once and folds the
/// outcome back into the state through [`reduce`].
///
/// The controller itself holds no session state. [`RecommendationController::trigger`]
/// drives a state value owned by the caller; [`crate::RecommendationRunner`] uses the
/// individual steps against session storage.
#[derive(Clone)]
pub struct RecommendationController {
    service: Arc<dyn RecommendationService>,
    observer: Arc<dyn RecommendationObserver>,
}

impl RecommendationController {
    pub fn new(service: Arc<dyn RecommendationService>) -> Self {
        Self {
            service,
            observer: Arc::new(LoggingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RecommendationObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The single instruction sent to the service for a complete selection.
    pub fn prompt_for(selection: &Selection) -> Result<String> {
        let (genre, mood, level) = selection
            .complete()
            .ok_or(FlowError::IncompleteSelection)?;
        Ok(format!(
            "Recommend 6 books for a {level} {genre} reader feeling {mood}. Explain briefly."
        ))
    }

    /// Issue one request and tag its result. Service failures are logged and
    /// returned as [`FetchOutcome::Failure`], never as an `Err`.
    pub async fn fetch(&self, selection: &Selection) -> Result<FetchOutcome> {
        let prompt = Self::prompt_for(selection)?;
        info!(prompt = %prompt, "Requesting recommendations");

        let outcome = match self.service.generate(&prompt).await {
            Ok(Some(text)) => {
                info!(chars = text.len(), "Recommendations received");
                FetchOutcome::Success(text)
            }
            Ok(None) => {
                warn!("Service response carried no recommendation text");
                FetchOutcome::Empty
            }
            Err(e) => {
                error!(error = %e, "Recommendation request failed");
                FetchOutcome::Failure(e.to_string())
            }
        };
        Ok(outcome)
    }

    /// Apply the completion and notify the observer when an entry was appended.
    pub fn finish(&self, state: AppState, outcome: FetchOutcome) -> AppState {
        let appended = !matches!(outcome, FetchOutcome::Failure(_));
        let next = reduce(state, Action::FetchFinished(outcome));
        if appended {
            self.announce(&next);
        }
        next
    }

    /// Report the newest entry of an accumulating state to the observer.
    ///
    /// Callers that fold the completion under a storage lock call this after the
    /// lock is released.
    pub fn announce(&self, state: &AppState) {
        if state.recommendations.mode() != ResultMode::Accumulate {
            return;
        }
        if let Some(entry) = state.recommendations.latest() {
            self.observer
                .on_appended(entry, state.recommendations.len());
        }
    }

    /// Run one full attempt against a caller-owned state.
    ///
    /// On validation or in-flight rejection the error is returned and the caller's
    /// state is left as it was.
    pub async fn trigger(&self, state: &AppState) -> Result<AppState> {
        let loading = begin_fetch(state)?;
        let outcome = self.fetch(&loading.selection).await?;
        Ok(self.finish(loading, outcome))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::selection::Level;
    use crate::state::{FETCH_ERROR_MESSAGE, NO_RECOMMENDATION_FALLBACK, RequestState};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) enum Reply {
        Text(&'static str),
        Empty,
        Fail,
    }

    /// Replays canned replies in order and records the prompts it saw
    #[derive(Default)]
    pub(crate) struct StubService {
        replies: Mutex<VecDeque<Reply>>,
        pub(crate) prompts: Mutex<Vec<String>>,
        pub(crate) calls: AtomicUsize,
    }

    impl StubService {
        pub(crate) fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl RecommendationService for StubService {
        async fn generate(&self, prompt: &str) -> std::result::Result<Option<String>, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.replies.lock().unwrap().pop_front() {
                Some(Reply::Text(text)) => Ok(Some(text.to_string())),
                Some(Reply::Empty) => Ok(None),
                Some(Reply::Fail) | None => Err(ServiceError::Decode(
                    serde_json::from_str::<serde_json::Value>("not json").unwrap_err(),
                )),
            }
        }
    }

    #[derive(Default)]
    pub(crate) struct RecordingObserver {
        pub(crate) seen: Mutex<Vec<(String, usize)>>,
    }

    impl RecommendationObserver for RecordingObserver {
        fn on_appended(&self, entry: &str, total: usize) {
            self.seen.lock().unwrap().push((entry.to_string(), total));
        }
    }

    pub(crate) fn selected(mode: ResultMode) -> AppState {
        let state = AppState::new(mode);
        let state = reduce(state, Action::SetGenre("Fiction".into()));
        let state = reduce(state, Action::SetMood("Happy".into()));
        reduce(state, Action::SetLevel(Some(Level::Beginner)))
    }

    #[test]
    fn prompt_embeds_all_three_facets() {
        let state = selected(ResultMode::Single);
        assert_eq!(
            RecommendationController::prompt_for(&state.selection).unwrap(),
            "Recommend 6 books for a Beginner Fiction reader feeling Happy. Explain briefly."
        );
    }

    #[tokio::test]
    async fn successful_trigger_records_text() {
        let service = Arc::new(StubService::new([Reply::Text("Try book X")]));
        let controller = RecommendationController::new(service.clone());

        let state = controller.trigger(&selected(ResultMode::Single)).await.unwrap();

        assert_eq!(state.request, RequestState::Success);
        assert_eq!(state.recommendations.entries(), ["Try book X"]);
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_reply_uses_fallback() {
        let service = Arc::new(StubService::new([Reply::Empty]));
        let controller = RecommendationController::new(service);

        let state = controller.trigger(&selected(ResultMode::Single)).await.unwrap();

        assert_eq!(state.request, RequestState::Success);
        assert_eq!(
            state.recommendations.latest(),
            Some(NO_RECOMMENDATION_FALLBACK)
        );
    }

    #[tokio::test]
    async fn failure_sets_error_and_keeps_results() {
        let service = Arc::new(StubService::new([Reply::Text("Try book X"), Reply::Fail]));
        let controller = RecommendationController::new(service);

        let first = controller.trigger(&selected(ResultMode::Single)).await.unwrap();
        let second = controller.trigger(&first).await.unwrap();

        assert_eq!(
            second.request,
            RequestState::Error(FETCH_ERROR_MESSAGE.to_string())
        );
        assert_eq!(second.recommendations, first.recommendations);
    }

    #[tokio::test]
    async fn incomplete_selection_never_calls_service() {
        let service = Arc::new(StubService::new([Reply::Text("unused")]));
        let controller = RecommendationController::new(service.clone());

        let mut state = AppState::new(ResultMode::Accumulate);
        for action in [
            Action::SetGenre("Fiction".into()),
            Action::SetMood("Happy".into()),
        ] {
            let before = state.clone();
            let err = controller.trigger(&state).await.unwrap_err();
            assert_eq!(err, FlowError::IncompleteSelection);
            assert_eq!(state, before);
            state = reduce(state, action);
        }
        assert_eq!(
            controller.trigger(&state).await.unwrap_err(),
            FlowError::IncompleteSelection
        );

        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
        assert_eq!(state.request, RequestState::Idle);
    }

    #[tokio::test]
    async fn accumulate_notifies_observer_per_append() {
        let service = Arc::new(StubService::new([
            Reply::Text("first"),
            Reply::Fail,
            Reply::Empty,
        ]));
        let observer = Arc::new(RecordingObserver::default());
        let controller =
            RecommendationController::new(service).with_observer(observer.clone());

        let mut state = selected(ResultMode::Accumulate);
        for _ in 0..3 {
            state = controller.trigger(&state).await.unwrap();
        }

        assert_eq!(
            state.recommendations.entries(),
            ["first", NO_RECOMMENDATION_FALLBACK]
        );
        assert_eq!(
            *observer.seen.lock().unwrap(),
            vec![
                ("first".to_string(), 1),
                (NO_RECOMMENDATION_FALLBACK.to_string(), 2)
            ]
        );
    }

    #[tokio::test]
    async fn single_mode_does_not_notify() {
        let service = Arc::new(StubService::new([Reply::Text("only")]));
        let observer = Arc::new(RecordingObserver::default());
        let controller =
            RecommendationController::new(service).with_observer(observer.clone());

        controller.trigger(&selected(ResultMode::Single)).await.unwrap();

        assert!(observer.seen.lock().unwrap().is_empty());
    }
}
