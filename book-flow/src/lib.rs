//! Book recommendation flow: a genre/mood/level selection store, a reducer-driven
//! request state machine and a client for the Gemini `generateContent` endpoint.
//!
//! ```text
//! set genre / mood / level ──► reduce ──► AppState ◄── reduce ◄── FetchFinished(outcome)
//!                                            │                          ▲
//!                         trigger ──► begin_fetch (Loading) ──► RecommendationService
//! ```

pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod observer;
pub mod runner;
pub mod selection;
pub mod service;
pub mod state;
pub mod storage;

// Re-export commonly used types
pub use catalog::Catalog;
pub use config::{FlowConfig, GeminiConfig};
pub use controller::RecommendationController;
pub use error::{FlowError, Result, ServiceError};
pub use observer::{LoggingObserver, RecommendationObserver};
pub use runner::RecommendationRunner;
pub use selection::{Level, Selection};
pub use service::{GeminiClient, RecommendationService};
pub use state::{
    Action, AppState, FETCH_ERROR_MESSAGE, FetchOutcome, NO_RECOMMENDATION_FALLBACK,
    Recommendations, RequestState, ResultMode, begin_fetch, reduce,
};
pub use storage::{InMemorySessionStorage, Session, SessionStorage};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn controller_against(server: &MockServer) -> RecommendationController {
        let client = GeminiClient::new(GeminiConfig {
            api_url: format!("{}/generateContent", server.uri()),
            api_key: Some("test-key".into()),
            timeout: None,
        })
        .unwrap();
        RecommendationController::new(Arc::new(client))
    }

    fn fiction_happy_beginner() -> AppState {
        [
            Action::SetGenre("Fiction".into()),
            Action::SetMood("Happy".into()),
            Action::SetLevel(Some(Level::Beginner)),
        ]
        .into_iter()
        .fold(AppState::new(ResultMode::Single), reduce)
    }

    #[tokio::test]
    async fn scenario_text_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Try book X"}]}}]
            })))
            .mount(&server)
            .await;

        let state = controller_against(&server)
            .await
            .trigger(&fiction_happy_beginner())
            .await
            .unwrap();

        assert_eq!(state.request, RequestState::Success);
        assert_eq!(state.recommendations.latest(), Some("Try book X"));
    }

    #[tokio::test]
    async fn scenario_empty_object_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let state = controller_against(&server)
            .await
            .trigger(&fiction_happy_beginner())
            .await
            .unwrap();

        assert_eq!(state.request, RequestState::Success);
        assert_eq!(
            state.recommendations.latest(),
            Some(NO_RECOMMENDATION_FALLBACK)
        );
    }

    #[tokio::test]
    async fn scenario_server_error_keeps_previous_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Try book X"}]}}]
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let controller = controller_against(&server).await;
        let first = controller.trigger(&fiction_happy_beginner()).await.unwrap();
        let second = controller.trigger(&first).await.unwrap();

        assert_eq!(
            second.request,
            RequestState::Error(FETCH_ERROR_MESSAGE.into())
        );
        assert_eq!(second.recommendations.latest(), Some("Try book X"));
    }

    #[tokio::test]
    async fn scenario_nothing_selected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let state = AppState::new(ResultMode::Single);
        let err = controller_against(&server)
            .await
            .trigger(&state)
            .await
            .unwrap_err();

        assert_eq!(err, FlowError::IncompleteSelection);
        assert_eq!(err.to_string(), "Please select Genre, Mood and Level");
        assert_eq!(state.request, RequestState::Idle);
    }
}
