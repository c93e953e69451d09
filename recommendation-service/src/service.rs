use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::Json,
    routing::{get, post, put},
};
use book_flow::{Action, FlowError, Level, Session, reduce};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info};
use uuid::Uuid;

use crate::{
    models::{CatalogResponse, ErrorResponse, SelectRequest, SessionView},
    workflow::ServiceState,
};

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn api_error(status: StatusCode, message: impl Into<String>, session_id: Option<&str>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            session_id: session_id.map(str::to_string),
        }),
    )
}

/// Map a flow error onto the HTTP status a client can act on
fn flow_error(e: FlowError, session_id: &str) -> ApiError {
    let status = match &e {
        FlowError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        FlowError::UnknownGenre(_) | FlowError::UnavailableMood { .. } | FlowError::UnknownLevel(_) => {
            StatusCode::BAD_REQUEST
        }
        FlowError::IncompleteSelection => StatusCode::UNPROCESSABLE_ENTITY,
        FlowError::RequestInFlight => StatusCode::CONFLICT,
        FlowError::Catalog(_) | FlowError::Config(_) => {
            error!(session_id = %session_id, error = %e, "Unexpected flow error");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    api_error(status, e.to_string(), Some(session_id))
}

/// Middleware to add correlation ID to all requests
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert("x-correlation-id", value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

pub async fn create_app(state: ServiceState) -> Router {
    build_router(state)
}

pub fn build_router(state: ServiceState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/catalog", get(catalog))
        .route("/sessions", post(create_session))
        .route("/sessions/{session_id}", get(get_session).delete(delete_session))
        .route("/sessions/{session_id}/genre", put(set_genre))
        .route("/sessions/{session_id}/mood", put(set_mood))
        .route("/sessions/{session_id}/level", put(set_level))
        .route("/sessions/{session_id}/recommendations", post(recommend))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Book Recommendation Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Pick a genre, mood and reading level, then ask Gemini for book recommendations",
        "endpoints": {
            "GET /catalog": "Genres, moods per genre and reading levels",
            "POST /sessions": "Open a new session",
            "GET /sessions/{session_id}": "Render a session",
            "PUT /sessions/{session_id}/genre": "Choose a genre (clears the mood)",
            "PUT /sessions/{session_id}/mood": "Choose a mood offered for the genre",
            "PUT /sessions/{session_id}/level": "Choose a reading level",
            "POST /sessions/{session_id}/recommendations": "Request recommendations",
            "DELETE /sessions/{session_id}": "Close a session",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn catalog(State(state): State<ServiceState>) -> Json<CatalogResponse> {
    Json(CatalogResponse::from(state.catalog.as_ref()))
}

async fn create_session(State(state): State<ServiceState>) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let session = Session::new(state.result_mode);
    let session_id = session.id.clone();
    let view = SessionView::render(&session, &state.catalog);

    state
        .session_storage
        .save(session)
        .await
        .map_err(|e| flow_error(e, &session_id))?;

    info!(session_id = %session_id, result_mode = %state.result_mode, "Session created");
    Ok((StatusCode::CREATED, Json(view)))
}

async fn load_view(state: &ServiceState, session_id: &str) -> ApiResult<SessionView> {
    match state.session_storage.get(session_id).await {
        Ok(Some(session)) => Ok(Json(SessionView::render(&session, &state.catalog))),
        Ok(None) => Err(flow_error(
            FlowError::SessionNotFound(session_id.to_string()),
            session_id,
        )),
        Err(e) => Err(flow_error(e, session_id)),
    }
}

async fn get_session(
    State(state): State<ServiceState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionView> {
    load_view(&state, &session_id).await
}

async fn delete_session(
    State(state): State<ServiceState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state
        .session_storage
        .get(&session_id)
        .await
        .map_err(|e| flow_error(e, &session_id))?
        .is_none()
    {
        return Err(flow_error(
            FlowError::SessionNotFound(session_id.clone()),
            &session_id,
        ));
    }

    state
        .session_storage
        .delete(&session_id)
        .await
        .map_err(|e| flow_error(e, &session_id))?;
    info!(session_id = %session_id, "Session closed");
    Ok(StatusCode::NO_CONTENT)
}

async fn set_genre(
    State(state): State<ServiceState>,
    Path(session_id): Path<String>,
    Json(request): Json<SelectRequest>,
) -> ApiResult<SessionView> {
    let genre = request.value.trim().to_string();
    if !genre.is_empty() && !state.catalog.contains_genre(&genre) {
        return Err(flow_error(FlowError::UnknownGenre(genre), &session_id));
    }

    state
        .session_storage
        .update(&session_id, &|current| {
            Ok(reduce(current.clone(), Action::SetGenre(genre.clone())))
        })
        .await
        .map_err(|e| flow_error(e, &session_id))?;

    info!(session_id = %session_id, genre = %genre, "Genre selected");
    load_view(&state, &session_id).await
}

async fn set_mood(
    State(state): State<ServiceState>,
    Path(session_id): Path<String>,
    Json(request): Json<SelectRequest>,
) -> ApiResult<SessionView> {
    let mood = request.value.trim().to_string();
    let catalog = state.catalog.clone();

    // Only moods offered for the session's current genre are accepted.
    state
        .session_storage
        .update(&session_id, &|current| {
            if !mood.is_empty() {
                let genre = current.selection.genre.clone().unwrap_or_default();
                if !catalog.offers_mood(&genre, &mood) {
                    return Err(FlowError::UnavailableMood {
                        genre,
                        mood: mood.clone(),
                    });
                }
            }
            Ok(reduce(current.clone(), Action::SetMood(mood.clone())))
        })
        .await
        .map_err(|e| flow_error(e, &session_id))?;

    info!(session_id = %session_id, mood = %mood, "Mood selected");
    load_view(&state, &session_id).await
}

async fn set_level(
    State(state): State<ServiceState>,
    Path(session_id): Path<String>,
    Json(request): Json<SelectRequest>,
) -> ApiResult<SessionView> {
    let level = Level::parse_optional(&request.value).map_err(|e| flow_error(e, &session_id))?;

    state
        .session_storage
        .update(&session_id, &|current| {
            Ok(reduce(current.clone(), Action::SetLevel(level)))
        })
        .await
        .map_err(|e| flow_error(e, &session_id))?;

    info!(session_id = %session_id, level = ?level, "Level selected");
    load_view(&state, &session_id).await
}

async fn recommend(
    State(state): State<ServiceState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionView> {
    info!(session_id = %session_id, "Recommendation requested");

    state
        .runner
        .run(&session_id)
        .await
        .map_err(|e| flow_error(e, &session_id))?;

    load_view(&state, &session_id).await
}
