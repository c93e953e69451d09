//! The single state container behind one page session and its transition function.
//!
//! Every mutation goes through [`reduce`], which takes the current state and an
//! [`Action`] and returns the next state. The asynchronous fetch is represented by
//! two actions: [`Action::FetchStarted`] before the call and
//! [`Action::FetchFinished`] carrying the tagged [`FetchOutcome`] after it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{FlowError, Result};
use crate::selection::{Level, Selection};

/// Fixed message stored in [`RequestState::Error`] after a transport or parse failure
pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch recommendations";

/// Recorded in place of a result when the service answered without any text
pub const NO_RECOMMENDATION_FALLBACK: &str = "No recommendations received.";

/// Status of the current recommendation attempt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum RequestState {
    #[default]
    Idle,
    Loading,
    Success,
    Error(String),
}

impl RequestState {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            RequestState::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// How successful results are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultMode {
    /// Only the latest result is kept
    Single,
    /// Every result is appended to an ordered history
    #[default]
    Accumulate,
}

impl fmt::Display for ResultMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultMode::Single => f.write_str("single"),
            ResultMode::Accumulate => f.write_str("accumulate"),
        }
    }
}

impl FromStr for ResultMode {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(ResultMode::Single),
            "accumulate" => Ok(ResultMode::Accumulate),
            other => Err(FlowError::Config(format!("unknown result mode: {}", other))),
        }
    }
}

/// Recommendation texts received so far.
///
/// In [`ResultMode::Single`] at most one entry exists and each success replaces it.
/// In [`ResultMode::Accumulate`] entries are only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendations {
    mode: ResultMode,
    entries: Vec<String>,
}

impl Recommendations {
    pub fn new(mode: ResultMode) -> Self {
        Self {
            mode,
            entries: Vec::new(),
        }
    }

    pub fn mode(&self) -> ResultMode {
        self.mode
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn record(&mut self, text: String) {
        if self.mode == ResultMode::Single {
            self.entries.clear();
        }
        self.entries.push(text);
    }
}

/// Tagged result of one call to the recommendation service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response carried extractable text
    Success(String),
    /// The response decoded but carried no text
    Empty,
    /// Transport, status or decode failure, with a diagnostic detail
    Failure(String),
}

/// Named actions accepted by [`reduce`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetGenre(String),
    SetMood(String),
    SetLevel(Option<Level>),
    FetchStarted,
    FetchFinished(FetchOutcome),
}

/// Everything one session renders from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    pub selection: Selection,
    pub request: RequestState,
    pub recommendations: Recommendations,
}

impl AppState {
    pub fn new(mode: ResultMode) -> Self {
        Self {
            selection: Selection::default(),
            request: RequestState::Idle,
            recommendations: Recommendations::new(mode),
        }
    }
}

/// Pure transition function: `(state, action) -> state`.
pub fn reduce(mut state: AppState, action: Action) -> AppState {
    match action {
        Action::SetGenre(genre) => state.selection.set_genre(genre),
        Action::SetMood(mood) => state.selection.set_mood(mood),
        Action::SetLevel(level) => state.selection.set_level(level),
        Action::FetchStarted => state.request = RequestState::Loading,
        Action::FetchFinished(FetchOutcome::Success(text)) => {
            state.request = RequestState::Success;
            state.recommendations.record(text);
        }
        Action::FetchFinished(FetchOutcome::Empty) => {
            state.request = RequestState::Success;
            state
                .recommendations
                .record(NO_RECOMMENDATION_FALLBACK.to_string());
        }
        // Results are kept as they were; only the status changes.
        Action::FetchFinished(FetchOutcome::Failure(_)) => {
            state.request = RequestState::Error(FETCH_ERROR_MESSAGE.to_string());
        }
    }
    state
}

/// Guarded entry into `Loading`.
///
/// Fails without touching the state when the selection is incomplete or a request
/// is already outstanding; otherwise applies [`Action::FetchStarted`], which also
/// clears any previous error.
pub fn begin_fetch(state: &AppState) -> Result<AppState> {
    if !state.selection.is_complete() {
        return Err(FlowError::IncompleteSelection);
    }
    if state.request.is_loading() {
        return Err(FlowError::RequestInFlight);
    }
    Ok(reduce(state.clone(), Action::FetchStarted))
}
