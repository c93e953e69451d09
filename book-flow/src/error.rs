use thiserror::Error;

/// Errors raised by the selection store, the controller and session storage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// Blocking prompt shown when a trigger arrives with an incomplete selection
    #[error("Please select Genre, Mood and Level")]
    IncompleteSelection,

    #[error("A recommendation request is already in flight")]
    RequestInFlight,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Unknown genre: {0}")]
    UnknownGenre(String),

    #[error("Mood '{mood}' is not available for genre '{genre}'")]
    UnavailableMood { genre: String, mood: String },

    #[error("Unknown reading level: {0}")]
    UnknownLevel(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;

/// Failures of the outbound call to the recommendation service
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service responded with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("could not decode service response: {0}")]
    Decode(#[from] serde_json::Error),
}
