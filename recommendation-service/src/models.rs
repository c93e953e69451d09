use book_flow::{Catalog, Level, RequestState, ResultMode, Session};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const TRIGGER_LABEL: &str = "Get Recommendations";
pub const TRIGGER_LABEL_LOADING: &str = "Loading...";

/// Body of the genre / mood / level selector endpoints; empty string unsets
#[derive(Debug, Serialize, Deserialize)]
pub struct SelectRequest {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub genres: Vec<String>,
    pub moods: HashMap<String, Vec<String>>,
    pub levels: Vec<Level>,
}

impl From<&Catalog> for CatalogResponse {
    fn from(catalog: &Catalog) -> Self {
        Self {
            genres: catalog.genres().to_vec(),
            moods: catalog.moods().clone(),
            levels: Level::ALL.to_vec(),
        }
    }
}

/// Current selector values, empty strings standing for "nothing chosen"
#[derive(Debug, Serialize, Deserialize)]
pub struct SelectionView {
    pub genre: String,
    pub mood: String,
    pub level: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TriggerView {
    pub label: String,
    pub enabled: bool,
}

/// Everything a client needs to render one session
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub selection: SelectionView,
    pub available_moods: Vec<String>,
    pub mood_enabled: bool,
    pub request: RequestState,
    pub error: Option<String>,
    pub trigger: TriggerView,
    pub result_mode: ResultMode,
    pub recommendations: Vec<String>,
}

impl SessionView {
    pub fn render(session: &Session, catalog: &Catalog) -> Self {
        let state = &session.state;
        let selection = &state.selection;
        let loading = state.request.is_loading();

        Self {
            session_id: session.id.clone(),
            created_at: session.created_at,
            selection: SelectionView {
                genre: selection.genre.clone().unwrap_or_default(),
                mood: selection.mood.clone().unwrap_or_default(),
                level: selection
                    .level
                    .map(|level| level.to_string())
                    .unwrap_or_default(),
            },
            available_moods: selection.available_moods(catalog).to_vec(),
            mood_enabled: selection.genre.is_some(),
            request: state.request.clone(),
            error: state.request.error_message().map(str::to_string),
            trigger: TriggerView {
                label: if loading {
                    TRIGGER_LABEL_LOADING
                } else {
                    TRIGGER_LABEL
                }
                .to_string(),
                enabled: !loading,
            },
            result_mode: state.recommendations.mode(),
            recommendations: state.recommendations.entries().to_vec(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}
