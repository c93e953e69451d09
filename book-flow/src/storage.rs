use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{FlowError, Result};
use crate::state::{AppState, ResultMode};

/// One open page: an id and the state container it renders from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Last state change; idle expiry is measured from here
    pub updated_at: DateTime<Utc>,
    pub state: AppState,
}

impl Session {
    pub fn new(mode: ResultMode) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), mode)
    }

    pub fn with_id(id: impl Into<String>, mode: ResultMode) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            created_at: now,
            updated_at: now,
            state: AppState::new(mode),
        }
    }
}

/// Transition applied to a stored state under the storage's entry lock
pub type StateUpdate<'a> = &'a (dyn Fn(&AppState) -> Result<AppState> + Send + Sync);

/// Trait for storing and mutating sessions
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: Session) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Session>>;
    async fn delete(&self, id: &str) -> Result<()>;

    /// Atomically replace the session's state with `update(current)`.
    ///
    /// When `update` fails the stored state is left untouched and the error is
    /// returned. Returns the new state on success.
    async fn update(&self, id: &str, update: StateUpdate<'_>) -> Result<AppState>;

    /// Drop sessions untouched for longer than `max_idle`. Sessions with a request
    /// in flight are kept. Returns how many were removed.
    async fn purge_idle(&self, max_idle: Duration) -> Result<usize>;
}

/// In-memory implementation of SessionStorage.
///
/// Sessions live until deleted or purged by [`SessionStorage::purge_idle`]; the
/// service runs that sweep periodically.
#[derive(Default)]
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, Session>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: Session) -> Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }

    async fn update(&self, id: &str, update: StateUpdate<'_>) -> Result<AppState> {
        let mut entry = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| FlowError::SessionNotFound(id.to_string()))?;
        let next = update(&entry.state)?;
        entry.state = next.clone();
        entry.updated_at = Utc::now();
        Ok(next)
    }

    async fn purge_idle(&self, max_idle: Duration) -> Result<usize> {
        let max_idle = chrono::Duration::from_std(max_idle)
            .map_err(|e| FlowError::Config(format!("invalid idle limit: {}", e)))?;
        let cutoff = Utc::now() - max_idle;

        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.state.request.is_loading() || session.updated_at >= cutoff);
        Ok(before.saturating_sub(self.sessions.len()))
    }
}
