use book_flow::{
    Catalog, FlowConfig, GeminiClient, InMemorySessionStorage,
    RecommendationController, RecommendationRunner, ResultMode, SessionStorage,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

pub fn build_controller(config: &FlowConfig) -> book_flow::Result<RecommendationController> {
    let client = GeminiClient::new(config.gemini.clone())?;
    info!(
        api_url = %config.gemini.api_url,
        api_key_set = config.gemini.api_key.is_some(),
        "Gemini client configured"
    );
    Ok(RecommendationController::new(Arc::new(client)))
}

pub fn create_runner(
    controller: RecommendationController,
    session_storage: Arc<dyn SessionStorage>,
) -> RecommendationRunner {
    RecommendationRunner::new(Arc::new(controller), session_storage)
}

/// Shared handler state: the runner, its session storage and the catalog
#[derive(Clone)]
pub struct ServiceState {
    pub runner: RecommendationRunner,
    pub session_storage: Arc<dyn SessionStorage>,
    pub catalog: Arc<Catalog>,
    pub result_mode: ResultMode,
}

impl ServiceState {
    pub fn new(controller: RecommendationController, catalog: Catalog, result_mode: ResultMode) -> Self {
        let session_storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
        Self {
            runner: create_runner(controller, session_storage.clone()),
            session_storage,
            catalog: Arc::new(catalog),
            result_mode,
        }
    }

    pub fn from_config(config: &FlowConfig) -> book_flow::Result<Self> {
        let catalog = config.load_catalog()?;
        let controller = build_controller(config)?;
        info!(
            result_mode = %config.result_mode,
            genres = catalog.genres().len(),
            "Service state ready"
        );
        Ok(Self::new(controller, catalog, config.result_mode))
    }
}

/// Purge idle sessions every quarter of `max_idle` until the process exits.
pub async fn expire_idle_sessions(storage: Arc<dyn SessionStorage>, max_idle: Duration) {
    let mut ticker = tokio::time::interval((max_idle / 4).max(Duration::from_secs(1)));
    loop {
        ticker.tick().await;
        match storage.purge_idle(max_idle).await {
            Ok(0) => debug!("No idle sessions to purge"),
            Ok(removed) => info!(removed, "Purged idle sessions"),
            Err(e) => error!(error = %e, "Idle session sweep failed"),
        }
    }
}
