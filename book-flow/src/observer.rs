use tracing::info;

/// Notified after a result is appended in accumulate mode.
///
/// Purely observational: implementations must not feed back into the state.
pub trait RecommendationObserver: Send + Sync {
    fn on_appended(&self, entry: &str, total: usize);
}

/// Logs each appended recommendation
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl RecommendationObserver for LoggingObserver {
    fn on_appended(&self, entry: &str, total: usize) {
        info!(total, entry = %entry, "Recommendation appended");
    }
}
