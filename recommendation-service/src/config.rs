use book_flow::{FlowConfig, FlowError};
use std::time::Duration;

pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

/// Configuration for the recommendation service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub log_format: String,
    /// Sessions idle longer than this are purged; `None` keeps them until deleted
    pub session_idle: Option<Duration>,
    pub flow: FlowConfig,
}

impl ServiceConfig {
    pub fn from_env() -> book_flow::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|raw| raw.parse::<u16>().ok())
            .unwrap_or(3000);
        let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
        let session_idle = match std::env::var("SESSION_IDLE_SECS") {
            Ok(raw) => match raw.parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    return Err(FlowError::Config(format!(
                        "SESSION_IDLE_SECS is not a number: {}",
                        raw
                    )));
                }
            },
            Err(_) => Some(DEFAULT_SESSION_IDLE),
        };

        Ok(Self {
            port,
            log_format,
            session_idle,
            flow: FlowConfig::from_env()?,
        })
    }
}
