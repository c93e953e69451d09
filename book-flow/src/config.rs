use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::Catalog;
use crate::error::{FlowError, Result};
use crate::state::ResultMode;

pub const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

/// Connection settings for the Gemini `generateContent` endpoint
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_url: String,
    /// Sent as the `key` query parameter. A missing key is not rejected up front;
    /// the service refuses the call and the session lands in the error state.
    pub api_key: Option<String>,
    pub timeout: Option<Duration>,
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GEMINI_API_URL.to_string(),
            api_key: None,
            timeout: None,
        }
    }
}

impl GeminiConfig {
    pub fn from_env() -> Result<Self> {
        let api_url =
            std::env::var("GEMINI_API_URL").unwrap_or_else(|_| DEFAULT_GEMINI_API_URL.to_string());
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        let timeout = match std::env::var("GEMINI_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs = raw.parse::<u64>().map_err(|_| {
                    FlowError::Config(format!("GEMINI_TIMEOUT_SECS is not a number: {}", raw))
                })?;
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        Ok(Self {
            api_url,
            api_key,
            timeout,
        })
    }
}

/// Everything needed to build a controller: endpoint, result mode and catalog source
#[derive(Debug, Clone, Default)]
pub struct FlowConfig {
    pub gemini: GeminiConfig,
    pub result_mode: ResultMode,
    pub catalog_path: Option<PathBuf>,
}

impl FlowConfig {
    pub fn from_env() -> Result<Self> {
        let result_mode = match std::env::var("RESULT_MODE") {
            Ok(raw) => raw.parse()?,
            Err(_) => ResultMode::default(),
        };

        Ok(Self {
            gemini: GeminiConfig::from_env()?,
            result_mode,
            catalog_path: std::env::var_os("CATALOG_PATH").map(PathBuf::from),
        })
    }

    /// The configured catalog file, or the builtin catalog when none is set.
    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog_path {
            Some(path) => Catalog::from_path(path),
            None => Ok(Catalog::builtin()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_api_key() {
        let config = FlowConfig {
            gemini: GeminiConfig {
                api_key: Some("secret-key-123".into()),
                ..GeminiConfig::default()
            },
            ..FlowConfig::default()
        };

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret-key-123"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains(DEFAULT_GEMINI_API_URL));
    }
}
