//! Server configuration.

use oxipack_core::error::{PackError, Result};
use oxipack_engine::EngineConfig;
use serde::{Deserialize, Serialize};

/// Multipart framing allowed on top of the engine's payload ceiling.
pub const FORM_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Settings for [`crate::serve`] and [`crate::router`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,
    /// Prefix every route is mounted under.
    pub api_prefix: String,
    /// Engine settings.
    pub engine: EngineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            api_prefix: "/api".to_string(),
            engine: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parse a JSON document, filling missing fields with defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| PackError::invalid_request(format!("invalid server config: {e}")))?;
        config.engine.validate()?;
        if !config.api_prefix.is_empty() && !config.api_prefix.starts_with('/') {
            return Err(PackError::invalid_request("api_prefix must start with '/'"));
        }
        Ok(config)
    }

    /// Largest request body accepted.
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.engine.max_payload_bytes.saturating_add(FORM_OVERHEAD_BYTES))
            .unwrap_or(usize::MAX)
    }
}
