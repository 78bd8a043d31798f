//! Engine configuration.

use oxipack_core::error::{PackError, Result};
use serde::{Deserialize, Serialize};

/// Default ceiling on the summed size of one request's files (64 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: u64 = 64 * 1024 * 1024;

/// Default number of finished archives kept for retrieval.
pub const DEFAULT_STORE_CAPACITY: usize = 64;

/// Default smallest progress increase worth reporting, in percent.
pub const DEFAULT_PROGRESS_STEP: f64 = 1.0;

/// Tunables for [`crate::Engine`].
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use oxipack_engine::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{ "workers": 2 }"#).unwrap();
/// assert_eq!(config.workers, 2);
/// assert_eq!(config.store_capacity, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Requests whose files sum to more than this are rejected.
    pub max_payload_bytes: u64,
    /// Worker threads for per-file encoding; 0 lets rayon decide.
    pub workers: usize,
    /// Finished archives kept before the oldest is evicted.
    pub store_capacity: usize,
    /// Progress is only reported once it moved by at least this many percent.
    pub progress_step: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            workers: 0,
            store_capacity: DEFAULT_STORE_CAPACITY,
            progress_step: DEFAULT_PROGRESS_STEP,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document, filling missing fields with defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| PackError::invalid_request(format!("invalid engine config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.store_capacity == 0 {
            return Err(PackError::invalid_request("store_capacity must be at least 1"));
        }
        if !(0.0..100.0).contains(&self.progress_step) {
            return Err(PackError::invalid_request(
                "progress_step must be in [0, 100)",
            ));
        }
        if self.max_payload_bytes > u64::from(u32::MAX) {
            return Err(PackError::invalid_request(
                "max_payload_bytes cannot exceed the 4 GiB container limit",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxipack_core::ErrorKind;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_payload_bytes, 64 * 1024 * 1024);
        assert_eq!(config.workers, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json(r#"{"max_payload_bytes": 1024}"#).unwrap();
        assert_eq!(config.max_payload_bytes, 1024);
        assert_eq!(config.store_capacity, DEFAULT_STORE_CAPACITY);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = EngineConfig::from_json(r#"{"store_capacity": 0}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert!(EngineConfig::from_json("not json").is_err());
        assert!(EngineConfig::from_json(r#"{"progress_step": 150.0}"#).is_err());
    }
}
