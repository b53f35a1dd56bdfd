use crate::calls::CallServiceError;
use callcore::types::BandwidthMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_RING_RETENTION_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CallServiceConfig {
    /// Device id of this client, sent with every offer and hangup.
    pub local_device_id: u32,
    /// Where group ring state is kept; in memory when unset.
    pub ring_store_path: Option<PathBuf>,
    /// Rings older than this are pruned on start.
    pub ring_retention_secs: u64,
    pub bandwidth_mode: BandwidthMode,
    /// Whether 1:1 signaling may reach every device of the callee.
    pub multi_ring: bool,
}

impl Default for CallServiceConfig {
    fn default() -> Self {
        Self {
            local_device_id: 1,
            ring_store_path: None,
            ring_retention_secs: DEFAULT_RING_RETENTION_SECS,
            bandwidth_mode: BandwidthMode::Normal,
            multi_ring: true,
        }
    }
}

impl CallServiceConfig {
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CallServiceError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| CallServiceError::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_slice(&data)
            .map_err(|e| CallServiceError::Config(format!("{}: {e}", path.display())))
    }

    /// Ring timestamps before this instant are pruned.
    pub fn ring_cutoff_millis(&self, now_millis: i64) -> i64 {
        let retention = i64::try_from(self.ring_retention_secs.saturating_mul(1000))
            .unwrap_or(i64::MAX);
        now_millis.saturating_sub(retention)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.json");
        tokio::fs::write(&path, br#"{"local_device_id": 3, "bandwidth_mode": "low"}"#)
            .await
            .unwrap();

        let config = CallServiceConfig::from_json_file(&path).await.unwrap();

        assert_eq!(config.local_device_id, 3);
        assert_eq!(config.bandwidth_mode, BandwidthMode::Low);
        assert!(config.multi_ring);
        assert_eq!(config.ring_retention_secs, DEFAULT_RING_RETENTION_SECS);
        assert!(config.ring_store_path.is_none());
    }

    #[tokio::test]
    async fn test_missing_or_invalid_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();

        let missing = CallServiceConfig::from_json_file(dir.path().join("nope.json")).await;
        assert!(matches!(missing, Err(CallServiceError::Config(_))));

        let path = dir.path().join("bad.json");
        tokio::fs::write(&path, b"{\"multi_ring\": 1}").await.unwrap();
        let invalid = CallServiceConfig::from_json_file(&path).await;
        assert!(matches!(invalid, Err(CallServiceError::Config(_))));
    }

    #[test]
    fn test_ring_cutoff() {
        let config = CallServiceConfig {
            ring_retention_secs: 10,
            ..Default::default()
        };
        assert_eq!(config.ring_cutoff_millis(60_000), 50_000);

        let forever = CallServiceConfig {
            ring_retention_secs: u64::MAX,
            ..Default::default()
        };
        assert_eq!(forever.ring_cutoff_millis(0), -i64::MAX);
    }
}
