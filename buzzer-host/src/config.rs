//! Host configuration: discovery and feedback tunables with sane defaults.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tunables for discovery, connection, and feedback timing. Every field has
/// a default; a config file only needs the values it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Advertised name prefix the discovery filter matches on.
    pub name_prefix: String,
    /// Ignore advertisements weaker than this (dBm). Keeps a buzzer in the
    /// next room from winning the scan.
    pub min_rssi: i16,
    /// Connection attempts before giving up.
    pub connect_retries: u32,
    /// Delay between connection attempts in milliseconds.
    pub retry_delay_ms: u64,
    /// Duration of the correct/incorrect feedback flash in milliseconds.
    pub feedback_flash_ms: u64,
    /// Step duration of the manual test pattern in milliseconds.
    pub test_pattern_step_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            name_prefix: buzzer_proto::DEVICE_NAME_PREFIX.to_string(),
            min_rssi: -80,
            connect_retries: 3,
            retry_delay_ms: 1000,
            feedback_flash_ms: 500,
            test_pattern_step_ms: 300,
        }
    }
}

impl HostConfig {
    /// Load from a JSON file, falling back to defaults if the file does not
    /// exist. A present-but-invalid file is an error, not a silent default.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_track_protocol_name_prefix() {
        let config = HostConfig::default();
        assert_eq!(config.name_prefix, buzzer_proto::DEVICE_NAME_PREFIX);
        assert_eq!(config.feedback_flash_ms, 500);
    }

    #[test]
    fn partial_json_keeps_defaults_for_rest() {
        let config: HostConfig = serde_json::from_str(r#"{"feedback_flash_ms": 250}"#).unwrap();
        assert_eq!(config.feedback_flash_ms, 250);
        assert_eq!(config.connect_retries, 3);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = HostConfig::load(Path::new("/nonexistent/buzzer-host.json")).unwrap();
        assert_eq!(config.min_rssi, -80);
    }
}
