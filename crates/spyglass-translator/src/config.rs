use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Translator settings loaded from `translator.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default)]
    pub datagram: DatagramConfig,
}

/// Session setup values for datagram-transport versions, applied at the
/// transport layer before any data flows.
#[derive(Debug, Clone, Deserialize)]
pub struct DatagramConfig {
    #[serde(default = "default_protocol_revision")]
    pub protocol_revision: u32,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,
}

fn default_protocol_revision() -> u32 {
    11
}

fn default_connect_timeout_ms() -> u64 {
    4_000
}

fn default_session_timeout_ms() -> u64 {
    30_000
}

impl Default for DatagramConfig {
    fn default() -> Self {
        Self {
            protocol_revision: default_protocol_revision(),
            connect_timeout_ms: default_connect_timeout_ms(),
            session_timeout_ms: default_session_timeout_ms(),
        }
    }
}

impl DatagramConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }
}

impl TranslatorConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: TranslatorConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TranslatorConfig::default();
        assert_eq!(config.datagram.protocol_revision, 11);
        assert_eq!(config.datagram.connect_timeout(), Duration::from_secs(4));
        assert_eq!(config.datagram.session_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: TranslatorConfig =
            toml::from_str("[datagram]\nconnect_timeout_ms = 1500\n").unwrap();
        assert_eq!(config.datagram.connect_timeout_ms, 1_500);
        assert_eq!(config.datagram.protocol_revision, 11);
    }
}
