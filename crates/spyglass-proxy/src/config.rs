use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_upstream")]
    pub upstream: String,
    /// Version name to translate to; unset means native (no translation).
    #[serde(default)]
    pub target_version: Option<String>,
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,
}

fn default_bind() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    25565
}

fn default_upstream() -> String {
    "127.0.0.1:25566".into()
}

fn default_storage_dir() -> String {
    "config/spyglass".into()
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            upstream: default_upstream(),
            target_version: None,
            storage_dir: default_storage_dir(),
        }
    }
}

impl ProxyConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: ProxyConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}
