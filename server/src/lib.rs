//! Standalone server hosting an in-memory cabinet store over websockets.

use std::str::FromStr;

use tracing::Level;

pub const DEFAULT_BIND: &str = "127.0.0.1:8888";

/// Environment driven settings for the `cabinet-server` binary
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind: String,
    pub log_level: Level,
}

impl Default for ServerConfig {
    fn default() -> Self { Self { bind: DEFAULT_BIND.to_owned(), log_level: Level::INFO } }
}

impl ServerConfig {
    /// Reads `CABINET_BIND` and `LOG_LEVEL`, falling back to the defaults
    pub fn from_env() -> anyhow::Result<Self> { Self::from_lookup(|key| std::env::var(key).ok()) }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Some(bind) = lookup("CABINET_BIND") {
            config.bind = bind;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = Level::from_str(&level).map_err(|e| anyhow::anyhow!("invalid LOG_LEVEL {level:?}: {e}"))?;
        }
        Ok(config)
    }
}
