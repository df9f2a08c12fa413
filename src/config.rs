use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptConfig {
    #[serde(default = "ScriptConfig::default_max_operations")]
    pub max_operations: u64,
    #[serde(default = "ScriptConfig::default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "ScriptConfig::default_source")]
    pub default_source: String,
    /// When set, a freshly created computer starts dirty so its default
    /// source runs on the next tick.
    #[serde(default)]
    pub run_default_source: bool,
}

impl ScriptConfig {
    const fn default_max_operations() -> u64 {
        100_000
    }

    const fn default_timeout_ms() -> u64 {
        100
    }

    fn default_source() -> String {
        "\"Hello!\"".to_string()
    }
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            max_operations: Self::default_max_operations(),
            timeout_ms: Self::default_timeout_ms(),
            default_source: Self::default_source(),
            run_default_source: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub script: ScriptConfig,
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }
}
