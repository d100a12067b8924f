use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::SpaceConfig;

/// Spaces known to a deployment plus settings for each delegation reader,
/// keyed by strategy name.
///
/// ```toml
/// [readers.split-delegation]
/// base_url = "https://delegate-api.example.org"
///
/// [[spaces]]
/// id = "gnosis.eth"
/// network = "1"
/// strategies = [{ name = "split-delegation", params = { totalSupply = 5000000 } }]
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct DelegationConfig {
    #[serde(default)]
    pub spaces: Vec<SpaceConfig>,
    #[serde(default)]
    pub readers: HashMap<String, Value>,
}

impl DelegationConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p: &Path = path.as_ref();
        if !p.exists() {
            return Err(anyhow::anyhow!("Config file not found at: {}", p.display()));
        }
        let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");

        let content = fs::read_to_string(p)
            .with_context(|| format!("Failed to read config file at {}", p.display()))?;

        let config = match ext {
            "json" => serde_json::from_str(&content)?,
            "toml" => toml::from_str(&content)?,
            _ => return Err(anyhow::anyhow!("Unsupported config format: {}", ext)),
        };

        Ok(config)
    }

    pub fn space(&self, id: &str) -> Option<&SpaceConfig> {
        self.spaces.iter().find(|s| s.id == id)
    }
}
