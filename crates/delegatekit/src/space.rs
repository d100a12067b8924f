//! Static configuration of a governance space, as seen by delegation readers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DelegationError;

/// A governance space and the voting-power strategies it is configured with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceConfig {
    /// Space identifier, e.g. `"gnosis.eth"`.
    pub id: String,
    /// Network (chain) id the space votes on, e.g. `"1"`.
    pub network: String,
    /// Voting-power strategies, in configured order.
    #[serde(default)]
    pub strategies: Vec<StrategyConfig>,
}

/// A named strategy with its opaque parameter bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default)]
    pub params: Value,
}

impl SpaceConfig {
    pub fn new(id: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            network: network.into(),
            strategies: Vec::new(),
        }
    }

    pub fn with_strategy(mut self, name: impl Into<String>, params: Value) -> Self {
        self.strategies.push(StrategyConfig {
            name: name.into(),
            network: None,
            params,
        });
        self
    }

    /// First strategy called `name`, if any.
    pub fn strategy(&self, name: &str) -> Option<&StrategyConfig> {
        self.strategies.iter().find(|s| s.name == name)
    }

    /// The single strategy called `name`.
    ///
    /// Fails with [`DelegationError::ConfigurationError`] when the strategy is
    /// missing or configured more than once.
    pub fn unique_strategy(&self, name: &str) -> Result<&StrategyConfig, DelegationError> {
        let mut matches = self.strategies.iter().filter(|s| s.name == name);
        match (matches.next(), matches.next()) {
            (Some(strategy), None) => Ok(strategy),
            (None, _) => Err(DelegationError::ConfigurationError(format!(
                "{} strategy not found",
                name.replace('-', " ")
            ))),
            (Some(_), Some(_)) => Err(DelegationError::ConfigurationError(format!(
                "space '{}' configures the {} strategy more than once",
                self.id, name
            ))),
        }
    }
}
