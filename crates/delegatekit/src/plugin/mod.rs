use std::{collections::HashMap, path::Path, sync::Arc};

use serde_json::Value;
use tracing::instrument;

use crate::{
    DelegationReader, SpaceConfig, adapters::DelegationReaderFromHTTP, config::DelegationConfig,
    error::DelegationError, outbound::Outbound,
};

pub mod http;
pub use http::HTTPDelegationReaderFactory;

/// Selects a delegation reader for a space by the names of its strategies.
pub struct ReaderRegistry {
    factories: HashMap<String, Arc<dyn HTTPDelegationReaderFactory>>,
    settings: HashMap<String, Value>,
    outbound: Arc<dyn Outbound>,
}

impl ReaderRegistry {
    pub fn new(outbound: Arc<dyn Outbound>) -> Self {
        Self {
            factories: HashMap::new(),
            settings: HashMap::new(),
            outbound,
        }
    }

    /// Registry using the default `reqwest` transport and the reader settings of `config`.
    #[cfg(feature = "http-client")]
    pub fn from_config(config: &DelegationConfig) -> Self {
        let mut registry = Self::new(crate::outbound::default_outbound());
        registry.settings = config.readers.clone();
        registry
    }

    #[cfg(feature = "http-client")]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DelegationError> {
        let config = DelegationConfig::from_path(path)
            .map_err(|e| DelegationError::ConfigurationError(format!("{:#}", e)))?;
        Ok(Self::from_config(&config))
    }

    pub fn register(&mut self, factory: Arc<dyn HTTPDelegationReaderFactory>) {
        log::debug!("Registering delegation reader '{}'", factory.name());
        self.factories.insert(factory.name().to_string(), factory);
    }

    /// Settings handed to the factory named `name` when it builds a reader.
    pub fn configure(&mut self, name: impl Into<String>, cfg: Value) {
        self.settings.insert(name.into(), cfg);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn HTTPDelegationReaderFactory>> {
        self.factories.get(name).cloned()
    }

    pub fn list(&self) -> Vec<Arc<dyn HTTPDelegationReaderFactory>> {
        self.factories.values().cloned().collect()
    }

    /// Reader for the first strategy of `space` that has a registered factory.
    #[instrument(name = "reader_registry.reader_for", skip_all, fields(space = %space.id))]
    pub fn reader_for(
        &self,
        space: Arc<SpaceConfig>,
    ) -> Result<Box<dyn DelegationReader>, DelegationError> {
        let factory = space
            .strategies
            .iter()
            .find_map(|s| self.factories.get(&s.name))
            .ok_or_else(|| {
                DelegationError::ConfigurationError(format!(
                    "no delegation reader registered for the strategies of space '{}'",
                    space.id
                ))
            })?;

        log::info!(
            "Using '{}' delegation reader for space '{}'",
            factory.name(),
            space.id
        );
        let cfg = self
            .settings
            .get(factory.name())
            .cloned()
            .unwrap_or(Value::Null);
        let http_reader = factory.from_config(space, &cfg)?;

        Ok(Box::new(DelegationReaderFromHTTP::new(
            Arc::from(http_reader),
            self.outbound.clone(),
        )))
    }
}
