use std::sync::Arc;

use serde_json::Value;

use crate::{HTTPDelegationReader, SpaceConfig, error::DelegationError};

/// Builds sans-IO readers for spaces that use one delegation strategy.
pub trait HTTPDelegationReaderFactory: Send + Sync {
    /// Strategy name this factory serves, e.g. `"split-delegation"`.
    fn name(&self) -> &str;

    /// JSON schema of the reader settings accepted by [`Self::from_config`].
    fn config_schema(&self) -> Value;

    /// Reader for `space`, configured with `cfg` (`Value::Null` for defaults).
    ///
    /// Must not touch the network.
    fn from_config(
        &self,
        space: Arc<SpaceConfig>,
        cfg: &Value,
    ) -> Result<Box<dyn HTTPDelegationReader>, DelegationError>;
}
