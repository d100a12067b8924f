use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::{
    DelegateWithPercent, DelegationReader, HTTPDelegationReader, error::DelegationError,
    outbound::Outbound,
};

/// Drives an [`HTTPDelegationReader`] over an [`Outbound`] transport.
///
/// Every operation builds one request, sends it once and parses the answer. Nothing is
/// cached or retried.
pub struct DelegationReaderFromHTTP {
    inner: Arc<dyn HTTPDelegationReader>,
    outbound: Arc<dyn Outbound>,
}

impl DelegationReaderFromHTTP {
    pub fn new(inner: Arc<dyn HTTPDelegationReader>, outbound: Arc<dyn Outbound>) -> Self {
        Self { inner, outbound }
    }

    /// Uses the crate's default `reqwest` transport.
    #[cfg(feature = "http-client")]
    pub fn with_default_outbound(inner: Arc<dyn HTTPDelegationReader>) -> Self {
        Self::new(inner, crate::outbound::default_outbound())
    }
}

#[async_trait]
impl DelegationReader for DelegationReaderFromHTTP {
    #[instrument(name = "http_reader.get_delegates", skip_all, fields(first = first, skip = skip))]
    async fn get_delegates(
        &self,
        first: u32,
        skip: u32,
        match_filter: &str,
    ) -> Result<Vec<DelegateWithPercent>, DelegationError> {
        let req = self.inner.delegates_request(first, skip, match_filter)?;
        let resp = self.outbound.call(req).await?;
        self.inner.parse_delegates(resp)
    }

    #[instrument(name = "http_reader.get_delegate", skip_all, fields(address = %address))]
    async fn get_delegate(&self, address: &str) -> Result<DelegateWithPercent, DelegationError> {
        let req = self.inner.delegate_request(address)?;
        let resp = self.outbound.call(req).await?;
        self.inner.parse_delegate(address, resp)
    }

    #[instrument(name = "http_reader.get_balance", skip_all, fields(address = %address))]
    async fn get_balance(&self, address: &str) -> Result<String, DelegationError> {
        let req = self.inner.balance_request(address)?;
        let resp = self.outbound.call(req).await?;
        self.inner.parse_balance(resp)
    }

    #[instrument(name = "http_reader.get_delegating_to", skip_all, fields(address = %address))]
    async fn get_delegating_to(&self, address: &str) -> Result<Vec<String>, DelegationError> {
        let req = self.inner.delegating_to_request(address)?;
        let resp = self.outbound.call(req).await?;
        self.inner.parse_delegating_to(resp)
    }
}
