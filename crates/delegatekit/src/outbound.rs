use async_trait::async_trait;
use http::{Request, Response};

use crate::error::DelegationError;

/// Executes a fully built request against the network.
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn call(&self, req: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, DelegationError>;
}

#[cfg(feature = "http-client")]
mod http_client {
    use async_trait::async_trait;
    use http::{Request, Response};
    use once_cell::sync::Lazy;
    use reqwest::Client;

    use super::Outbound;
    use crate::error::DelegationError;

    /// A single, global client, built once
    pub static CLIENT: Lazy<Client> = Lazy::new(Client::new);

    pub async fn call_outbound(
        req: Request<Vec<u8>>,
    ) -> Result<Response<Vec<u8>>, DelegationError> {
        call_with(&CLIENT, req).await
    }

    async fn call_with(
        client: &Client,
        req: Request<Vec<u8>>,
    ) -> Result<Response<Vec<u8>>, DelegationError> {
        let method = req
            .method()
            .as_str()
            .parse::<reqwest::Method>()
            .map_err(|e| DelegationError::InvalidRequest(e.to_string()))?;

        let mut rb = client.request(method, req.uri().to_string());

        for (name, value) in req.headers().iter() {
            rb = rb.header(name.as_str(), value.as_bytes());
        }

        log::trace!("{} {} ({} bytes)", req.method(), req.uri(), req.body().len());
        let resp = rb.body(req.into_body()).send().await?.error_for_status()?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.bytes().await?.to_vec();

        let mut builder = Response::builder().status(status.as_u16());
        for (name, value) in headers.iter() {
            builder = builder.header(name.as_str(), value.as_bytes());
        }
        Ok(builder.body(bytes)?)
    }

    /// [`Outbound`] backed by `reqwest`. Non-success statuses are rejected.
    #[derive(Clone, Default)]
    pub struct ReqwestOutbound {
        client: Option<Client>,
    }

    impl ReqwestOutbound {
        /// Uses `client` instead of the shared process-wide one.
        pub fn with_client(client: Client) -> Self {
            Self {
                client: Some(client),
            }
        }
    }

    #[async_trait]
    impl Outbound for ReqwestOutbound {
        async fn call(&self, req: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, DelegationError> {
            match &self.client {
                Some(client) => call_with(client, req).await,
                None => call_outbound(req).await,
            }
        }
    }
}

#[cfg(feature = "http-client")]
pub use http_client::{ReqwestOutbound, call_outbound};

/// The transport used when none is configured explicitly.
#[cfg(feature = "http-client")]
pub fn default_outbound() -> std::sync::Arc<dyn Outbound> {
    std::sync::Arc::new(ReqwestOutbound::default())
}
