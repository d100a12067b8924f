//! delegatekit is a uniform interface for reading vote delegation data of governance spaces.
//!
//! # Overview
//! Spaces compute delegation through different strategies (on-chain registries, delegation
//! contracts, off-chain computation services). This crate defines the contract every
//! strategy implements, so callers can ask the same four questions of any space:
//!
//! - the top delegates of the space
//! - the profile of a single delegate
//! - the effective voting balance of an address
//! - the addresses an address is linked to by delegation
//!
//! # Architecture
//! Backends implement [`HTTPDelegationReader`], which only builds requests and parses
//! responses. [`adapters::DelegationReaderFromHTTP`] pairs such a reader with an
//! [`outbound::Outbound`] transport and exposes the async [`DelegationReader`] contract.
//! [`plugin::ReaderRegistry`] picks the right backend for a space by strategy name.

use async_trait::async_trait;
use http::{Request, Response};

pub mod adapters;

/// Configuration files listing spaces and per-reader settings
pub mod config;

/// Error types and handling
pub mod error;

/// Canonical delegate model shared by every reader
pub mod model;

pub mod outbound;

/// Reader factories and the registry selecting them by strategy name
pub mod plugin;

/// Space and strategy configuration
pub mod space;

pub use error::DelegationError;
pub use model::DelegateWithPercent;
pub use space::{SpaceConfig, StrategyConfig};

/// The read contract every delegation strategy provides for one space.
#[async_trait]
pub trait DelegationReader: Send + Sync {
    /// One page of the space's top delegates.
    ///
    /// `match_filter` names the canonical field the caller sorts by; backends map it
    /// to whatever ordering they support.
    async fn get_delegates(
        &self,
        first: u32,
        skip: u32,
        match_filter: &str,
    ) -> Result<Vec<DelegateWithPercent>, DelegationError>;

    async fn get_delegate(&self, address: &str) -> Result<DelegateWithPercent, DelegationError>;

    /// Effective voting balance of `address`, as a decimal string.
    async fn get_balance(&self, address: &str) -> Result<String, DelegationError>;

    async fn get_delegating_to(&self, address: &str) -> Result<Vec<String>, DelegationError>;
}

/// Sans-IO half of a delegation backend: one request builder and one parser per
/// operation of [`DelegationReader`].
pub trait HTTPDelegationReader: Send + Sync {
    fn delegates_request(
        &self,
        first: u32,
        skip: u32,
        match_filter: &str,
    ) -> Result<Request<Vec<u8>>, DelegationError>;
    fn parse_delegates(
        &self,
        resp: Response<Vec<u8>>,
    ) -> Result<Vec<DelegateWithPercent>, DelegationError>;

    fn delegate_request(&self, address: &str) -> Result<Request<Vec<u8>>, DelegationError>;
    fn parse_delegate(
        &self,
        address: &str,
        resp: Response<Vec<u8>>,
    ) -> Result<DelegateWithPercent, DelegationError>;

    fn balance_request(&self, address: &str) -> Result<Request<Vec<u8>>, DelegationError>;
    fn parse_balance(&self, resp: Response<Vec<u8>>) -> Result<String, DelegationError>;

    fn delegating_to_request(&self, address: &str) -> Result<Request<Vec<u8>>, DelegationError>;
    fn parse_delegating_to(&self, resp: Response<Vec<u8>>) -> Result<Vec<String>, DelegationError>;
}

/// Decodes a JSON response body, reporting malformed payloads as upstream errors.
pub fn parse_json<T: serde::de::DeserializeOwned>(
    resp: &Response<Vec<u8>>,
) -> Result<T, DelegationError> {
    serde_json::from_slice(resp.body())
        .map_err(|e| DelegationError::upstream("unexpected delegation backend payload", e))
}

/// Returns early with an upstream error when the response status is not a success.
#[macro_export]
macro_rules! handle_http_error {
    ($resp:expr) => {{
        let status = $resp.status();
        if !status.is_success() {
            return Err($crate::error::DelegationError::upstream_status(
                status,
                $resp.body(),
            ));
        }
    }};
}

/// Reads a configuration value from the process environment.
#[macro_export]
macro_rules! get_env_var {
    ($key:expr) => {{ std::env::var($key).ok().filter(|v| !v.is_empty()) }};
}
