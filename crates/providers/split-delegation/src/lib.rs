//! Delegation reader backed by the split-delegation computation service.
//!
//! The service computes partial delegations for a space from the space's own strategy
//! configuration, so every request carries the token supply, the strategy list and the
//! network taken from the space's `split-delegation` strategy.

use std::sync::Arc;

use delegatekit::{
    DelegateWithPercent, HTTPDelegationReader, SpaceConfig,
    error::DelegationError,
    get_env_var, handle_http_error,
    model::{TOKEN_HOLDERS_REPRESENTED_AMOUNT, decimal_string},
    parse_json,
    plugin::HTTPDelegationReaderFactory,
};
use http::{Method, Request, Response, header::CONTENT_TYPE};
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use url::Url;

/// Strategy name a space must configure to be served by this reader.
pub const STRATEGY_NAME: &str = "split-delegation";

/// Total supply sent with single-delegate profile requests, regardless of the
/// space's configured supply.
pub const DELEGATE_PROFILE_TOTAL_SUPPLY: u64 = 10_000_000;

const DEFAULT_BASE_URL: &str = "https://delegate-api.gnosisguild.org";

/// Environment variable overriding the default backend URL.
pub const BASE_URL_ENV: &str = "SPLIT_DELEGATION_API_URL";

/// Reader settings.
#[derive(Debug, Clone, Deserialize, JsonSchema, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct SplitDelegationConfig {
    /// Base URL of the split-delegation backend.
    #[schemars(with = "String")]
    #[serde(default = "SplitDelegationConfig::default_base_url")]
    pub base_url: Url,
}

impl SplitDelegationConfig {
    fn default_base_url() -> Url {
        if let Some(base_url) = get_env_var!(BASE_URL_ENV) {
            match Url::parse(&base_url) {
                Ok(url) => return url,
                Err(e) => log::warn!("Ignoring {}='{}': {}", BASE_URL_ENV, base_url, e),
            }
        }
        Url::parse(DEFAULT_BASE_URL).expect("default split-delegation URL is valid")
    }
}

impl Default for SplitDelegationConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
        }
    }
}

/// Parameters of the `split-delegation` strategy inside a space configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitDelegationParams {
    #[serde(default)]
    pub total_supply: Option<Number>,
    #[serde(default)]
    pub strategies: Option<Vec<Value>>,
}

/// Body of every request sent to the backend.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SplitDelegationRequest<'a, S: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    total_supply: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    strategies: Option<&'a S>,
    network: &'a str,
}

/// One row of the backend's top-delegates listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitDelegate {
    pub address: String,
    pub voting_power: Number,
    pub percent_of_voting_power: f64,
    pub delegator_count: u64,
    pub percent_of_delegators: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopDelegatesResponse {
    top_delegates: Vec<SplitDelegate>,
}

/// The backend's profile of a single delegate.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitDelegateDetails {
    pub voting_power: Number,
    pub percent_of_voting_power: f64,
    pub delegator_count: u64,
    pub percent_of_delegators: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SplitDelegateBalance {
    voting_power: Number,
}

/// Delegations recorded for one address. Amounts are kept as the backend encodes them.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitDelegationSet {
    pub delegators: Vec<SplitDelegator>,
    #[serde(default)]
    pub vote_weight_delegated: Value,
    #[serde(default)]
    pub number_of_delegators: Option<u64>,
    #[serde(default)]
    pub delegates_own_vote_weight: Value,
    #[serde(default)]
    pub total_vote_weight: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SplitDelegator {
    pub from_address: String,
    #[serde(default)]
    pub delegated_amount: Value,
    #[serde(default)]
    pub to_address_own_amount: Value,
}

impl From<SplitDelegate> for DelegateWithPercent {
    fn from(d: SplitDelegate) -> Self {
        DelegateWithPercent {
            delegated_votes: decimal_string(&d.voting_power),
            id: d.address,
            token_holders_represented_amount: d.delegator_count,
            delegators_percentage: d.percent_of_delegators,
            votes_percentage: d.percent_of_voting_power,
        }
    }
}

/// Backend ordering for a canonical sort field.
///
/// Only the token-holder count maps to `count`; every other field, known or not,
/// orders by voting power.
pub fn order_by(match_filter: &str) -> &'static str {
    if match_filter == TOKEN_HOLDERS_REPRESENTED_AMOUNT {
        "count"
    } else {
        "power"
    }
}

/// Split-delegation reader for one space.
#[derive(Debug, Clone)]
pub struct SplitDelegation {
    space: Arc<SpaceConfig>,
    config: SplitDelegationConfig,
}

impl SplitDelegation {
    pub fn new(space: Arc<SpaceConfig>, config: SplitDelegationConfig) -> Self {
        Self { space, config }
    }

    fn params(&self) -> Result<SplitDelegationParams, DelegationError> {
        let strategy = self.space.unique_strategy(STRATEGY_NAME)?;
        SplitDelegationParams::deserialize(&strategy.params).map_err(|e| {
            DelegationError::ConfigurationError(format!(
                "invalid {} params for space '{}': {}",
                STRATEGY_NAME, self.space.id, e
            ))
        })
    }

    fn endpoint(&self, tail: &[&str]) -> Result<Url, DelegationError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                DelegationError::InvalidRequest(format!(
                    "base URL '{}' cannot carry a path",
                    self.config.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["api", "v1", self.space.id.as_str(), "pin"])
            .extend(tail);
        Ok(url)
    }

    fn post<S: Serialize>(
        &self,
        url: Url,
        body: &SplitDelegationRequest<'_, S>,
    ) -> Result<Request<Vec<u8>>, DelegationError> {
        let body = serde_json::to_vec(body)
            .map_err(|e| DelegationError::InvalidRequest(format!("{:#}", e)))?;
        Ok(Request::builder()
            .method(Method::POST)
            .uri(url.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body(body)?)
    }

    /// Profile request carrying the space's configured supply and strategy params.
    fn configured_delegate_request(
        &self,
        address: &str,
    ) -> Result<Request<Vec<u8>>, DelegationError> {
        let params = self.params()?;
        let url = self.endpoint(&["delegate", address])?;
        self.post(
            url,
            &SplitDelegationRequest {
                total_supply: params.total_supply,
                strategies: params.strategies.as_ref(),
                network: &self.space.network,
            },
        )
    }
}

impl HTTPDelegationReader for SplitDelegation {
    fn delegates_request(
        &self,
        first: u32,
        skip: u32,
        match_filter: &str,
    ) -> Result<Request<Vec<u8>>, DelegationError> {
        let params = self.params()?;
        let order = order_by(match_filter);

        let mut url = self.endpoint(&["top-delegates"])?;
        url.query_pairs_mut()
            .append_pair("by", order)
            .append_pair("limit", &first.to_string())
            .append_pair("offset", &skip.to_string());
        log::debug!(
            "Top delegates of '{}' by {} (limit {}, offset {})",
            self.space.id,
            order,
            first,
            skip
        );

        self.post(
            url,
            &SplitDelegationRequest {
                total_supply: params.total_supply,
                strategies: params.strategies.as_ref(),
                network: &self.space.network,
            },
        )
    }

    fn parse_delegates(
        &self,
        resp: Response<Vec<u8>>,
    ) -> Result<Vec<DelegateWithPercent>, DelegationError> {
        handle_http_error!(resp);

        let json_resp: TopDelegatesResponse = parse_json(&resp)?;
        Ok(json_resp
            .top_delegates
            .into_iter()
            .map(DelegateWithPercent::from)
            .collect())
    }

    fn delegate_request(&self, address: &str) -> Result<Request<Vec<u8>>, DelegationError> {
        // Only the presence of the strategy matters here; the body sends the whole
        // strategy list of the space with a fixed supply.
        self.space.unique_strategy(STRATEGY_NAME)?;
        let url = self.endpoint(&["delegate", address])?;
        log::debug!("Delegate profile of {} in '{}'", address, self.space.id);

        self.post(
            url,
            &SplitDelegationRequest {
                total_supply: Some(Number::from(DELEGATE_PROFILE_TOTAL_SUPPLY)),
                strategies: Some(&self.space.strategies),
                network: &self.space.network,
            },
        )
    }

    fn parse_delegate(
        &self,
        address: &str,
        resp: Response<Vec<u8>>,
    ) -> Result<DelegateWithPercent, DelegationError> {
        handle_http_error!(resp);

        let details: SplitDelegateDetails = parse_json(&resp)?;
        if details.delegator_count > 0 {
            return Ok(DelegateWithPercent::empty(address));
        }

        Ok(DelegateWithPercent {
            id: address.to_string(),
            delegated_votes: decimal_string(&details.voting_power),
            token_holders_represented_amount: details.delegator_count,
            delegators_percentage: details.percent_of_delegators,
            votes_percentage: details.percent_of_voting_power,
        })
    }

    fn balance_request(&self, address: &str) -> Result<Request<Vec<u8>>, DelegationError> {
        log::debug!("Balance of {} in '{}'", address, self.space.id);
        self.configured_delegate_request(address)
    }

    fn parse_balance(&self, resp: Response<Vec<u8>>) -> Result<String, DelegationError> {
        handle_http_error!(resp);

        let balance: SplitDelegateBalance = parse_json(&resp)?;
        Ok(decimal_string(&balance.voting_power))
    }

    fn delegating_to_request(&self, address: &str) -> Result<Request<Vec<u8>>, DelegationError> {
        log::debug!("Delegations of {} in '{}'", address, self.space.id);
        self.configured_delegate_request(address)
    }

    fn parse_delegating_to(&self, resp: Response<Vec<u8>>) -> Result<Vec<String>, DelegationError> {
        handle_http_error!(resp);

        let set: SplitDelegationSet = parse_json(&resp)?;
        Ok(set.delegators.into_iter().map(|d| d.from_address).collect())
    }
}

pub struct SplitDelegationFactory;

impl HTTPDelegationReaderFactory for SplitDelegationFactory {
    fn name(&self) -> &str {
        STRATEGY_NAME
    }

    fn config_schema(&self) -> Value {
        let schema = schema_for!(SplitDelegationConfig);
        serde_json::to_value(&schema)
            .expect("SplitDelegationConfig JSON Schema should always serialize")
    }

    fn from_config(
        &self,
        space: Arc<SpaceConfig>,
        cfg: &Value,
    ) -> Result<Box<dyn HTTPDelegationReader>, DelegationError> {
        let config = if cfg.is_null() {
            SplitDelegationConfig::default()
        } else {
            SplitDelegationConfig::deserialize(cfg).map_err(|e| {
                DelegationError::ConfigurationError(format!(
                    "invalid {} reader settings: {}",
                    STRATEGY_NAME, e
                ))
            })?
        };
        Ok(Box::new(SplitDelegation::new(space, config)))
    }
}

/// Async reader for `space` over the default HTTP transport.
#[cfg(feature = "http-client")]
pub fn create_reader(
    space: Arc<SpaceConfig>,
    config: SplitDelegationConfig,
) -> Box<dyn delegatekit::DelegationReader> {
    Box::new(
        delegatekit::adapters::DelegationReaderFromHTTP::with_default_outbound(Arc::new(
            SplitDelegation::new(space, config),
        )),
    )
}
