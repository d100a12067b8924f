use serde::{Deserialize, Serialize};

/// Name of the canonical field that counts the token holders a delegate represents.
///
/// Passing it as the `match_filter` of
/// [`DelegationReader::get_delegates`](crate::DelegationReader::get_delegates)
/// asks for delegates ordered by delegator count.
pub const TOKEN_HOLDERS_REPRESENTED_AMOUNT: &str = "tokenHoldersRepresentedAmount";

/// Name of the canonical field holding a delegate's share of all voting power.
pub const VOTES_PERCENTAGE: &str = "votesPercentage";

/// The platform-wide representation of a delegate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegateWithPercent {
    /// Delegate address, exactly as queried or listed.
    pub id: String,
    /// Delegated voting power as a decimal string.
    pub delegated_votes: String,
    pub token_holders_represented_amount: u64,
    pub delegators_percentage: f64,
    pub votes_percentage: f64,
}

impl DelegateWithPercent {
    /// Zero-valued delegate for `address`.
    pub fn empty(address: impl Into<String>) -> Self {
        Self {
            id: address.into(),
            delegated_votes: "0".to_string(),
            token_holders_represented_amount: 0,
            delegators_percentage: 0.0,
            votes_percentage: 0.0,
        }
    }
}

/// Renders a JSON number as a decimal string without exponent or trailing fractional zeros.
///
/// Plain integers and decimals keep every digit the backend sent; only exponent
/// forms go through `f64`.
pub fn decimal_string(n: &serde_json::Number) -> String {
    let text = n.to_string();
    if text.contains(['e', 'E']) {
        // f64's Display never uses exponents.
        return n.as_f64().map(|f| f.to_string()).unwrap_or(text);
    }
    match text.split_once('.') {
        Some((int, frac)) => match frac.trim_end_matches('0') {
            "" => int.to_string(),
            frac => format!("{int}.{frac}"),
        },
        None => text,
    }
}
