use std::error::Error;
use std::sync::Arc;

use delegatekit::{
    DelegateWithPercent, DelegationReader, SpaceConfig, adapters::DelegationReaderFromHTTP,
    config::DelegationConfig, error::DelegationError, outbound::ReqwestOutbound,
    plugin::ReaderRegistry,
};
use dk_split_delegation::{
    SplitDelegation, SplitDelegationConfig, SplitDelegationFactory, create_reader,
};
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{any, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROFILE_PATH: &str = "/api/v1/gnosis.eth/pin/delegate/0xabc";

fn space() -> Arc<SpaceConfig> {
    Arc::new(SpaceConfig::new("gnosis.eth", "1").with_strategy(
        "split-delegation",
        json!({
            "totalSupply": 5000000,
            "strategies": [{ "name": "erc20-balance-of", "params": { "decimals": 18 } }]
        }),
    ))
}

fn configured_body() -> Value {
    json!({
        "totalSupply": 5000000,
        "strategies": [{ "name": "erc20-balance-of", "params": { "decimals": 18 } }],
        "network": "1"
    })
}

fn reader(server: &MockServer, space: Arc<SpaceConfig>) -> Box<dyn DelegationReader> {
    create_reader(
        space,
        SplitDelegationConfig {
            base_url: Url::parse(&server.uri()).unwrap(),
        },
    )
}

#[tokio::test]
async fn top_delegates_by_power() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/gnosis.eth/pin/top-delegates"))
        .and(query_param("by", "power"))
        .and(query_param("limit", "2"))
        .and(query_param("offset", "0"))
        .and(body_json(configured_body()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "topDelegates": [
                {
                    "address": "0xaaa",
                    "votingPower": 100,
                    "percentOfVotingPower": 0.5,
                    "delegatorCount": 4,
                    "percentOfDelegators": 0.4
                },
                {
                    "address": "0xbbb",
                    "votingPower": 50,
                    "percentOfVotingPower": 0.25,
                    "delegatorCount": 6,
                    "percentOfDelegators": 0.6
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let delegates = reader(&server, space())
        .get_delegates(2, 0, "votesPercentage")
        .await
        .unwrap();

    let ids: Vec<_> = delegates.iter().map(|d| d.id.as_str()).collect();
    let votes: Vec<_> = delegates.iter().map(|d| d.delegated_votes.as_str()).collect();
    assert_eq!(ids, ["0xaaa", "0xbbb"]);
    assert_eq!(votes, ["100", "50"]);
    assert_eq!(delegates[1].token_holders_represented_amount, 6);
    assert_eq!(delegates[1].delegators_percentage, 0.6);
    assert_eq!(delegates[1].votes_percentage, 0.25);
}

#[tokio::test]
async fn top_delegates_by_token_holders_uses_count_ordering() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/gnosis.eth/pin/top-delegates"))
        .and(query_param("by", "count"))
        .and(query_param("limit", "10"))
        .and(query_param("offset", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "topDelegates": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let delegates = reader(&server, space())
        .get_delegates(10, 30, "tokenHoldersRepresentedAmount")
        .await
        .unwrap();
    assert!(delegates.is_empty());
}

#[tokio::test]
async fn delegate_with_delegators_is_the_zero_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PROFILE_PATH))
        .and(body_json(json!({
            "totalSupply": 10000000,
            "strategies": [{
                "name": "split-delegation",
                "params": {
                    "totalSupply": 5000000,
                    "strategies": [{ "name": "erc20-balance-of", "params": { "decimals": 18 } }]
                }
            }],
            "network": "1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "votingPower": 300,
            "delegatorCount": 2,
            "percentOfVotingPower": 0.3,
            "percentOfDelegators": 0.1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let delegate = reader(&server, space()).get_delegate("0xabc").await.unwrap();
    assert_eq!(
        serde_json::to_value(&delegate).unwrap(),
        json!({
            "id": "0xabc",
            "delegatedVotes": "0",
            "tokenHoldersRepresentedAmount": 0,
            "delegatorsPercentage": 0.0,
            "votesPercentage": 0.0
        })
    );
}

#[tokio::test]
async fn delegate_without_delegators_keeps_backend_figures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PROFILE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "votingPower": 75,
            "delegatorCount": 0,
            "percentOfVotingPower": 0.075,
            "percentOfDelegators": 0.0
        })))
        .mount(&server)
        .await;

    let delegate = reader(&server, space()).get_delegate("0xabc").await.unwrap();
    assert_eq!(
        delegate,
        DelegateWithPercent {
            id: "0xabc".into(),
            delegated_votes: "75".into(),
            token_holders_represented_amount: 0,
            delegators_percentage: 0.0,
            votes_percentage: 0.075,
        }
    );
}

#[tokio::test]
async fn balance_is_the_backend_voting_power() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PROFILE_PATH))
        .and(body_json(configured_body()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "votingPower": 4200.5,
            "delegatorCount": 1,
            "percentOfVotingPower": 0.1,
            "percentOfDelegators": 0.1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let balance = reader(&server, space()).get_balance("0xabc").await.unwrap();
    assert_eq!(balance, "4200.5");
}

#[tokio::test]
async fn delegating_to_lists_delegator_addresses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PROFILE_PATH))
        .and(body_json(configured_body()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "delegators": [
                { "from_address": "0x111", "delegated_amount": "10", "to_address_own_amount": "0" },
                { "from_address": "0x222", "delegated_amount": "5", "to_address_own_amount": "0" }
            ],
            "voteWeightDelegated": "15",
            "numberOfDelegators": 2,
            "delegatesOwnVoteWeight": "0",
            "totalVoteWeight": "15"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let addresses = reader(&server, space()).get_delegating_to("0xabc").await.unwrap();
    assert_eq!(addresses, ["0x111", "0x222"]);
}

#[tokio::test]
async fn missing_strategy_fails_every_operation_without_requests() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let space = Arc::new(
        SpaceConfig::new("gnosis.eth", "1").with_strategy("erc20-balance-of", json!({})),
    );
    let reader = reader(&server, space);

    let errors = [
        reader.get_delegates(10, 0, "votesPercentage").await.unwrap_err(),
        reader.get_delegate("0xabc").await.unwrap_err(),
        reader.get_balance("0xabc").await.unwrap_err(),
        reader.get_delegating_to("0xabc").await.unwrap_err(),
    ];
    for err in errors {
        assert!(err.is_configuration(), "unexpected error: {err}");
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn server_errors_are_upstream_errors_with_cause() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = reader(&server, space()).get_balance("0xabc").await.unwrap_err();
    assert!(err.is_upstream());
    assert!(err.to_string().contains("503"), "unexpected message: {err}");
    assert!(err.source().is_some());
}

#[tokio::test]
async fn non_json_body_is_an_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = reader(&server, space())
        .get_delegates(5, 0, "votesPercentage")
        .await
        .unwrap_err();
    match &err {
        DelegationError::UpstreamError { source, .. } => {
            let cause = source.as_ref().expect("parse error should be attached");
            assert!(cause.downcast_ref::<serde_json::Error>().is_some());
        }
        other => panic!("expected UpstreamError, got {other}"),
    }
}

#[tokio::test]
async fn unreachable_backend_is_an_upstream_error() {
    let reader = create_reader(
        space(),
        SplitDelegationConfig {
            base_url: Url::parse("http://127.0.0.1:9/").unwrap(),
        },
    );
    let err = reader.get_delegating_to("0xabc").await.unwrap_err();
    assert!(err.is_upstream());
    assert!(err.source().is_some());
}

#[tokio::test]
async fn registry_resolves_split_delegation_spaces() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PROFILE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "votingPower": 12,
            "delegatorCount": 0,
            "percentOfVotingPower": 0.0,
            "percentOfDelegators": 0.0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = DelegationConfig {
        spaces: vec![(*space()).clone()],
        readers: [(
            "split-delegation".to_string(),
            json!({ "base_url": server.uri() }),
        )]
        .into_iter()
        .collect(),
    };
    let mut registry = ReaderRegistry::from_config(&config);
    registry.register(Arc::new(SplitDelegationFactory));

    let space = Arc::new(config.space("gnosis.eth").unwrap().clone());
    let reader = registry.reader_for(space).unwrap();
    assert_eq!(reader.get_balance("0xabc").await.unwrap(), "12");
}

#[tokio::test]
async fn caller_supplied_client_reads_large_balances() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PROFILE_PATH))
        .and(body_json(configured_body()))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"votingPower": 123456789012345678901234, "delegatorCount": 2,
                "percentOfVotingPower": 0.5, "percentOfDelegators": 0.1}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let inner = SplitDelegation::new(
        space(),
        SplitDelegationConfig {
            base_url: Url::parse(&server.uri()).unwrap(),
        },
    );
    let reader = DelegationReaderFromHTTP::new(
        Arc::new(inner),
        Arc::new(ReqwestOutbound::with_client(reqwest::Client::new())),
    );

    let balance = reader.get_balance("0xabc").await.unwrap();
    assert_eq!(balance, "123456789012345678901234");
}
