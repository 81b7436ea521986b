//! Role resolution against mocked node and indexer endpoints
//!
//! Covers path-agnostic correctness: whichever transport answers, the same
//! stored state must yield the same role.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;

use credledger::address::encode_address;
use credledger::config::{
    AppConfig, Config, ConfirmationSettings, EndpointConfig, RetrySettings,
};
use credledger::types::{Role, RoleSource, RoleState};
use credledger::{LedgerClient, RoleResolver, StateReader};

const APP_ID: u64 = 1234;

fn test_address() -> String {
    encode_address(&[7u8; 32]).unwrap()
}

fn test_config(node_url: &str, indexer_url: &str) -> Config {
    Config {
        node: EndpointConfig {
            url: node_url.to_string(),
            token: String::new(),
            timeout_secs: 5,
        },
        indexer: EndpointConfig {
            url: indexer_url.to_string(),
            token: String::new(),
            timeout_secs: 5,
        },
        app: AppConfig {
            app_id: APP_ID,
            super_admin_address: None,
        },
        // Keep tests fast: short delays, two attempts
        retry: RetrySettings {
            max_attempts: 2,
            base_delay_ms: 1,
            max_delay_ms: 5,
            jitter_factor: 0.0,
        },
        confirmation: ConfirmationSettings {
            max_rounds: 5,
            round_wait_ms: 1,
            role_propagation_delay_ms: 1,
        },
    }
}

fn local_state_body(address: &str, role: u64) -> serde_json::Value {
    json!({
        "account": {
            "address": address,
            "amount": 1_000_000,
            "apps-local-state": [{
                "id": APP_ID,
                "key-value": [{
                    "key": BASE64.encode("Role"),
                    "value": {"type": 2, "uint": role}
                }]
            }]
        },
        "current-round": 500
    })
}

#[tokio::test]
async fn indexer_answers_role_directly() {
    let mut indexer = mockito::Server::new_async().await;
    let address = test_address();

    indexer
        .mock("GET", format!("/v2/accounts/{address}").as_str())
        .with_status(200)
        .with_body(local_state_body(&address, 1).to_string())
        .create_async()
        .await;

    let client =
        LedgerClient::init(&test_config("http://127.0.0.1:1", &indexer.url())).unwrap();
    let reader = StateReader::new(&client);

    let state = reader.get_role(&address).await.unwrap();
    assert_eq!(state, RoleState::OptedIn(Role::University));
    assert!(reader.is_opted_in(&address).await);
}

#[tokio::test]
async fn indexer_failure_falls_back_to_node_with_same_answer() {
    let mut node = mockito::Server::new_async().await;
    let mut indexer = mockito::Server::new_async().await;
    let address = test_address();

    indexer
        .mock("GET", format!("/v2/accounts/{address}").as_str())
        .with_status(500)
        .with_body(json!({"message": "indexer wedged"}).to_string())
        .create_async()
        .await;

    // The node serves the bare account object with camelCase fields
    node.mock("GET", format!("/v2/accounts/{address}").as_str())
        .with_status(200)
        .with_body(
            json!({
                "address": address,
                "amount": 1_000_000,
                "appsLocalState": [{
                    "id": APP_ID,
                    "keyValue": [{
                        "key": BASE64.encode("Role"),
                        "value": {"type": 2, "uint": 1}
                    }]
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = LedgerClient::init(&test_config(&node.url(), &indexer.url())).unwrap();
    let reader = StateReader::new(&client);

    let state = reader.get_role(&address).await.unwrap();
    assert_eq!(state, RoleState::OptedIn(Role::University));
}

#[tokio::test]
async fn structurally_incomplete_indexer_answer_falls_back() {
    let mut node = mockito::Server::new_async().await;
    let mut indexer = mockito::Server::new_async().await;
    let address = test_address();

    // 200 OK but no local-state container at all
    indexer
        .mock("GET", format!("/v2/accounts/{address}").as_str())
        .with_status(200)
        .with_body(json!({"account": {"address": address, "amount": 0}}).to_string())
        .create_async()
        .await;

    node.mock("GET", format!("/v2/accounts/{address}").as_str())
        .with_status(200)
        .with_body(
            json!({
                "address": address,
                "amount": 0,
                "apps-local-state": [{
                    "id": APP_ID,
                    "key-value": [{
                        "key": BASE64.encode("Role"),
                        "value": {"type": 2, "uint": 0}
                    }]
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = LedgerClient::init(&test_config(&node.url(), &indexer.url())).unwrap();
    let reader = StateReader::new(&client);

    assert_eq!(
        reader.get_role(&address).await.unwrap(),
        RoleState::OptedIn(Role::Student)
    );
}

#[tokio::test]
async fn never_opted_in_reads_as_sentinel_on_both_paths() {
    let mut node = mockito::Server::new_async().await;
    let mut indexer = mockito::Server::new_async().await;
    let address = test_address();

    // Opted into a different application only
    let body = json!({
        "account": {
            "address": address,
            "amount": 0,
            "apps-local-state": [{"id": 9999, "key-value": []}]
        }
    });
    indexer
        .mock("GET", format!("/v2/accounts/{address}").as_str())
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;
    node.mock("GET", format!("/v2/accounts/{address}").as_str())
        .with_status(200)
        .with_body(body["account"].to_string())
        .create_async()
        .await;

    let client = LedgerClient::init(&test_config(&node.url(), &indexer.url())).unwrap();
    let reader = StateReader::new(&client);

    assert_eq!(reader.get_role(&address).await.unwrap(), RoleState::NotOptedIn);
    assert!(!reader.is_opted_in(&address).await);
}

#[tokio::test]
async fn resolver_degrades_to_advisory_student_when_everything_is_down() {
    // Nothing listens on these ports; both paths fail with connectivity
    // errors, retries exhaust, and the resolver still answers.
    let client =
        LedgerClient::init(&test_config("http://127.0.0.1:1", "http://127.0.0.1:1")).unwrap();
    let resolver = RoleResolver::new(&client);

    let resolved = resolver.resolve_role(&test_address()).await;
    assert_eq!(resolved.role, Role::Student);
    assert_eq!(resolved.source, RoleSource::Fallback);
    assert!(!resolved.is_authoritative());
}

#[tokio::test]
async fn resolver_marks_not_opted_in_as_fallback_default() {
    let mut node = mockito::Server::new_async().await;
    let mut indexer = mockito::Server::new_async().await;
    let address = test_address();

    let body = json!({"account": {"address": address, "amount": 0, "apps-local-state": []}});
    indexer
        .mock("GET", format!("/v2/accounts/{address}").as_str())
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;
    node.mock("GET", format!("/v2/accounts/{address}").as_str())
        .with_status(200)
        .with_body(body["account"].to_string())
        .create_async()
        .await;

    let client = LedgerClient::init(&test_config(&node.url(), &indexer.url())).unwrap();
    let resolver = RoleResolver::new(&client);

    // The strict variant surfaces the sentinel...
    assert_eq!(
        resolver.resolve_role_strict(&address).await.unwrap(),
        RoleState::NotOptedIn
    );
    // ...while the advisory variant defaults it, flagged as such
    let resolved = resolver.resolve_role(&address).await;
    assert_eq!(resolved.role, Role::Student);
    assert!(!resolved.is_authoritative());
}

#[tokio::test]
async fn super_admin_address_reads_creator_from_global_state() {
    let mut node = mockito::Server::new_async().await;
    let indexer = mockito::Server::new_async().await;

    let creator_key = [3u8; 32];
    node.mock("GET", format!("/v2/applications/{APP_ID}").as_str())
        .with_status(200)
        .with_body(
            json!({
                "id": APP_ID,
                "params": {
                    "global-state": [{
                        "key": BASE64.encode("Creator"),
                        "value": {"type": 1, "bytes": BASE64.encode(creator_key)}
                    }]
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = LedgerClient::init(&test_config(&node.url(), &indexer.url())).unwrap();
    let reader = StateReader::new(&client);

    assert_eq!(
        reader.get_super_admin_address().await,
        Some(encode_address(&creator_key).unwrap())
    );
}
