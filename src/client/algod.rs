//! Node (algod) REST client

use serde_json::Value;

use super::canonical::{self, NodeStatus, SuggestedParams};
use super::RestClient;
use crate::config::EndpointConfig;
use crate::error::Result;

/// Direct node query and submission surface.
#[derive(Debug, Clone)]
pub struct AlgodClient {
    rest: RestClient,
}

impl AlgodClient {
    pub fn new(config: &EndpointConfig) -> Result<Self> {
        Ok(Self {
            rest: RestClient::new("node", &config.url, &config.token, config.timeout_secs)?,
        })
    }

    /// Raw account information, including opted-in application local state.
    pub async fn account_information(&self, address: &str) -> Result<Value> {
        self.rest.get_json(&format!("/v2/accounts/{address}")).await
    }

    /// Raw application information, including global state.
    pub async fn application_info(&self, app_id: u64) -> Result<Value> {
        self.rest.get_json(&format!("/v2/applications/{app_id}")).await
    }

    /// Fresh network parameters. Callers must not cache these across a
    /// suspension point; the validity window expires.
    pub async fn transaction_params(&self) -> Result<SuggestedParams> {
        let response = self.rest.get_json("/v2/transactions/params").await?;
        canonical::parse_suggested_params(&response)
    }

    /// Submit raw signed transaction bytes. The blob is opaque here.
    pub async fn submit_raw(&self, signed: Vec<u8>) -> Result<Value> {
        self.rest.post_raw("/v2/transactions", signed).await
    }

    /// Pending/confirmed view of a submitted transaction.
    pub async fn pending_info(&self, tx_id: &str) -> Result<Value> {
        self.rest
            .get_json(&format!("/v2/transactions/pending/{tx_id}"))
            .await
    }

    pub async fn status(&self) -> Result<NodeStatus> {
        let response = self.rest.get_json("/v2/status").await?;
        canonical::parse_node_status(&response)
    }

    /// Block until the node has moved past the given round (the node holds
    /// the request open for roughly one round).
    pub async fn wait_for_round_after(&self, round: u64) -> Result<NodeStatus> {
        let response = self
            .rest
            .get_json(&format!("/v2/status/wait-for-block-after/{round}"))
            .await?;
        canonical::parse_node_status(&response)
    }
}
