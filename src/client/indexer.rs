//! Indexer REST client
//!
//! The indexer is the preferred read path for account state but lags the
//! node by design; callers fall back to the node when it errors or returns
//! structurally incomplete data.

use serde_json::Value;

use super::RestClient;
use crate::config::EndpointConfig;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct IndexerClient {
    rest: RestClient,
}

impl IndexerClient {
    pub fn new(config: &EndpointConfig) -> Result<Self> {
        Ok(Self {
            rest: RestClient::new("indexer", &config.url, &config.token, config.timeout_secs)?,
        })
    }

    /// Account lookup; the response nests the account in an envelope with
    /// the indexer's current round.
    pub async fn lookup_account(&self, address: &str) -> Result<Value> {
        self.rest.get_json(&format!("/v2/accounts/{address}")).await
    }

    pub async fn health(&self) -> Result<()> {
        self.rest.get_json("/health").await.map(|_| ())
    }
}
