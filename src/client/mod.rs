//! Ledger client
//!
//! An explicitly constructed client object wrapping the node and indexer
//! REST surfaces. Lifecycle is `LedgerClient::init(config)`; the client is
//! passed by reference to whichever component needs it — there is no
//! process-wide singleton. Endpoints, token, and application id are
//! read-only after initialization.

use std::time::Duration;

use serde_json::Value;

use crate::config::{Config, ConfirmationSettings, RetrySettings};
use crate::error::{LedgerError, Result};

pub mod algod;
pub mod canonical;
pub mod indexer;

pub use algod::AlgodClient;
pub use indexer::IndexerClient;

const TOKEN_HEADER: &str = "X-Algo-API-Token";

/// Thin REST transport shared by the node and indexer clients.
#[derive(Debug, Clone)]
pub(crate) struct RestClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    /// Endpoint label used in error context and logs
    name: String,
}

impl RestClient {
    pub(crate) fn new(
        name: &str,
        base_url: &str,
        token: &str,
        timeout_secs: u64,
    ) -> Result<Self> {
        if base_url.is_empty() {
            return Err(LedgerError::Configuration(format!(
                "{name} endpoint URL is not configured"
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LedgerError::Unknown(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            name: name.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check_response(&self, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            return Err(LedgerError::classify_message(
                &format!("HTTP {status}: {message}"),
                &self.name,
            ));
        }
        response
            .json()
            .await
            .map_err(|e| LedgerError::Unknown(format!("malformed {} response: {e}", self.name)))
    }

    pub(crate) async fn get_json(&self, path: &str) -> Result<Value> {
        let request = self
            .http
            .get(self.url(path))
            .header(TOKEN_HEADER, &self.token);
        let response = request
            .send()
            .await
            .map_err(|e| LedgerError::from_reqwest(e, &self.name))?;
        self.check_response(response).await
    }

    pub(crate) async fn post_raw(&self, path: &str, body: Vec<u8>) -> Result<Value> {
        let request = self
            .http
            .post(self.url(path))
            .header(TOKEN_HEADER, &self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/x-binary")
            .body(body);
        let response = request
            .send()
            .await
            .map_err(|e| LedgerError::from_reqwest(e, &self.name))?;
        self.check_response(response).await
    }
}

/// Handle to both read paths plus the shared process-wide settings.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    algod: AlgodClient,
    indexer: IndexerClient,
    app_id: u64,
    super_admin_address: Option<String>,
    retry: RetrySettings,
    confirmation: ConfirmationSettings,
}

impl LedgerClient {
    /// Construct a client from configuration. Fails fast on missing
    /// endpoints; an unconfigured app id is allowed here so that read-only
    /// commands work before deployment (the transaction builder rejects the
    /// sentinel itself).
    pub fn init(config: &Config) -> Result<Self> {
        let algod = AlgodClient::new(&config.node)?;
        let indexer = IndexerClient::new(&config.indexer)?;

        Ok(Self {
            algod,
            indexer,
            app_id: config.app.app_id,
            super_admin_address: config.app.super_admin_address.clone(),
            retry: config.retry.clone(),
            confirmation: config.confirmation.clone(),
        })
    }

    pub fn algod(&self) -> &AlgodClient {
        &self.algod
    }

    pub fn indexer(&self) -> &IndexerClient {
        &self.indexer
    }

    pub fn app_id(&self) -> u64 {
        self.app_id
    }

    pub fn super_admin_address(&self) -> Option<&str> {
        self.super_admin_address.as_deref()
    }

    pub fn retry_settings(&self) -> &RetrySettings {
        &self.retry
    }

    pub fn confirmation_settings(&self) -> &ConfirmationSettings {
        &self.confirmation
    }

    /// True if the node answers its status endpoint. Never errors.
    pub async fn check_node(&self) -> bool {
        match self.algod.status().await {
            Ok(status) => {
                tracing::debug!(last_round = status.last_round, "Node reachable");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Node health check failed");
                false
            }
        }
    }

    /// True if the indexer answers its health endpoint. Never errors.
    pub async fn check_indexer(&self) -> bool {
        match self.indexer.health().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Indexer health check failed");
                false
            }
        }
    }
}
