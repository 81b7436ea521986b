//! Unsigned transaction construction
//!
//! Every build operation fetches fresh network parameters immediately
//! before constructing the transaction: parameters carry a validity window
//! and must never be cached across a suspension point waiting on a user
//! signature.

use tracing::debug;

use crate::address;
use crate::client::canonical::SuggestedParams;
use crate::client::LedgerClient;
use crate::config::APP_ID_UNCONFIGURED;
use crate::error::{LedgerError, Result};

/// Application-call completion kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OnComplete {
    /// Plain application call
    NoOp,
    /// Initialize the sender's local state slot for the application
    OptIn,
}

/// A constructed, not-yet-signed application call.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UnsignedTransaction {
    pub sender: String,
    pub app_id: u64,
    pub on_complete: OnComplete,
    /// Opaque argument byte arrays; by convention the first names the
    /// requested operation
    pub app_args: Vec<Vec<u8>>,
    /// Accounts whose state the call touches, listed explicitly as the
    /// ledger requires
    pub accounts: Vec<String>,
    pub params: SuggestedParams,
}

/// Method-name argument of the role assignment call.
const METHOD_ASSIGN_UNIVERSITY_ROLE: &str = "assignUniversityRole";

pub struct TransactionBuilder<'a> {
    client: &'a LedgerClient,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(client: &'a LedgerClient) -> Self {
        Self { client }
    }

    /// Fail fast, before any network call, when the application has not
    /// been deployed. A deployment defect must never surface as a network
    /// error.
    fn configured_app_id(&self) -> Result<u64> {
        let app_id = self.client.app_id();
        if app_id == APP_ID_UNCONFIGURED {
            return Err(LedgerError::Configuration(
                "application id is not configured; deploy the application and set app_id"
                    .to_string(),
            ));
        }
        Ok(app_id)
    }

    /// Opt the address into the application, initializing its local state.
    pub async fn build_opt_in(&self, address: &str) -> Result<UnsignedTransaction> {
        let app_id = self.configured_app_id()?;
        if address.trim().is_empty() {
            return Err(LedgerError::Validation("sender address must not be empty".to_string()));
        }

        let params = self.client.algod().transaction_params().await?;
        debug!(address = %address, app_id = %app_id, "Built opt-in transaction");

        Ok(UnsignedTransaction {
            sender: address.to_string(),
            app_id,
            on_complete: OnComplete::OptIn,
            app_args: Vec::new(),
            accounts: Vec::new(),
            params,
        })
    }

    /// Assign the university role to a target address. The caller must hold
    /// the creator privilege; the ledger re-validates that on execution.
    ///
    /// Carries the method name and the target's decoded raw public key as
    /// arguments, and lists the target as a referenced account since the
    /// call touches its local state.
    pub async fn build_assign_role(
        &self,
        caller_address: &str,
        target_address: &str,
    ) -> Result<UnsignedTransaction> {
        let app_id = self.configured_app_id()?;

        if caller_address.trim().is_empty() {
            return Err(LedgerError::Validation("caller address must not be empty".to_string()));
        }
        if target_address.trim().is_empty() {
            return Err(LedgerError::Validation("target address must not be empty".to_string()));
        }
        let target_public_key = address::decode_address(target_address)?;

        let params = self.client.algod().transaction_params().await?;
        debug!(
            caller = %caller_address,
            target = %target_address,
            app_id = %app_id,
            "Built role assignment transaction"
        );

        Ok(UnsignedTransaction {
            sender: caller_address.to_string(),
            app_id,
            on_complete: OnComplete::NoOp,
            app_args: vec![
                METHOD_ASSIGN_UNIVERSITY_ROLE.as_bytes().to_vec(),
                target_public_key.to_vec(),
            ],
            accounts: vec![target_address.to_string()],
            params,
        })
    }

    /// Generic application call: a method name plus an opaque payload the
    /// builder does not interpret. Badge operations use this shape.
    pub async fn build_app_call(
        &self,
        sender: &str,
        method: &str,
        payload: Vec<u8>,
    ) -> Result<UnsignedTransaction> {
        let app_id = self.configured_app_id()?;
        if sender.trim().is_empty() {
            return Err(LedgerError::Validation("sender address must not be empty".to_string()));
        }
        if method.is_empty() {
            return Err(LedgerError::Validation("method name must not be empty".to_string()));
        }

        let params = self.client.algod().transaction_params().await?;
        debug!(sender = %sender, method = %method, app_id = %app_id, "Built application call");

        Ok(UnsignedTransaction {
            sender: sender.to_string(),
            app_id,
            on_complete: OnComplete::NoOp,
            app_args: vec![method.as_bytes().to_vec(), payload],
            accounts: Vec::new(),
            params,
        })
    }
}
