//! Account state reader
//!
//! Answers "what role does this address hold" from ledger state. The
//! indexer is the preferred path; when it errors or returns a structurally
//! incomplete response the reader walks the node's account-information
//! response instead, so both transports must yield the same answer for the
//! same state.

use tracing::{debug, warn};

use crate::address;
use crate::client::canonical::{self, CanonicalAccount, TealValue};
use crate::client::LedgerClient;
use crate::config::APP_ID_UNCONFIGURED;
use crate::error::{LedgerError, Result};
use crate::types::{AccountSummary, Role, RoleState};

/// Local-state key holding the role uint.
const ROLE_KEY: &str = "Role";
/// Global-state key holding the creator's raw public key.
const CREATOR_KEY: &str = "Creator";

pub struct StateReader<'a> {
    client: &'a LedgerClient,
}

impl<'a> StateReader<'a> {
    pub fn new(client: &'a LedgerClient) -> Self {
        Self { client }
    }

    /// Current role of an address, or the not-opted-in sentinel.
    ///
    /// A role read here must never be assumed to survive a state-changing
    /// transaction the caller just submitted; re-read after confirmation.
    pub async fn get_role(&self, address: &str) -> Result<RoleState> {
        let app_id = self.client.app_id();
        if app_id == APP_ID_UNCONFIGURED {
            return Err(LedgerError::Configuration(
                "application id is not configured; cannot read roles".to_string(),
            ));
        }

        match self.role_via_indexer(address, app_id).await {
            Ok(state) => Ok(state),
            Err(reason) => {
                warn!(
                    address = %address,
                    reason = %reason,
                    "Indexer role read failed, falling back to node"
                );
                self.role_via_node(address, app_id).await
            }
        }
    }

    async fn role_via_indexer(&self, address: &str, app_id: u64) -> Result<RoleState> {
        let response = self.client.indexer().lookup_account(address).await?;
        let account = canonical::parse_account(&response)?;

        // A missing container is an incomplete indexer answer, not proof of
        // anything; let the node decide.
        if account.apps_local_state.is_none() {
            return Err(LedgerError::Unknown(
                "indexer response carried no local-state container".to_string(),
            ));
        }

        Ok(Self::role_from_account(&account, app_id, "indexer"))
    }

    async fn role_via_node(&self, address: &str, app_id: u64) -> Result<RoleState> {
        let response = self.client.algod().account_information(address).await?;
        let account = canonical::parse_account(&response)?;
        Ok(Self::role_from_account(&account, app_id, "node"))
    }

    /// Walk a canonical account for the role entry. Presence of the
    /// application entry without a readable Role key means "opted in, role
    /// not yet set" and reads as the Student default.
    fn role_from_account(account: &CanonicalAccount, app_id: u64, path: &str) -> RoleState {
        let Some(local_state) = account.local_state_for(app_id) else {
            debug!(address = %account.address, path = %path, "No local state for application");
            return RoleState::NotOptedIn;
        };

        match canonical::find_named_entry(&local_state.key_value, ROLE_KEY) {
            Some(TealValue::Uint(value)) => {
                debug!(address = %account.address, role = %value, path = %path, "Role read");
                RoleState::OptedIn(Role::from_uint(*value))
            }
            Some(TealValue::Bytes(_)) => {
                warn!(
                    address = %account.address,
                    path = %path,
                    "Role entry holds bytes instead of a uint; defaulting to student"
                );
                RoleState::OptedIn(Role::Student)
            }
            None => {
                debug!(
                    address = %account.address,
                    path = %path,
                    "Opted in without an explicit role; defaulting to student"
                );
                RoleState::OptedIn(Role::Student)
            }
        }
    }

    /// Whether the address holds local state for the configured application.
    /// Never errors: a transient failure reads as false and the caller may
    /// retry at its own level.
    pub async fn is_opted_in(&self, address: &str) -> bool {
        match self.get_role(address).await {
            Ok(state) => state.is_opted_in(),
            Err(e) => {
                warn!(address = %address, error = %e, "Opt-in check failed; reporting false");
                false
            }
        }
    }

    /// The application creator's address from global state, decoded from
    /// the stored raw public key. `None` when the application id is
    /// unconfigured, the entry is absent, or the read fails.
    pub async fn get_super_admin_address(&self) -> Option<String> {
        let app_id = self.client.app_id();
        if app_id == APP_ID_UNCONFIGURED {
            return None;
        }

        let response = match self.client.algod().application_info(app_id).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Failed to read application global state");
                return None;
            }
        };

        let global = canonical::parse_global_state(&response);
        let value = canonical::find_named_entry(&global, CREATOR_KEY)?;
        let bytes = value.as_bytes()?;

        match address::encode_address(bytes) {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                warn!(error = %e, "Creator entry does not decode to an address");
                None
            }
        }
    }

    /// Balance summary from the node.
    pub async fn account_summary(&self, address: &str) -> Result<AccountSummary> {
        let response = self.client.algod().account_information(address).await?;
        let account = canonical::parse_account(&response)?;
        Ok(AccountSummary {
            address: account.address,
            balance: account.balance,
            min_balance: account.min_balance,
            apps_opted_in: account.apps_opted_in,
        })
    }
}
