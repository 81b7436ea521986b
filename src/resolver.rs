//! Role/authorization resolver
//!
//! The one surface the rest of an application should call to decide what a
//! wallet address may do. Read failures degrade to an advisory Student
//! default instead of blocking a UI; the advisory/confirmed distinction is
//! carried in the result so nothing security-sensitive can be gated on a
//! guess. True authorization lives on-chain: a privileged call submitted on
//! the strength of an optimistic default is rejected by the application
//! program itself.

use tracing::warn;

use crate::client::LedgerClient;
use crate::error::Result;
use crate::retry::retry_with_backoff;
use crate::state_reader::StateReader;
use crate::types::{ResolvedRole, Role, RoleState};

pub struct RoleResolver<'a> {
    client: &'a LedgerClient,
}

impl<'a> RoleResolver<'a> {
    pub fn new(client: &'a LedgerClient) -> Self {
        Self { client }
    }

    /// Sentinel-aware role read with bounded retry. Propagates definite
    /// query failures; callers that can handle the not-opted-in sentinel
    /// and real errors should use this variant.
    pub async fn resolve_role_strict(&self, address: &str) -> Result<RoleState> {
        let reader = StateReader::new(self.client);
        retry_with_backoff("resolve_role", self.client.retry_settings(), || {
            reader.get_role(address)
        })
        .await
    }

    /// Best-effort role for UI gating. Never errors: a query failure or the
    /// not-opted-in sentinel both degrade to an advisory Student default,
    /// marked as such so it can never be mistaken for a confirmed role.
    pub async fn resolve_role(&self, address: &str) -> ResolvedRole {
        match self.resolve_role_strict(address).await {
            Ok(RoleState::OptedIn(role)) => ResolvedRole::confirmed(role),
            Ok(RoleState::NotOptedIn) => ResolvedRole::fallback(Role::Student),
            Err(e) => {
                warn!(
                    address = %address,
                    category = e.category(),
                    error = %e,
                    "Role resolution failed; degrading to advisory student default"
                );
                ResolvedRole::fallback(Role::Student)
            }
        }
    }

    /// Re-resolve after a transaction that could have changed the address's
    /// role. Ledger state is never assumed fresh across such a transaction;
    /// the wait tolerates the indexer lagging the node by a short
    /// propagation delay.
    pub async fn resolve_after_transaction(&self, address: &str) -> ResolvedRole {
        let delay = self
            .client
            .confirmation_settings()
            .role_propagation_delay_ms;
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        self.resolve_role(address).await
    }

    /// Whether the address is the configured super admin. This is an
    /// orthogonal designation, not a Role value: an exact (case-insensitive)
    /// match against deployment configuration.
    pub fn is_super_admin(&self, address: &str) -> bool {
        match self.client.super_admin_address() {
            Some(configured) => configured.eq_ignore_ascii_case(address),
            None => {
                warn!("Super admin address is not configured");
                false
            }
        }
    }

    /// Cross-check the super-admin designation against the on-chain Creator
    /// entry. `None` when global state is unavailable.
    pub async fn is_super_admin_on_chain(&self, address: &str) -> Option<bool> {
        let reader = StateReader::new(self.client);
        reader
            .get_super_admin_address()
            .await
            .map(|creator| creator.eq_ignore_ascii_case(address))
    }
}
