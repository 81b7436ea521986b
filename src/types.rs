//! Common types used throughout the application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Privilege level stored in an account's per-application local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Default role for opted-in accounts (wire value 0)
    Student,
    /// University administrator (wire value 1)
    University,
}

impl Role {
    pub fn as_uint(&self) -> u64 {
        match self {
            Role::Student => 0,
            Role::University => 1,
        }
    }

    /// Interpret a stored uint; unknown values read as Student so that a
    /// future schema extension degrades rather than breaks old clients.
    pub fn from_uint(value: u64) -> Self {
        match value {
            1 => Role::University,
            _ => Role::Student,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::University => write!(f, "university"),
        }
    }
}

/// Sentinel-aware role reading: an account that never opted in has no role
/// at all, which is distinct from holding the default Student role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleState {
    /// No local state for the application exists for this account
    NotOptedIn,
    /// Opted in with the given stored (or defaulted) role
    OptedIn(Role),
}

impl RoleState {
    /// Wire encoding used by the application: -1 / 0 / 1.
    pub fn as_i64(&self) -> i64 {
        match self {
            RoleState::NotOptedIn => -1,
            RoleState::OptedIn(role) => role.as_uint() as i64,
        }
    }

    pub fn is_opted_in(&self) -> bool {
        matches!(self, RoleState::OptedIn(_))
    }
}

/// Where a resolved role came from.
///
/// `Fallback` roles exist to unblock optimistic UI flows and must never gate
/// a privileged action; the application program re-validates on-chain and
/// rejects if the optimistic default was wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSource {
    /// Read from ledger state and parsed successfully
    Confirmed,
    /// Degraded default after a query or parse failure
    Fallback,
}

/// Best-effort role answer from the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRole {
    pub role: Role,
    pub source: RoleSource,
}

impl ResolvedRole {
    pub fn confirmed(role: Role) -> Self {
        Self {
            role,
            source: RoleSource::Confirmed,
        }
    }

    pub fn fallback(role: Role) -> Self {
        Self {
            role,
            source: RoleSource::Fallback,
        }
    }

    /// True only for roles actually read from ledger state; the only kind
    /// suitable for anything security-sensitive.
    pub fn is_authoritative(&self) -> bool {
        self.source == RoleSource::Confirmed
    }
}

/// Assigned identifier of a submitted transaction.
pub type TxId = String;

/// Result of a transaction being included in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationRecord {
    pub tx_id: TxId,
    pub confirmed_round: u64,
}

/// Account balance summary from the node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    pub address: String,
    /// Balance in microalgos
    pub balance: u64,
    /// Minimum balance requirement in microalgos
    pub min_balance: u64,
    /// Number of applications this account has opted into
    pub apps_opted_in: u64,
}

/// Kind of flow recorded in the caller-owned transaction log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    OptIn,
    RoleAssignment,
    BadgeRequest,
    BadgeIssuance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    Pending,
    Confirmed,
    Failed,
}

/// One entry in the in-memory transaction log. The core never persists
/// these; the log is owned by whichever caller keeps it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowRecord {
    pub kind: FlowKind,
    pub status: FlowStatus,
    pub tx_id: TxId,
    pub timestamp: DateTime<Utc>,
}

/// Caller-owned log of submitted flows.
#[derive(Debug, Default)]
pub struct FlowLog {
    records: Vec<FlowRecord>,
}

impl FlowLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: FlowKind, tx_id: TxId, status: FlowStatus) {
        self.records.insert(
            0,
            FlowRecord {
                kind,
                status,
                tx_id,
                timestamp: Utc::now(),
            },
        );
    }

    pub fn update_status(&mut self, tx_id: &str, status: FlowStatus) {
        if let Some(record) = self.records.iter_mut().find(|r| r.tx_id == tx_id) {
            record.status = status;
        }
    }

    pub fn records(&self) -> &[FlowRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_values() {
        assert_eq!(Role::Student.as_uint(), 0);
        assert_eq!(Role::University.as_uint(), 1);
        assert_eq!(Role::from_uint(1), Role::University);
        assert_eq!(Role::from_uint(0), Role::Student);
        // Unknown future values degrade to Student
        assert_eq!(Role::from_uint(7), Role::Student);
    }

    #[test]
    fn test_role_state_sentinel() {
        assert_eq!(RoleState::NotOptedIn.as_i64(), -1);
        assert_eq!(RoleState::OptedIn(Role::Student).as_i64(), 0);
        assert_eq!(RoleState::OptedIn(Role::University).as_i64(), 1);
        assert!(!RoleState::NotOptedIn.is_opted_in());
    }

    #[test]
    fn test_resolved_role_authority() {
        assert!(ResolvedRole::confirmed(Role::University).is_authoritative());
        assert!(!ResolvedRole::fallback(Role::Student).is_authoritative());
    }

    #[test]
    fn test_flow_log_ordering_and_update() {
        let mut log = FlowLog::new();
        log.record(FlowKind::OptIn, "TX1".to_string(), FlowStatus::Pending);
        log.record(FlowKind::RoleAssignment, "TX2".to_string(), FlowStatus::Pending);

        // Newest first
        assert_eq!(log.records()[0].tx_id, "TX2");

        log.update_status("TX1", FlowStatus::Confirmed);
        assert_eq!(log.records()[1].status, FlowStatus::Confirmed);
    }
}
