//! Canonical shapes for heterogeneous transport responses
//!
//! The node and indexer REST surfaces disagree on field naming (kebab-case
//! vs camelCase), envelope nesting, and key encodings (base64 strings vs raw
//! byte arrays), and the submit response has carried the transaction id
//! under different names across protocol versions. Every one of those
//! guesses lives here and nowhere else; the rest of the crate only sees the
//! canonical types below.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value;

use crate::error::{LedgerError, Result};

/// A value stored in application key-value state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TealValue {
    Uint(u64),
    Bytes(Vec<u8>),
}

impl TealValue {
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            TealValue::Uint(v) => Some(*v),
            TealValue::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            TealValue::Bytes(b) => Some(b),
            TealValue::Uint(_) => None,
        }
    }
}

/// One canonical key-value entry; the key is raw bytes regardless of how
/// the transport encoded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TealKeyValue {
    pub key: Vec<u8>,
    pub value: TealValue,
}

/// Per-account, per-application local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationLocalState {
    pub app_id: u64,
    pub key_value: Vec<TealKeyValue>,
}

/// Canonical account view assembled from either read path.
#[derive(Debug, Clone)]
pub struct CanonicalAccount {
    pub address: String,
    pub balance: u64,
    pub min_balance: u64,
    pub apps_opted_in: u64,
    /// `None` means the response carried no local-state container at all (a
    /// structurally incomplete answer, distinct from an empty list).
    pub apps_local_state: Option<Vec<ApplicationLocalState>>,
}

impl CanonicalAccount {
    /// Local state for a specific application, if the account opted in.
    pub fn local_state_for(&self, app_id: u64) -> Option<&ApplicationLocalState> {
        self.apps_local_state
            .as_deref()
            .and_then(|apps| apps.iter().find(|s| s.app_id == app_id))
    }
}

/// Network parameters for transaction construction. These expire with the
/// validity window and must be fetched immediately before building.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SuggestedParams {
    pub fee: u64,
    pub min_fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: Vec<u8>,
}

/// Pending-transaction view from the node.
#[derive(Debug, Clone, Default)]
pub struct PendingInfo {
    pub confirmed_round: Option<u64>,
    pub pool_error: Option<String>,
}

fn field<'a>(value: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| value.get(name))
}

fn field_u64(value: &Value, names: &[&str]) -> Option<u64> {
    field(value, names).and_then(Value::as_u64)
}

/// Decode a transported key into raw bytes. Keys arrive as base64 strings
/// on the REST paths, but some transports hand back raw byte arrays; a
/// string that fails base64 decoding is taken literally.
fn decode_key(key: &Value) -> Option<Vec<u8>> {
    match key {
        Value::String(s) => Some(
            BASE64
                .decode(s)
                .unwrap_or_else(|_| s.as_bytes().to_vec()),
        ),
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_u64().map(|n| n as u8))
            .collect::<Option<Vec<u8>>>(),
        _ => None,
    }
}

fn parse_teal_value(value: &Value) -> Option<TealValue> {
    // Wire tag: 1 = bytes, 2 = uint
    match field_u64(value, &["type"]) {
        Some(2) => field_u64(value, &["uint"]).map(TealValue::Uint),
        Some(1) => {
            let encoded = field(value, &["bytes"])?.as_str()?;
            BASE64.decode(encoded).ok().map(TealValue::Bytes)
        }
        _ => None,
    }
}

fn parse_key_value_list(value: &Value) -> Vec<TealKeyValue> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let key = decode_key(entry.get("key")?)?;
            let value = parse_teal_value(entry.get("value")?)?;
            Some(TealKeyValue { key, value })
        })
        .collect()
}

fn parse_local_state(value: &Value) -> Option<ApplicationLocalState> {
    let app_id = field_u64(value, &["id", "app-id", "appId"])?;
    let key_value = field(value, &["key-value", "keyValue"])
        .map(parse_key_value_list)
        .unwrap_or_default();
    Some(ApplicationLocalState { app_id, key_value })
}

/// Parse an account response from either the node (bare account object) or
/// the indexer (`{"account": {...}, "current-round": n}` envelope).
pub fn parse_account(response: &Value) -> Result<CanonicalAccount> {
    let account = field(response, &["account"]).unwrap_or(response);

    let address = field(account, &["address"])
        .and_then(Value::as_str)
        .ok_or_else(|| {
            LedgerError::Unknown("account response is missing the address field".to_string())
        })?
        .to_string();

    let apps_local_state = field(account, &["apps-local-state", "appsLocalState"])
        .and_then(Value::as_array)
        .map(|apps| apps.iter().filter_map(parse_local_state).collect());

    Ok(CanonicalAccount {
        address,
        balance: field_u64(account, &["amount"]).unwrap_or(0),
        min_balance: field_u64(account, &["min-balance", "minBalance"]).unwrap_or(0),
        apps_opted_in: field_u64(account, &["apps-total-opted-in", "appsTotalOptedIn"]).unwrap_or(0),
        apps_local_state,
    })
}

/// Parse the global state list out of an application-info response.
pub fn parse_global_state(response: &Value) -> Vec<TealKeyValue> {
    field(response, &["params"])
        .and_then(|params| field(params, &["global-state", "globalState"]))
        .map(parse_key_value_list)
        .unwrap_or_default()
}

/// Find the entry for a literal key name, matching the canonical raw bytes
/// and the base64 rendering of the name (the two transports disagree on
/// which one the stored key is).
pub fn find_named_entry<'a>(entries: &'a [TealKeyValue], name: &str) -> Option<&'a TealValue> {
    let raw = name.as_bytes();
    let encoded = BASE64.encode(raw);
    entries
        .iter()
        .find(|kv| kv.key == raw || kv.key == encoded.as_bytes())
        .map(|kv| &kv.value)
}

/// Extract the assigned transaction id from a submit response. The field
/// name has not been stable across protocol/library versions.
pub fn extract_tx_id(response: &Value) -> Option<String> {
    field(response, &["txId", "txid", "txID", "tx-id"])
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub fn parse_pending_info(response: &Value) -> PendingInfo {
    let confirmed_round =
        field_u64(response, &["confirmed-round", "confirmedRound"]).filter(|round| *round > 0);
    let pool_error = field(response, &["pool-error", "poolError"])
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    PendingInfo {
        confirmed_round,
        pool_error,
    }
}

/// Parse the transaction-params response into canonical parameters.
///
/// The validity window starts at the node's current round; the window
/// length follows the ledger's maximum of 1000 rounds.
pub fn parse_suggested_params(response: &Value) -> Result<SuggestedParams> {
    let last_round = field_u64(response, &["last-round", "lastRound"]).ok_or_else(|| {
        LedgerError::Unknown("params response is missing the last-round field".to_string())
    })?;

    let genesis_hash = field(response, &["genesis-hash", "genesishashb64", "genesisHash"])
        .and_then(Value::as_str)
        .and_then(|s| BASE64.decode(s).ok())
        .ok_or_else(|| {
            LedgerError::Unknown("params response is missing the genesis hash".to_string())
        })?;

    let min_fee = field_u64(response, &["min-fee", "minFee"]).unwrap_or(1000);

    Ok(SuggestedParams {
        fee: field_u64(response, &["fee"]).unwrap_or(min_fee),
        min_fee,
        first_valid: last_round,
        last_valid: last_round + 1000,
        genesis_id: field(response, &["genesis-id", "genesisID", "genesisId"])
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        genesis_hash,
    })
}

/// Node status, used by the confirmation poll to pace itself by round.
#[derive(Debug, Clone, Copy)]
pub struct NodeStatus {
    pub last_round: u64,
}

pub fn parse_node_status(response: &Value) -> Result<NodeStatus> {
    let last_round = field_u64(response, &["last-round", "lastRound"]).ok_or_else(|| {
        LedgerError::Unknown("status response is missing the last-round field".to_string())
    })?;
    Ok(NodeStatus { last_round })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_account_kebab_case() {
        let response = json!({
            "address": "ADDR",
            "amount": 5_000_000,
            "min-balance": 100_000,
            "apps-total-opted-in": 1,
            "apps-local-state": [{
                "id": 1234,
                "key-value": [{
                    "key": BASE64.encode("Role"),
                    "value": {"type": 2, "uint": 1}
                }]
            }]
        });

        let account = parse_account(&response).unwrap();
        assert_eq!(account.balance, 5_000_000);
        let state = account.local_state_for(1234).unwrap();
        let role = find_named_entry(&state.key_value, "Role").unwrap();
        assert_eq!(role.as_uint(), Some(1));
    }

    #[test]
    fn test_parse_account_camel_case_envelope() {
        // Indexer envelope + camelCase field names
        let response = json!({
            "account": {
                "address": "ADDR",
                "amount": 0,
                "appsLocalState": [{
                    "id": 1234,
                    "keyValue": [{
                        "key": BASE64.encode("Role"),
                        "value": {"type": 2, "uint": 0}
                    }]
                }]
            },
            "current-round": 99
        });

        let account = parse_account(&response).unwrap();
        let state = account.local_state_for(1234).unwrap();
        assert_eq!(
            find_named_entry(&state.key_value, "Role").unwrap().as_uint(),
            Some(0)
        );
    }

    #[test]
    fn test_key_as_raw_byte_array() {
        let response = json!({
            "address": "ADDR",
            "apps-local-state": [{
                "id": 7,
                "key-value": [{
                    "key": [82, 111, 108, 101],
                    "value": {"type": 2, "uint": 1}
                }]
            }]
        });

        let account = parse_account(&response).unwrap();
        let state = account.local_state_for(7).unwrap();
        assert_eq!(
            find_named_entry(&state.key_value, "Role").unwrap().as_uint(),
            Some(1)
        );
    }

    #[test]
    fn test_bytes_value_is_decoded() {
        let creator = [3u8; 32];
        let response = json!({
            "id": 1234,
            "params": {
                "global-state": [{
                    "key": BASE64.encode("Creator"),
                    "value": {"type": 1, "bytes": BASE64.encode(creator)}
                }]
            }
        });

        let global = parse_global_state(&response);
        let value = find_named_entry(&global, "Creator").unwrap();
        assert_eq!(value.as_bytes(), Some(&creator[..]));
    }

    #[test]
    fn test_absent_container_is_distinct_from_empty_list() {
        let account = parse_account(&json!({"address": "ADDR", "amount": 0})).unwrap();
        assert!(account.apps_local_state.is_none());

        let account =
            parse_account(&json!({"address": "ADDR", "apps-local-state": []})).unwrap();
        assert_eq!(account.apps_local_state.as_deref(), Some(&[][..]));
    }

    #[test]
    fn test_missing_entry_is_none() {
        let global: Vec<TealKeyValue> = Vec::new();
        assert!(find_named_entry(&global, "Creator").is_none());
    }

    #[test]
    fn test_extract_tx_id_variants() {
        for key in ["txId", "txid", "txID"] {
            let response = json!({ key: "ABCDEF" });
            assert_eq!(extract_tx_id(&response).as_deref(), Some("ABCDEF"));
        }
        assert!(extract_tx_id(&json!({"unrelated": 1})).is_none());
    }

    #[test]
    fn test_pending_info_zero_round_is_unconfirmed() {
        let info = parse_pending_info(&json!({"confirmed-round": 0}));
        assert!(info.confirmed_round.is_none());

        let info = parse_pending_info(&json!({"confirmed-round": 812, "pool-error": ""}));
        assert_eq!(info.confirmed_round, Some(812));
        assert!(info.pool_error.is_none());

        let info = parse_pending_info(&json!({"pool-error": "overspend"}));
        assert_eq!(info.pool_error.as_deref(), Some("overspend"));
    }

    #[test]
    fn test_suggested_params_window() {
        let response = json!({
            "fee": 0,
            "min-fee": 1000,
            "last-round": 5000,
            "genesis-id": "testnet-v1.0",
            "genesis-hash": BASE64.encode([9u8; 32])
        });

        let params = parse_suggested_params(&response).unwrap();
        assert_eq!(params.first_valid, 5000);
        assert_eq!(params.last_valid, 6000);
        assert_eq!(params.fee, 0);
        assert_eq!(params.min_fee, 1000);
    }
}
