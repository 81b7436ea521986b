//! Badge issuance and verification
//!
//! Badges are JSON payloads carried as opaque cargo in application calls
//! and mirrored into global state under `badge_data<hash>` keys. The digest
//! binds the payload fields; verification recomputes it from the stored
//! payload, so a tampered badge fails even if the stored hash field was
//! edited to match.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::client::canonical;
use crate::client::LedgerClient;
use crate::config::APP_ID_UNCONFIGURED;
use crate::error::{LedgerError, Result};
use crate::tx_builder::{TransactionBuilder, UnsignedTransaction};

/// Method names understood by the application program.
const METHOD_CREATE_BADGE_REQUEST: &str = "create_badge_request";
const METHOD_CREATE_BADGE: &str = "create_meta_badge";

/// Global-state key prefixes written by the application program.
const BADGE_DATA_PREFIX: &str = "badge_data";
const BADGE_REQUEST_PREFIX: &str = "badge_request";
const APPROVED_PREFIX: &str = "approved";
const TIMESTAMP_PREFIX: &str = "timestamp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeRequestState {
    Pending,
    Approved,
    Rejected,
}

/// A student's request for a badge, pending university approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeRequest {
    pub student_id: String,
    pub course_id: String,
    pub institution_id: String,
    pub request_timestamp: i64,
    pub status: BadgeRequestState,
}

/// An issued badge as stored on-chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: String,
    pub student_id: String,
    pub course_id: String,
    pub institution_id: String,
    pub learning_outcomes: Vec<String>,
    pub issue_timestamp: i64,
    pub badge_hash: String,
}

/// Canonical digest payload. Field order is part of the digest contract;
/// do not reorder.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HashPayload<'a> {
    student_id: &'a str,
    course_id: &'a str,
    institution_id: &'a str,
    learning_outcomes: &'a [String],
    issue_timestamp: i64,
}

/// SHA-256 hex digest over the canonical badge payload.
pub fn generate_badge_hash(
    student_id: &str,
    course_id: &str,
    institution_id: &str,
    learning_outcomes: &[String],
    issue_timestamp: i64,
) -> String {
    let payload = HashPayload {
        student_id,
        course_id,
        institution_id,
        learning_outcomes,
        issue_timestamp,
    };
    // Struct serialization is deterministic, so the digest is too
    let json = serde_json::to_string(&payload).expect("badge payload serializes");
    hex::encode(Sha256::digest(json.as_bytes()))
}

impl Badge {
    /// Assemble a badge and bind its digest.
    pub fn new(
        student_id: String,
        course_id: String,
        institution_id: String,
        learning_outcomes: Vec<String>,
        issue_timestamp: i64,
    ) -> Self {
        let badge_hash = generate_badge_hash(
            &student_id,
            &course_id,
            &institution_id,
            &learning_outcomes,
            issue_timestamp,
        );
        Self {
            id: format!("{student_id}-{course_id}-{issue_timestamp}"),
            student_id,
            course_id,
            institution_id,
            learning_outcomes,
            issue_timestamp,
            badge_hash,
        }
    }

    fn recomputed_hash(&self) -> String {
        generate_badge_hash(
            &self.student_id,
            &self.course_id,
            &self.institution_id,
            &self.learning_outcomes,
            self.issue_timestamp,
        )
    }
}

/// Outcome of a badge verification read.
#[derive(Debug, Clone)]
pub struct BadgeVerification {
    pub verified: bool,
    pub badge: Option<Badge>,
}

impl BadgeVerification {
    fn not_verified() -> Self {
        Self {
            verified: false,
            badge: None,
        }
    }
}

/// Status of a badge request from global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeRequestStatus {
    pub exists: bool,
    pub approved: bool,
    pub timestamp: Option<u64>,
}

pub struct BadgeService<'a> {
    client: &'a LedgerClient,
}

impl<'a> BadgeService<'a> {
    pub fn new(client: &'a LedgerClient) -> Self {
        Self { client }
    }

    /// Application call requesting a badge; the request JSON is opaque
    /// cargo to the builder.
    pub async fn build_badge_request(
        &self,
        sender: &str,
        request: &BadgeRequest,
    ) -> Result<UnsignedTransaction> {
        let payload = serde_json::to_vec(request)
            .map_err(|e| LedgerError::Validation(format!("badge request does not serialize: {e}")))?;
        TransactionBuilder::new(self.client)
            .build_app_call(sender, METHOD_CREATE_BADGE_REQUEST, payload)
            .await
    }

    /// Application call issuing a badge after approval.
    pub async fn build_issue_badge(
        &self,
        sender: &str,
        badge: &Badge,
    ) -> Result<UnsignedTransaction> {
        if badge.badge_hash != badge.recomputed_hash() {
            return Err(LedgerError::Validation(
                "badge hash does not match its payload".to_string(),
            ));
        }
        let payload = serde_json::to_vec(badge)
            .map_err(|e| LedgerError::Validation(format!("badge does not serialize: {e}")))?;
        TransactionBuilder::new(self.client)
            .build_app_call(sender, METHOD_CREATE_BADGE, payload)
            .await
    }

    /// Verify a badge against global state: the stored payload must exist
    /// under the hash key, belong to the student, and recompute to the same
    /// digest. Absence and mismatch are clean negatives, not errors.
    pub async fn verify_badge(&self, badge_hash: &str, student_id: &str) -> Result<BadgeVerification> {
        let global = self.global_state().await?;

        let key = format!("{BADGE_DATA_PREFIX}{badge_hash}");
        let Some(value) = canonical::find_named_entry(&global, &key) else {
            debug!(badge_hash = %badge_hash, "No badge data entry in global state");
            return Ok(BadgeVerification::not_verified());
        };
        let Some(bytes) = value.as_bytes() else {
            warn!(badge_hash = %badge_hash, "Badge data entry is not a byte value");
            return Ok(BadgeVerification::not_verified());
        };

        let badge: Badge = match serde_json::from_slice(bytes) {
            Ok(badge) => badge,
            Err(e) => {
                warn!(badge_hash = %badge_hash, error = %e, "Stored badge payload does not parse");
                return Ok(BadgeVerification::not_verified());
            }
        };

        let verified = badge.badge_hash == badge_hash
            && badge.student_id == student_id
            && badge.recomputed_hash() == badge_hash;

        Ok(BadgeVerification {
            verified,
            badge: verified.then_some(badge),
        })
    }

    /// Read the lifecycle of a badge request from global state.
    pub async fn badge_request_status(&self, request_id: &str) -> Result<BadgeRequestStatus> {
        let global = self.global_state().await?;

        let request_key = format!("{BADGE_REQUEST_PREFIX}{request_id}");
        if canonical::find_named_entry(&global, &request_key).is_none() {
            return Ok(BadgeRequestStatus {
                exists: false,
                approved: false,
                timestamp: None,
            });
        }

        let approved_key = format!("{APPROVED_PREFIX}{request_id}");
        let approved = canonical::find_named_entry(&global, &approved_key)
            .and_then(|value| value.as_bytes())
            .map(|bytes| bytes == b"approved")
            .unwrap_or(false);

        let timestamp_key = format!("{TIMESTAMP_PREFIX}{request_id}");
        let timestamp = canonical::find_named_entry(&global, &timestamp_key)
            .and_then(|value| value.as_uint());

        Ok(BadgeRequestStatus {
            exists: true,
            approved,
            timestamp,
        })
    }

    async fn global_state(&self) -> Result<Vec<canonical::TealKeyValue>> {
        let app_id = self.client.app_id();
        if app_id == APP_ID_UNCONFIGURED {
            return Err(LedgerError::Configuration(
                "application id is not configured; cannot read badge state".to_string(),
            ));
        }
        let response = self.client.algod().application_info(app_id).await?;
        Ok(canonical::parse_global_state(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_badge() -> Badge {
        Badge::new(
            "student-1".to_string(),
            "course-rust-101".to_string(),
            "inst-1".to_string(),
            vec!["ownership".to_string(), "borrowing".to_string()],
            1_722_000_000,
        )
    }

    #[test]
    fn test_hash_is_deterministic_and_bound_to_fields() {
        let badge = sample_badge();
        assert_eq!(badge.badge_hash, badge.recomputed_hash());
        assert_eq!(badge.badge_hash.len(), 64);

        let mut tampered = badge.clone();
        tampered.course_id = "course-rust-201".to_string();
        assert_ne!(tampered.recomputed_hash(), badge.badge_hash);
    }

    #[test]
    fn test_hash_depends_on_outcome_order() {
        let a = generate_badge_hash("s", "c", "i", &["x".to_string(), "y".to_string()], 1);
        let b = generate_badge_hash("s", "c", "i", &["y".to_string(), "x".to_string()], 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_badge_payload_uses_wire_field_names() {
        let badge = sample_badge();
        let json = serde_json::to_value(&badge).unwrap();
        assert!(json.get("studentId").is_some());
        assert!(json.get("learningOutcomes").is_some());
        assert!(json.get("badgeHash").is_some());
    }
}
