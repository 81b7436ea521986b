//! Error taxonomy for ledger operations
//!
//! Every failure surfaced by this crate is one of a closed set of causes so
//! callers can branch on the kind instead of scraping message text. Raw
//! transport/ledger messages are preserved inside the variants for logging.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Closed error taxonomy for all client operations.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// Deployment/configuration defect: unconfigured application id or a
    /// missing endpoint. Never retried; fixed by operators, not by waiting.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Caller-facing input validation failure, raised before any network
    /// call is attempted.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Connection refused / host not found class failures. Retryable.
    #[error("Connectivity error: {message} (endpoint: {endpoint})")]
    Connectivity { endpoint: String, message: String },

    /// A request or confirmation wait exceeded its budget. The outcome is
    /// ambiguous: a submitted transaction may still confirm later, so this
    /// is proof of non-observation, not of failure.
    #[error("Timeout: {operation} exceeded its budget")]
    Timeout { operation: String },

    /// The external signer declined the request. Terminal; no side effects
    /// occurred because nothing was submitted.
    #[error("Transaction was cancelled by the user")]
    RejectedByUser,

    /// Ledger rejected the transaction due to funds. Terminal and
    /// user-actionable.
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// The application program explicitly rejected the call (missing
    /// privilege, not opted in, already opted in). Terminal; the message is
    /// kept verbatim so callers can tell an already-opted-in no-op from a
    /// true authorization denial.
    #[error("Rejected by application logic: {0}")]
    LogicRejection(String),

    /// All retry attempts were consumed. Carries the attempt count and the
    /// last underlying cause.
    #[error("Operation failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<LedgerError>,
    },

    /// Anything not matched above, with the original message preserved.
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl LedgerError {
    /// Whether the retry wrapper may re-attempt the operation.
    ///
    /// Only connectivity/timeout-class failures are transient by nature; a
    /// deterministic rejection (balance, logic, validation) fails the same
    /// way every time and is propagated on first occurrence.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connectivity { .. } => true,
            Self::Timeout { .. } => true,

            Self::Configuration(_) => false,
            Self::Validation(_) => false,
            Self::RejectedByUser => false,
            Self::InsufficientBalance(_) => false,
            Self::LogicRejection(_) => false,
            Self::RetriesExhausted { .. } => false,
            Self::Unknown(_) => false,
        }
    }

    /// Error category for structured logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "config",
            Self::Validation(_) => "validation",
            Self::Connectivity { .. } => "connectivity",
            Self::Timeout { .. } => "timeout",
            Self::RejectedByUser => "user",
            Self::InsufficientBalance(_) => "balance",
            Self::LogicRejection(_) => "logic",
            Self::RetriesExhausted { last, .. } => last.category(),
            Self::Unknown(_) => "unknown",
        }
    }

    /// Whether this is the "already opted in" logic rejection, which most
    /// flows treat as a success-equivalent no-op.
    pub fn is_already_opted_in(&self) -> bool {
        match self {
            Self::LogicRejection(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("already opted in") || msg.contains("has already opted in")
            }
            Self::RetriesExhausted { last, .. } => last.is_already_opted_in(),
            _ => false,
        }
    }

    /// Classify a raw transport/ledger error message into the taxonomy.
    ///
    /// The original message is preserved inside the variant; only the kind
    /// is derived from the text.
    pub fn classify_message(message: &str, endpoint: &str) -> Self {
        let lower = message.to_lowercase();

        if lower.contains("econnrefused")
            || lower.contains("enotfound")
            || lower.contains("connection refused")
            || lower.contains("connection reset")
            || lower.contains("dns error")
            || lower.contains("error sending request")
        {
            Self::Connectivity {
                endpoint: endpoint.to_string(),
                message: message.to_string(),
            }
        } else if lower.contains("timeout") || lower.contains("timed out") {
            Self::Timeout {
                operation: format!("request to {endpoint}"),
            }
        } else if lower.contains("insufficient funds")
            || lower.contains("insufficient balance")
            || lower.contains("overspend")
        {
            Self::InsufficientBalance(message.to_string())
        } else if lower.contains("logic eval error")
            || lower.contains("rejected by approvalprogram")
            || lower.contains("rejected by logic")
            || lower.contains("already opted in")
            || lower.contains("not opted in")
            || lower.contains("invalid signature")
        {
            Self::LogicRejection(message.to_string())
        } else if lower.contains("application does not exist") {
            Self::Configuration(message.to_string())
        } else {
            Self::Unknown(message.to_string())
        }
    }

    pub(crate) fn retries_exhausted(attempts: u32, last: LedgerError) -> Self {
        Self::RetriesExhausted {
            attempts,
            last: Box::new(last),
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, endpoint: &str) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                operation: format!("request to {endpoint}"),
            }
        } else if err.is_connect() {
            Self::Connectivity {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        } else {
            Self::classify_message(&err.to_string(), endpoint)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryability() {
        assert!(LedgerError::Connectivity {
            endpoint: "http://localhost:8080".to_string(),
            message: "connection refused".to_string(),
        }
        .is_retryable());

        assert!(LedgerError::Timeout {
            operation: "wait".to_string(),
        }
        .is_retryable());

        assert!(!LedgerError::Configuration("app id not set".to_string()).is_retryable());
        assert!(!LedgerError::InsufficientBalance("overspend".to_string()).is_retryable());
        assert!(!LedgerError::LogicRejection("rejected".to_string()).is_retryable());
        assert!(!LedgerError::RejectedByUser.is_retryable());
    }

    #[test]
    fn test_classify_connectivity() {
        let err = LedgerError::classify_message("ECONNREFUSED 127.0.0.1:8080", "http://localhost:8080");
        assert!(matches!(err, LedgerError::Connectivity { .. }));

        let err = LedgerError::classify_message("getaddrinfo ENOTFOUND algod.local", "http://algod.local");
        assert!(matches!(err, LedgerError::Connectivity { .. }));
    }

    #[test]
    fn test_classify_ledger_rejections() {
        let err = LedgerError::classify_message(
            "TransactionPool.Remember: transaction would result in overspend",
            "node",
        );
        assert!(matches!(err, LedgerError::InsufficientBalance(_)));

        let err = LedgerError::classify_message(
            "transaction rejected by ApprovalProgram: logic eval error",
            "node",
        );
        assert!(matches!(err, LedgerError::LogicRejection(_)));

        let err = LedgerError::classify_message("account has already opted in to app 1234", "node");
        assert!(err.is_already_opted_in());

        let err = LedgerError::classify_message("something entirely novel", "node");
        assert!(matches!(err, LedgerError::Unknown(_)));
    }

    #[test]
    fn test_retries_exhausted_preserves_cause() {
        let inner = LedgerError::Connectivity {
            endpoint: "http://localhost:8080".to_string(),
            message: "connection refused".to_string(),
        };
        let err = LedgerError::retries_exhausted(3, inner);

        assert_eq!(err.category(), "connectivity");
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("after 3 attempts"));
    }
}
