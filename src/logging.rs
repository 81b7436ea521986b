//! Structured logging and flow context

use uuid::Uuid;

/// Structured logger for one user-initiated flow (a role lookup or a
/// build/sign/submit/confirm sequence). All events carry the correlation id
/// so concurrent flows can be told apart in the logs.
#[derive(Debug, Clone)]
pub struct FlowLogger {
    correlation_id: String,
}

impl FlowLogger {
    pub fn new(correlation_id: String) -> Self {
        Self { correlation_id }
    }

    pub fn log_confirmation(&self, tx_id: &str, round: u64) {
        tracing::info!(
            correlation_id = %self.correlation_id,
            tx_id = %tx_id,
            confirmed_round = %round,
            "Transaction confirmed"
        );
    }

    pub fn log_failure(&self, operation: &str, category: &str, error: &str) {
        tracing::warn!(
            correlation_id = %self.correlation_id,
            operation = %operation,
            category = %category,
            error = %error,
            "Operation failed"
        );
    }
}

/// Execution context threaded through one flow.
#[derive(Debug, Clone)]
pub struct FlowContext {
    /// Unique id for this flow
    pub correlation_id: String,

    /// Operation name, e.g. "opt_in" or "assign_role"
    pub operation: String,

    /// Structured logger instance
    pub logger: FlowLogger,
}

impl FlowContext {
    pub fn new(operation: &str) -> Self {
        let correlation_id = Uuid::new_v4().to_string();
        Self {
            correlation_id: correlation_id.clone(),
            operation: operation.to_string(),
            logger: FlowLogger::new(correlation_id),
        }
    }

    /// Create a child context sharing the correlation id.
    pub fn child(&self, operation: &str) -> Self {
        Self {
            correlation_id: self.correlation_id.clone(),
            operation: operation.to_string(),
            logger: self.logger.clone(),
        }
    }
}

impl Default for FlowContext {
    fn default() -> Self {
        Self::new("default")
    }
}
