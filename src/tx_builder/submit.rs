//! Submission and confirmation engine
//!
//! Lifecycle per transaction: `Built -> Submitted -> {Confirmed | TimedOut
//! | Rejected}`. Submission is a point of no return; after it only the
//! confirmation wait can time out, and a timeout is proof of
//! non-observation within budget, never proof of failure.

use tracing::{debug, info, warn};

use crate::client::canonical;
use crate::client::LedgerClient;
use crate::error::{LedgerError, Result};
use crate::retry::retry_with_backoff;
use crate::signer::Signer;
use crate::tx_builder::UnsignedTransaction;
use crate::types::{ConfirmationRecord, TxId};

pub struct SubmissionEngine<'a> {
    client: &'a LedgerClient,
}

impl<'a> SubmissionEngine<'a> {
    pub fn new(client: &'a LedgerClient) -> Self {
        Self { client }
    }

    /// Send raw signed bytes and return the assigned transaction id.
    ///
    /// Submission of the same bytes is idempotent on the ledger side, so a
    /// connectivity failure here is safely retried by the wrapper.
    pub async fn submit(&self, signed: &[u8]) -> Result<TxId> {
        if signed.is_empty() {
            return Err(LedgerError::Validation(
                "signed transaction bytes must not be empty".to_string(),
            ));
        }

        let response = retry_with_backoff("submit_transaction", self.client.retry_settings(), || {
            let bytes = signed.to_vec();
            async move { self.client.algod().submit_raw(bytes).await }
        })
        .await?;

        let tx_id = canonical::extract_tx_id(&response).ok_or_else(|| {
            LedgerError::Unknown("submit response did not carry a transaction id".to_string())
        })?;

        info!(tx_id = %tx_id, size_bytes = signed.len(), "Transaction submitted");
        Ok(tx_id)
    }

    /// Poll once per round until the transaction is included or `max_rounds`
    /// rounds have elapsed.
    ///
    /// A pool rejection surfaces as its classified terminal error; running
    /// out of rounds surfaces as a timeout distinct from any network error,
    /// because the transaction may still confirm later.
    pub async fn wait_for_confirmation(
        &self,
        tx_id: &str,
        max_rounds: u64,
    ) -> Result<ConfirmationRecord> {
        let start_round = self.client.algod().status().await?.last_round;
        let deadline = start_round + max_rounds;
        let mut current_round = start_round;

        debug!(
            tx_id = %tx_id,
            start_round = start_round,
            max_rounds = max_rounds,
            "Waiting for confirmation"
        );

        loop {
            match self.client.algod().pending_info(tx_id).await {
                Ok(response) => {
                    let pending = canonical::parse_pending_info(&response);

                    if let Some(pool_error) = pending.pool_error {
                        warn!(tx_id = %tx_id, pool_error = %pool_error, "Transaction rejected");
                        return Err(LedgerError::classify_message(&pool_error, "node"));
                    }

                    if let Some(confirmed_round) = pending.confirmed_round {
                        info!(
                            tx_id = %tx_id,
                            confirmed_round = confirmed_round,
                            waited_rounds = confirmed_round.saturating_sub(start_round),
                            "Transaction confirmed"
                        );
                        return Ok(ConfirmationRecord {
                            tx_id: tx_id.to_string(),
                            confirmed_round,
                        });
                    }
                }
                // The node may not know the id yet; keep polling within the
                // round budget rather than failing the wait.
                Err(e) => {
                    debug!(tx_id = %tx_id, error = %e, "Pending lookup failed; continuing to poll")
                }
            }

            if current_round >= deadline {
                warn!(tx_id = %tx_id, max_rounds = max_rounds, "Confirmation wait exhausted");
                return Err(LedgerError::Timeout {
                    operation: format!("confirmation of {tx_id} within {max_rounds} rounds"),
                });
            }

            // Pace by round boundary; when the blocking wait itself fails,
            // approximate a round locally so the poll still advances.
            match self.client.algod().wait_for_round_after(current_round).await {
                Ok(status) => current_round = status.last_round.max(current_round + 1),
                Err(e) => {
                    debug!(error = %e, "Round wait failed; sleeping one round interval");
                    tokio::time::sleep(std::time::Duration::from_millis(
                        self.client.confirmation_settings().round_wait_ms,
                    ))
                    .await;
                    current_round += 1;
                }
            }
        }
    }

    /// Submit and wait with the configured round bound: the primary entry
    /// point for all state-changing flows.
    pub async fn submit_and_wait(&self, signed: &[u8]) -> Result<ConfirmationRecord> {
        let max_rounds = self.client.confirmation_settings().max_rounds;
        self.submit_and_wait_rounds(signed, max_rounds).await
    }

    pub async fn submit_and_wait_rounds(
        &self,
        signed: &[u8],
        max_rounds: u64,
    ) -> Result<ConfirmationRecord> {
        let tx_id = self.submit(signed).await?;
        self.wait_for_confirmation(&tx_id, max_rounds).await
    }

    /// Full flow from a built transaction: hand it to the signer, then
    /// submit and wait. A declined signature terminates the flow as
    /// rejected-by-user before anything reaches the network.
    pub async fn sign_and_submit(
        &self,
        signer: &dyn Signer,
        transaction: UnsignedTransaction,
    ) -> Result<ConfirmationRecord> {
        let blobs = signer
            .sign_transactions(std::slice::from_ref(&transaction))
            .await?;
        let signed = blobs.into_iter().next().ok_or_else(|| {
            LedgerError::Unknown("signer returned no signed transactions".to_string())
        })?;
        self.submit_and_wait(&signed).await
    }
}
