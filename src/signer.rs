//! External signer boundary
//!
//! Signing is not this crate's business: a wallet (browser extension,
//! hardware device, KMD) consumes unsigned transactions and returns opaque
//! signed blobs. The one behavior the core depends on is that a user
//! declining the request is reported as a distinct condition, because that
//! terminates the flow with no side effects — nothing was submitted.

use async_trait::async_trait;

use crate::error::LedgerError;
use crate::tx_builder::UnsignedTransaction;

/// Opaque signed transaction bytes. Never inspected or mutated here.
pub type SignedTransactionBytes = Vec<u8>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SignerError {
    /// The user declined or closed the signing request
    #[error("signing request was cancelled by the user")]
    Cancelled,

    /// The signer failed for any other reason
    #[error("signer failure: {0}")]
    Failure(String),
}

impl From<SignerError> for LedgerError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::Cancelled => LedgerError::RejectedByUser,
            SignerError::Failure(msg) => LedgerError::Unknown(format!("signer failure: {msg}")),
        }
    }
}

/// A wallet capable of signing application calls.
///
/// Implementations receive the transactions in order and must return one
/// signed blob per transaction in the same order. Whatever nesting the
/// underlying wallet protocol wants (some demand a single-element group
/// wrapper per transaction) is the implementation's concern.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign_transactions(
        &self,
        transactions: &[UnsignedTransaction],
    ) -> Result<Vec<SignedTransactionBytes>, SignerError>;
}

/// Signer returning pre-supplied blobs, for tests and for CLI flows where
/// the bytes were produced by an external tool.
pub struct StaticSigner {
    blobs: Vec<SignedTransactionBytes>,
}

impl StaticSigner {
    pub fn new(blobs: Vec<SignedTransactionBytes>) -> Self {
        Self { blobs }
    }
}

#[async_trait]
impl Signer for StaticSigner {
    async fn sign_transactions(
        &self,
        transactions: &[UnsignedTransaction],
    ) -> Result<Vec<SignedTransactionBytes>, SignerError> {
        if transactions.len() != self.blobs.len() {
            return Err(SignerError::Failure(format!(
                "have {} signed blobs for {} transactions",
                self.blobs.len(),
                transactions.len()
            )));
        }
        Ok(self.blobs.clone())
    }
}

/// Signer that always declines, for exercising cancellation paths.
pub struct DecliningSigner;

#[async_trait]
impl Signer for DecliningSigner {
    async fn sign_transactions(
        &self,
        _transactions: &[UnsignedTransaction],
    ) -> Result<Vec<SignedTransactionBytes>, SignerError> {
        Err(SignerError::Cancelled)
    }
}
