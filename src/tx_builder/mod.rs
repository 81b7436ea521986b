//! Transaction building and submission
//!
//! Split into focused modules:
//! - **builder**: unsigned application-call construction with fresh network
//!   parameters
//! - **submit**: submission, confirmation polling, and the
//!   `Built -> Submitted -> {Confirmed | TimedOut | Rejected}` lifecycle
//!
//! Signing sits between the two and is external: the builder's output goes
//! to a [`crate::signer::Signer`], and the engine only ever sees opaque
//! signed bytes.

pub mod builder;
pub mod submit;

pub use builder::{OnComplete, TransactionBuilder, UnsignedTransaction};
pub use submit::SubmissionEngine;
