//! credledger - client for an academic-credential ledger application
//!
//! Universities onboard students, record courses, and issue badges against
//! an on-chain application; third parties verify them. This crate covers
//! the protocol side: reading roles from application state over two
//! redundant paths (indexer preferred, node fallback), building unsigned
//! application calls with fresh network parameters, submitting signed bytes
//! and waiting for confirmation, and a closed error taxonomy with bounded
//! retry for the transient classes. Signing is external: see [`signer`].

pub mod address;
pub mod badges;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod resolver;
pub mod retry;
pub mod signer;
pub mod state_reader;
pub mod tx_builder;
pub mod types;

pub use client::LedgerClient;
pub use config::Config;
pub use error::{LedgerError, Result};
pub use resolver::RoleResolver;
pub use state_reader::StateReader;
pub use tx_builder::{SubmissionEngine, TransactionBuilder};
pub use types::{ConfirmationRecord, ResolvedRole, Role, RoleState};
