//! Remittance Core
//!
//! Authority-governed stablecoin remittance ledger: a sender escrows funds,
//! an authority locks the escrow, the recipient confirms receipt, or the
//! sender cancels before the timeout height.
//!
//! # Architecture
//!
//! - **Ledger Store**: sender-side and recipient-side balance books
//! - **Governance Registry**: one-time authority, timeout window, fee bps
//! - **Fee Calculator**: `floor(amount * bps / 10000)`, zero fees rejected
//! - **Compliance Gate**: pluggable predicate checked before escrow
//! - **Transfer State Machine**: the registry and its transition rules
//! - **Single Writer**: one actor task applies every operation in order
//!
//! # Invariants
//!
//! - Conservation: deposits == balances + open escrow + retained fees
//! - Exactly-once settlement: no transition out of Confirmed or Cancelled
//! - Timeout-bounded finality: lock/confirm/cancel only up to `timeout`
//! - Rejections never mutate state

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod balances;
pub mod compliance;
pub mod config;
pub mod error;
pub mod events;
pub mod fees;
pub mod governance;
pub mod height;
pub mod metrics;
pub mod processor;
pub mod service;
pub mod telemetry;
pub mod types;

// Re-exports
pub use actor::{spawn_processor_actor, ProcessorHandle};
pub use compliance::{AllowAll, ComplianceGate, ComplianceOracle};
pub use config::Config;
pub use error::{Error, Result};
pub use events::{EventKind, LedgerEvent};
pub use governance::{AuthoritySet, GovernanceRegistry, GovernanceSnapshot, StaticAuthoritySet};
pub use height::{HeightOracle, ManualHeight};
pub use processor::{LedgerTotals, RemittanceProcessor};
pub use service::{Collaborators, RemittanceService};
pub use types::{
    BlockHeight, CallContext, Principal, Stablecoin, Transfer, TransferId, TransferStatus,
    BURN_ADDRESS,
};
