//! Sanctions screening for remittance senders
//!
//! [`SanctionsScreener`] keeps deny-list entries grouped by source list and
//! answers the ledger's compliance question through
//! [`remittance_core::ComplianceOracle`].

pub mod error;
pub mod sanctions;
pub mod types;

pub use error::ComplianceError;
pub use sanctions::SanctionsScreener;
pub use types::{DenyEntry, SanctionsList};
