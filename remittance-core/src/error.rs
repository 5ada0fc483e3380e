//! Error types for the remittance ledger

use crate::types::TransferId;
use thiserror::Error;

/// Result type for remittance operations
pub type Result<T> = std::result::Result<T, Error>;

/// Remittance ledger errors
///
/// Domain rejections carry the stable numeric code returned by the
/// on-chain processor (see [`Error::code`]). A rejection never leaves
/// partial state behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Governance not initialized, or caller lacks the required relationship
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// Sender balance below amount + fee
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Amount plus fee
        required: u64,
        /// Sender-side balance at the time of the check
        available: u64,
    },

    /// Amount is zero or would overflow a balance
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Recipient missing or malformed
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// Confirm attempted on a transfer that is not locked
    #[error("Transfer {0} is not awaiting confirmation")]
    TransferAlreadyConfirmed(TransferId),

    /// Unknown transfer id
    #[error("Transfer not found: {0}")]
    TransferNotFound(TransferId),

    /// Compliance predicate rejected the sender
    #[error("Compliance check failed for {0}")]
    ComplianceFailed(String),

    /// Computed fee rounded to zero
    #[error("Fee calculation failed for amount {amount} at {fee_bps} bps")]
    FeeCalculationFailed {
        /// Transfer amount
        amount: u64,
        /// Fee percentage in basis points
        fee_bps: u32,
    },

    /// Lock attempted on a transfer that is not freshly initiated
    #[error("Escrow lock failed for transfer {0}")]
    EscrowLockFailed(TransferId),

    /// Operation attempted after the transfer timeout height
    #[error("Transfer {id} timed out at height {timeout} (current {height})")]
    TimeoutExceeded {
        /// Transfer id
        id: TransferId,
        /// Timeout height
        timeout: u64,
        /// Height at which the operation was attempted
        height: u64,
    },

    /// Asset outside the supported stablecoin set
    #[error("Invalid stablecoin: {0}")]
    InvalidStablecoin(String),

    /// Cancel attempted on a confirmed or cancelled transfer
    #[error("Cancel not allowed for transfer {0}")]
    CancelNotAllowed(TransferId),

    /// Authority contract already set
    #[error("Authority contract already set")]
    AuthorityAlreadySet,

    /// Authority principal is the reserved burn address
    #[error("Invalid authority principal: {0}")]
    InvalidAuthority(String),

    /// Timeout window must be positive
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(u64),

    /// Fee percentage above the 10% ceiling
    #[error("Invalid fee percentage: {0} bps")]
    InvalidFeePercentage(u32),

    /// Height oracle asked to move backwards
    #[error("Height regression: current {current}, requested {requested}")]
    HeightRegression {
        /// Current height
        current: u64,
        /// Requested height
        requested: u64,
    },

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

impl Error {
    /// Stable numeric code for domain rejections
    pub fn code(&self) -> Option<u32> {
        match self {
            Error::NotAuthorized(_) => Some(100),
            Error::InsufficientBalance { .. } => Some(101),
            Error::InvalidAmount(_) => Some(102),
            Error::InvalidRecipient(_) => Some(103),
            Error::TransferAlreadyConfirmed(_) => Some(104),
            Error::TransferNotFound(_) => Some(105),
            Error::ComplianceFailed(_) => Some(106),
            Error::FeeCalculationFailed { .. } => Some(107),
            Error::EscrowLockFailed(_) => Some(108),
            Error::TimeoutExceeded { .. } => Some(109),
            Error::InvalidStablecoin(_) => Some(110),
            Error::CancelNotAllowed(_) => Some(112),
            _ => None,
        }
    }

    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotAuthorized(_) => "not_authorized",
            Error::InsufficientBalance { .. } => "insufficient_balance",
            Error::InvalidAmount(_) => "invalid_amount",
            Error::InvalidRecipient(_) => "invalid_recipient",
            Error::TransferAlreadyConfirmed(_) => "transfer_already_confirmed",
            Error::TransferNotFound(_) => "transfer_not_found",
            Error::ComplianceFailed(_) => "compliance_failed",
            Error::FeeCalculationFailed { .. } => "fee_calculation_failed",
            Error::EscrowLockFailed(_) => "escrow_lock_failed",
            Error::TimeoutExceeded { .. } => "timeout_exceeded",
            Error::InvalidStablecoin(_) => "invalid_stablecoin",
            Error::CancelNotAllowed(_) => "cancel_not_allowed",
            Error::AuthorityAlreadySet => "authority_already_set",
            Error::InvalidAuthority(_) => "invalid_authority",
            Error::InvalidTimeout(_) => "invalid_timeout",
            Error::InvalidFeePercentage(_) => "invalid_fee_percentage",
            Error::HeightRegression { .. } => "height_regression",
            Error::Concurrency(_) => "concurrency",
            Error::Config(_) => "config",
            Error::Metrics(_) => "metrics",
            Error::Io(_) => "io",
        }
    }

    /// True for ordinary business rejections, false for infrastructure faults
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            Error::Concurrency(_) | Error::Config(_) | Error::Metrics(_) | Error::Io(_)
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::Metrics(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(format!("Failed to parse config: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_match_contract() {
        assert_eq!(Error::NotAuthorized("x".into()).code(), Some(100));
        assert_eq!(
            Error::InsufficientBalance { required: 10, available: 1 }.code(),
            Some(101)
        );
        assert_eq!(Error::InvalidStablecoin("X".into()).code(), Some(110));
        assert_eq!(Error::CancelNotAllowed(3).code(), Some(112));
        assert_eq!(Error::AuthorityAlreadySet.code(), None);
    }

    #[test]
    fn test_rejection_classification() {
        assert!(Error::TransferNotFound(1).is_rejection());
        assert!(Error::InvalidFeePercentage(2000).is_rejection());
        assert!(!Error::Concurrency("closed".into()).is_rejection());
    }
}
