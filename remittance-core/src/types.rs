//! Core types for the remittance ledger
//!
//! Statuses and assets are closed enums so that free-form strings never
//! reach the state machine. Amounts are integer base units.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transfer identifier (dense, starts at 0)
pub type TransferId = u64;

/// Block height supplied by the height oracle
pub type BlockHeight = u64;

/// Reserved null/burn principal that can never hold authority
pub const BURN_ADDRESS: &str = "SP000000000000000000002Q6VF78";

/// Opaque account identifier (sender, recipient or authority)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Principal(String);

impl Principal {
    /// Create new principal
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty or whitespace-only identifiers are not addressable
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Whether this is the reserved burn address
    pub fn is_burn_address(&self) -> bool {
        self.0 == BURN_ADDRESS
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Principal {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Principal {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Supported stablecoins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stablecoin {
    /// USD Coin
    USDC,
    /// Tether
    USDT,
    /// Dai
    DAI,
}

impl Stablecoin {
    /// All supported assets
    pub const ALL: [Stablecoin; 3] = [Stablecoin::USDC, Stablecoin::USDT, Stablecoin::DAI];

    /// Ticker symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Stablecoin::USDC => "USDC",
            Stablecoin::USDT => "USDT",
            Stablecoin::DAI => "DAI",
        }
    }
}

impl FromStr for Stablecoin {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stablecoin::ALL
            .into_iter()
            .find(|coin| coin.symbol() == s)
            .ok_or_else(|| crate::Error::InvalidStablecoin(s.to_string()))
    }
}

impl fmt::Display for Stablecoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Transfer status
///
/// `Initiated -> Locked -> Confirmed`, or `Initiated | Locked -> Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Funds escrowed, awaiting lock
    Initiated,
    /// Escrow locked, awaiting recipient confirmation
    Locked,
    /// Settled to the recipient (terminal)
    Confirmed,
    /// Aborted by the sender (terminal)
    Cancelled,
}

impl TransferStatus {
    /// Check if status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Confirmed | TransferStatus::Cancelled)
    }

    /// Whether funds for a transfer in this status are still held in escrow
    pub fn is_escrowed(&self) -> bool {
        !self.is_terminal()
    }

    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Initiated => "initiated",
            TransferStatus::Locked => "locked",
            TransferStatus::Confirmed => "confirmed",
            TransferStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transfer record
///
/// `fee`, `timestamp` and `timeout` are fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Transfer id
    pub id: TransferId,

    /// Initiating caller
    pub sender: Principal,

    /// Beneficiary
    pub recipient: Principal,

    /// Principal value moved (excludes fee)
    pub amount: u64,

    /// Asset
    pub stablecoin: Stablecoin,

    /// Current status
    pub status: TransferStatus,

    /// Block height at creation
    pub timestamp: BlockHeight,

    /// Fee charged at creation
    pub fee: u64,

    /// Last height at which lock/confirm/cancel are permitted
    pub timeout: BlockHeight,
}

impl Transfer {
    /// Amount debited from the sender at creation
    pub fn total_cost(&self) -> u64 {
        self.amount.saturating_add(self.fee)
    }

    /// Whether the timeout has passed at `height`
    pub fn is_expired(&self, height: BlockHeight) -> bool {
        height > self.timeout
    }
}

/// Who is calling, and at what height
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Calling principal
    pub caller: Principal,

    /// Current block height
    pub height: BlockHeight,
}

impl CallContext {
    /// Create new call context
    pub fn new(caller: impl Into<Principal>, height: BlockHeight) -> Self {
        Self {
            caller: caller.into(),
            height,
        }
    }

    /// Context for `caller` at the oracle's current height
    pub fn at(caller: impl Into<Principal>, oracle: &dyn crate::height::HeightOracle) -> Self {
        Self::new(caller, oracle.current_height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stablecoin_from_str() {
        assert_eq!("USDC".parse::<Stablecoin>().unwrap(), Stablecoin::USDC);
        assert_eq!("DAI".parse::<Stablecoin>().unwrap(), Stablecoin::DAI);
        assert_eq!(
            "INVALID".parse::<Stablecoin>(),
            Err(crate::Error::InvalidStablecoin("INVALID".to_string()))
        );
        // Symbols are case-sensitive
        assert!("usdc".parse::<Stablecoin>().is_err());

        for coin in Stablecoin::ALL {
            assert_eq!(coin.symbol().parse::<Stablecoin>().unwrap(), coin);
        }
    }

    #[test]
    fn test_total_cost_saturates() {
        let transfer = Transfer {
            id: 0,
            sender: Principal::new("ST1TEST"),
            recipient: Principal::new("ST3RECIP"),
            amount: u64::MAX,
            stablecoin: Stablecoin::USDC,
            status: TransferStatus::Initiated,
            timestamp: 0,
            fee: 5,
            timeout: 144,
        };
        assert_eq!(transfer.total_cost(), u64::MAX);
    }

    #[test]
    fn test_transfer_status_terminal() {
        assert!(!TransferStatus::Initiated.is_terminal());
        assert!(!TransferStatus::Locked.is_terminal());
        assert!(TransferStatus::Confirmed.is_terminal());
        assert!(TransferStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_principal_blank_and_burn() {
        assert!(Principal::new("").is_blank());
        assert!(Principal::new("   ").is_blank());
        assert!(!Principal::new("ST3RECIP").is_blank());
        assert!(Principal::new(BURN_ADDRESS).is_burn_address());
    }

    #[test]
    fn test_transfer_expiry_is_inclusive() {
        let transfer = Transfer {
            id: 0,
            sender: Principal::new("ST1TEST"),
            recipient: Principal::new("ST3RECIP"),
            amount: 1000,
            stablecoin: Stablecoin::USDC,
            status: TransferStatus::Initiated,
            timestamp: 0,
            fee: 5,
            timeout: 144,
        };
        assert!(!transfer.is_expired(144));
        assert!(transfer.is_expired(145));
        assert_eq!(transfer.total_cost(), 1005);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&TransferStatus::Locked).unwrap();
        assert_eq!(json, "\"locked\"");
    }
}
