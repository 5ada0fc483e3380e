//! Governance registry
//!
//! Holds the one-time authority principal and the parameters it gates.
//! Every setter validates before mutating, so a failed call leaves the
//! registry untouched.

use crate::config::GovernanceConfig;
use crate::fees::MAX_FEE_BPS;
use crate::types::Principal;
use crate::{Error, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// External authority membership
pub trait AuthoritySet: Send + Sync {
    /// Whether `principal` is a verified authority
    fn is_member(&self, principal: &Principal) -> bool;
}

/// Authority set held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticAuthoritySet {
    members: Arc<RwLock<HashSet<Principal>>>,
}

impl StaticAuthoritySet {
    /// Create from initial members
    pub fn new<I, P>(members: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Principal>,
    {
        Self {
            members: Arc::new(RwLock::new(members.into_iter().map(Into::into).collect())),
        }
    }

    /// Add member, returning false if already present
    pub fn insert(&self, principal: Principal) -> bool {
        self.members.write().insert(principal)
    }

    /// Remove member, returning false if absent
    pub fn remove(&self, principal: &Principal) -> bool {
        self.members.write().remove(principal)
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }
}

impl AuthoritySet for StaticAuthoritySet {
    fn is_member(&self, principal: &Principal) -> bool {
        self.members.read().contains(principal)
    }
}

/// Point-in-time view of governance parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceSnapshot {
    /// Authority principal, once set
    pub authority_contract: Option<Principal>,
    /// Timeout window in blocks
    pub default_timeout_blocks: u64,
    /// Fee in basis points
    pub fee_percentage: u32,
}

/// Governance registry
pub struct GovernanceRegistry {
    authority_contract: Option<Principal>,
    default_timeout_blocks: u64,
    fee_percentage: u32,
    authorities: Arc<dyn AuthoritySet>,
}

impl GovernanceRegistry {
    /// Registry with default parameters and no authority set
    pub fn new(authorities: Arc<dyn AuthoritySet>) -> Self {
        let defaults = GovernanceConfig::default();
        Self {
            authority_contract: None,
            default_timeout_blocks: defaults.default_timeout_blocks,
            fee_percentage: defaults.fee_percentage,
            authorities,
        }
    }

    /// Build from configuration, installing the authority if one is configured
    pub fn from_config(config: &GovernanceConfig, authorities: Arc<dyn AuthoritySet>) -> Result<Self> {
        if config.default_timeout_blocks == 0 {
            return Err(Error::InvalidTimeout(config.default_timeout_blocks));
        }
        if config.fee_percentage > MAX_FEE_BPS {
            return Err(Error::InvalidFeePercentage(config.fee_percentage));
        }

        let mut registry = Self {
            authority_contract: None,
            default_timeout_blocks: config.default_timeout_blocks,
            fee_percentage: config.fee_percentage,
            authorities,
        };

        if let Some(authority) = &config.authority_contract {
            registry.set_authority_contract(Principal::new(authority.as_str()))?;
        }

        Ok(registry)
    }

    /// Set the authority principal (exactly once)
    pub fn set_authority_contract(&mut self, principal: Principal) -> Result<()> {
        if principal.is_burn_address() || principal.is_blank() {
            return Err(Error::InvalidAuthority(principal.to_string()));
        }
        if self.authority_contract.is_some() {
            return Err(Error::AuthorityAlreadySet);
        }

        info!(authority = %principal, "Governance initialized");
        self.authority_contract = Some(principal);
        Ok(())
    }

    /// Set the timeout window applied to new transfers
    pub fn set_default_timeout(&mut self, blocks: u64) -> Result<()> {
        self.require_initialized()?;
        if blocks == 0 {
            return Err(Error::InvalidTimeout(blocks));
        }

        info!(old = self.default_timeout_blocks, new = blocks, "Default timeout updated");
        self.default_timeout_blocks = blocks;
        Ok(())
    }

    /// Set the fee in basis points applied to new transfers
    pub fn set_fee_percentage(&mut self, bps: u32) -> Result<()> {
        self.require_initialized()?;
        if bps > MAX_FEE_BPS {
            return Err(Error::InvalidFeePercentage(bps));
        }

        info!(old = self.fee_percentage, new = bps, "Fee percentage updated");
        self.fee_percentage = bps;
        Ok(())
    }

    /// Membership query against the authority set
    pub fn is_verified_authority(&self, principal: &Principal) -> bool {
        self.authorities.is_member(principal)
    }

    /// Authority contract or verified authority
    pub fn may_lock(&self, principal: &Principal) -> bool {
        self.authority_contract.as_ref() == Some(principal) || self.is_verified_authority(principal)
    }

    /// Fail with `NotAuthorized` until the authority is set
    pub fn require_initialized(&self) -> Result<()> {
        if self.authority_contract.is_none() {
            return Err(Error::NotAuthorized(
                "governance not initialized".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the authority has been set
    pub fn is_initialized(&self) -> bool {
        self.authority_contract.is_some()
    }

    /// Authority principal
    pub fn authority_contract(&self) -> Option<&Principal> {
        self.authority_contract.as_ref()
    }

    /// Timeout window in blocks
    pub fn default_timeout_blocks(&self) -> u64 {
        self.default_timeout_blocks
    }

    /// Fee in basis points
    pub fn fee_percentage(&self) -> u32 {
        self.fee_percentage
    }

    /// Current parameters
    pub fn snapshot(&self) -> GovernanceSnapshot {
        GovernanceSnapshot {
            authority_contract: self.authority_contract.clone(),
            default_timeout_blocks: self.default_timeout_blocks,
            fee_percentage: self.fee_percentage,
        }
    }
}

impl std::fmt::Debug for GovernanceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GovernanceRegistry")
            .field("authority_contract", &self.authority_contract)
            .field("default_timeout_blocks", &self.default_timeout_blocks)
            .field("fee_percentage", &self.fee_percentage)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BURN_ADDRESS;

    fn registry() -> GovernanceRegistry {
        GovernanceRegistry::new(Arc::new(StaticAuthoritySet::new(["ST1TEST"])))
    }

    #[test]
    fn test_authority_set_once() {
        let mut gov = registry();
        assert!(!gov.is_initialized());

        gov.set_authority_contract(Principal::new("ST2TEST")).unwrap();
        assert_eq!(gov.authority_contract(), Some(&Principal::new("ST2TEST")));

        assert_eq!(
            gov.set_authority_contract(Principal::new("ST3OTHER")),
            Err(Error::AuthorityAlreadySet)
        );
        assert_eq!(gov.authority_contract(), Some(&Principal::new("ST2TEST")));
    }

    #[test]
    fn test_burn_address_rejected() {
        let mut gov = registry();
        assert!(matches!(
            gov.set_authority_contract(Principal::new(BURN_ADDRESS)),
            Err(Error::InvalidAuthority(_))
        ));
        assert!(!gov.is_initialized());
    }

    #[test]
    fn test_fee_percentage_requires_initialization() {
        let mut gov = registry();
        assert!(matches!(gov.set_fee_percentage(100), Err(Error::NotAuthorized(_))));
        assert_eq!(gov.fee_percentage(), 50);

        gov.set_authority_contract(Principal::new("ST2TEST")).unwrap();
        gov.set_fee_percentage(100).unwrap();
        assert_eq!(gov.fee_percentage(), 100);

        assert_eq!(gov.set_fee_percentage(1001), Err(Error::InvalidFeePercentage(1001)));
        assert_eq!(gov.fee_percentage(), 100);
        gov.set_fee_percentage(MAX_FEE_BPS).unwrap();
    }

    #[test]
    fn test_default_timeout_bounds() {
        let mut gov = registry();
        assert!(matches!(gov.set_default_timeout(10), Err(Error::NotAuthorized(_))));

        gov.set_authority_contract(Principal::new("ST2TEST")).unwrap();
        assert_eq!(gov.set_default_timeout(0), Err(Error::InvalidTimeout(0)));
        assert_eq!(gov.default_timeout_blocks(), 144);

        gov.set_default_timeout(10).unwrap();
        assert_eq!(gov.default_timeout_blocks(), 10);
    }

    #[test]
    fn test_verified_authority_and_lock_rights() {
        let mut gov = registry();
        assert!(gov.is_verified_authority(&Principal::new("ST1TEST")));
        assert!(!gov.is_verified_authority(&Principal::new("ST2TEST")));

        gov.set_authority_contract(Principal::new("ST2TEST")).unwrap();
        assert!(gov.may_lock(&Principal::new("ST2TEST")));
        assert!(gov.may_lock(&Principal::new("ST1TEST")));
        assert!(!gov.may_lock(&Principal::new("ST3RECIP")));
    }

    #[test]
    fn test_from_config() {
        let config = GovernanceConfig {
            default_timeout_blocks: 10,
            fee_percentage: 25,
            authority_contract: Some("ST2TEST".to_string()),
            authorities: vec![],
        };
        let gov = GovernanceRegistry::from_config(&config, Arc::new(StaticAuthoritySet::default())).unwrap();
        assert!(gov.is_initialized());
        assert_eq!(gov.default_timeout_blocks(), 10);
        assert_eq!(gov.fee_percentage(), 25);

        let bad = GovernanceConfig { fee_percentage: 5000, ..GovernanceConfig::default() };
        assert!(GovernanceRegistry::from_config(&bad, Arc::new(StaticAuthoritySet::default())).is_err());
    }
}
