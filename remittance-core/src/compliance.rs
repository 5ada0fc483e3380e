//! Compliance gate invoked before escrow
//!
//! The oracle is an external collaborator. The gate turns a negative answer
//! into [`Error::ComplianceFailed`] so the state machine can abort before
//! touching any state.

use crate::types::Principal;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::warn;

/// External compliance predicate
pub trait ComplianceOracle: Send + Sync {
    /// Whether `principal` may originate a transfer
    fn check(&self, principal: &Principal) -> bool;
}

/// Oracle that passes every principal
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl ComplianceOracle for AllowAll {
    fn check(&self, _principal: &Principal) -> bool {
        true
    }
}

/// Wraps a [`ComplianceOracle`] for the state machine
#[derive(Clone)]
pub struct ComplianceGate {
    oracle: Arc<dyn ComplianceOracle>,
}

impl ComplianceGate {
    /// Create gate over `oracle`
    pub fn new(oracle: Arc<dyn ComplianceOracle>) -> Self {
        Self { oracle }
    }

    /// Check the sender, failing with `ComplianceFailed`
    pub fn check_compliance(&self, sender: &Principal) -> Result<()> {
        if self.oracle.check(sender) {
            Ok(())
        } else {
            warn!(sender = %sender, "Compliance check rejected sender");
            Err(Error::ComplianceFailed(sender.to_string()))
        }
    }
}

impl Default for ComplianceGate {
    fn default() -> Self {
        Self::new(Arc::new(AllowAll))
    }
}

impl std::fmt::Debug for ComplianceGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplianceGate").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DenyOne(Principal);

    impl ComplianceOracle for DenyOne {
        fn check(&self, principal: &Principal) -> bool {
            principal != &self.0
        }
    }

    #[test]
    fn test_default_gate_passes() {
        let gate = ComplianceGate::default();
        assert!(gate.check_compliance(&Principal::new("ST1TEST")).is_ok());
    }

    #[test]
    fn test_gate_maps_rejection() {
        let gate = ComplianceGate::new(Arc::new(DenyOne(Principal::new("ST9BAD"))));
        assert!(gate.check_compliance(&Principal::new("ST1TEST")).is_ok());
        assert_eq!(
            gate.check_compliance(&Principal::new("ST9BAD")),
            Err(Error::ComplianceFailed("ST9BAD".to_string()))
        );
    }
}
