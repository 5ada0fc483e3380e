//! Service orchestration layer
//!
//! Ties configuration, collaborators and the processor actor together.
//! Mutations issued through the service take their height from the
//! configured [`HeightOracle`].
//!
//! # Example
//!
//! ```no_run
//! use remittance_core::{Collaborators, Config, Principal, RemittanceService};
//!
//! #[tokio::main]
//! async fn main() -> remittance_core::Result<()> {
//!     let config = Config::default();
//!     let collaborators = Collaborators::from_config(&config);
//!     let service = RemittanceService::start(config, collaborators).await?;
//!
//!     service.deposit(Principal::new("ST1TEST"), 2000).await?;
//!
//!     service.shutdown().await?;
//!     Ok(())
//! }
//! ```

use crate::actor::{spawn_processor_actor, ProcessorHandle};
use crate::compliance::{AllowAll, ComplianceGate, ComplianceOracle};
use crate::governance::{AuthoritySet, GovernanceRegistry, StaticAuthoritySet};
use crate::height::{HeightOracle, ManualHeight};
use crate::metrics::Metrics;
use crate::processor::{LedgerTotals, RemittanceProcessor};
use crate::types::{CallContext, Principal, TransferId};
use crate::{Config, Error, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// External collaborators of the processor
#[derive(Clone)]
pub struct Collaborators {
    /// Verified authority membership
    pub authorities: Arc<dyn AuthoritySet>,

    /// Compliance predicate
    pub compliance: Arc<dyn ComplianceOracle>,

    /// Block height source
    pub height: Arc<dyn HeightOracle>,
}

impl Collaborators {
    /// Configured authority set, allow-all compliance, manual height at 0
    pub fn from_config(config: &Config) -> Self {
        Self {
            authorities: Arc::new(StaticAuthoritySet::new(
                config.governance.authorities.iter().cloned(),
            )),
            compliance: Arc::new(AllowAll),
            height: Arc::new(ManualHeight::default()),
        }
    }

    /// Replace the compliance oracle
    pub fn with_compliance(mut self, compliance: Arc<dyn ComplianceOracle>) -> Self {
        self.compliance = compliance;
        self
    }

    /// Replace the height oracle
    pub fn with_height(mut self, height: Arc<dyn HeightOracle>) -> Self {
        self.height = height;
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("height", &self.height.current_height())
            .finish_non_exhaustive()
    }
}

/// Running remittance service
pub struct RemittanceService {
    /// Actor handle
    handle: ProcessorHandle,

    /// Actor task, yields the processor on shutdown
    join: JoinHandle<RemittanceProcessor>,

    /// Height source for service-level calls
    height: Arc<dyn HeightOracle>,

    /// Metrics
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl RemittanceService {
    /// Build the processor from configuration and spawn its actor
    pub async fn start(config: Config, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;

        let governance = GovernanceRegistry::from_config(&config.governance, collaborators.authorities)?;
        let compliance = ComplianceGate::new(collaborators.compliance);
        let metrics = Metrics::new()?;

        let processor = RemittanceProcessor::new(governance, compliance).with_metrics(metrics.clone());
        let (handle, join) = spawn_processor_actor(processor, config.actor.mailbox_capacity);

        tracing::info!(
            service = %config.service_name,
            version = %config.service_version,
            fee_bps = config.governance.fee_percentage,
            timeout_blocks = config.governance.default_timeout_blocks,
            "Remittance service started"
        );

        Ok(Self {
            handle,
            join,
            height: collaborators.height,
            metrics,
            config,
        })
    }

    /// Cloneable handle for direct, context-explicit access
    pub fn handle(&self) -> ProcessorHandle {
        self.handle.clone()
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Context for `caller` at the oracle's current height
    pub fn context(&self, caller: Principal) -> CallContext {
        CallContext::at(caller, self.height.as_ref())
    }

    /// Credit caller's sender-side balance
    pub async fn deposit(&self, caller: Principal, amount: u64) -> Result<u64> {
        self.handle.deposit(self.context(caller), amount).await
    }

    /// Create transfer at the current height
    pub async fn initiate_transfer(
        &self,
        caller: Principal,
        recipient: Principal,
        amount: u64,
        stablecoin: &str,
    ) -> Result<TransferId> {
        self.handle
            .initiate_transfer(self.context(caller), recipient, amount, stablecoin)
            .await
    }

    /// Lock transfer at the current height
    pub async fn lock_transfer(&self, caller: Principal, id: TransferId) -> Result<()> {
        self.handle.lock_transfer(self.context(caller), id).await
    }

    /// Confirm transfer at the current height
    pub async fn confirm_transfer(&self, caller: Principal, id: TransferId) -> Result<()> {
        self.handle.confirm_transfer(self.context(caller), id).await
    }

    /// Cancel transfer at the current height
    pub async fn cancel_transfer(&self, caller: Principal, id: TransferId) -> Result<()> {
        self.handle.cancel_transfer(self.context(caller), id).await
    }

    /// Stop the actor and return the final totals
    pub async fn shutdown(self) -> Result<LedgerTotals> {
        self.handle.shutdown().await?;
        let processor = self
            .join
            .await
            .map_err(|e| Error::Concurrency(format!("Processor actor failed: {}", e)))?;

        let totals = processor.totals();
        tracing::info!(
            transfers = totals.transfer_count,
            balanced = totals.is_balanced(),
            "Remittance service stopped"
        );
        Ok(totals)
    }
}

impl std::fmt::Debug for RemittanceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemittanceService")
            .field("service_name", &self.config.service_name)
            .field("height", &self.height.current_height())
            .finish_non_exhaustive()
    }
}
