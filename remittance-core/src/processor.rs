//! Transfer state machine
//!
//! Owns the transfer registry and drives every balance movement.
//!
//! # Transitions
//!
//! ```text
//!   initiate ──► Initiated ──lock──► Locked ──confirm──► Confirmed
//!                    │                  │
//!                    └──────cancel──────┴──────────────► Cancelled
//! ```
//!
//! # Invariants
//!
//! - All checks run before any effect: a rejected call mutates nothing
//! - Ids are dense from 0 and never reused (the registry is a `Vec`)
//! - `fee` and `timeout` are fixed at creation
//! - Conservation: Σsender + Σrecipient + escrow + retained fees == deposits

use crate::balances::BalanceStore;
use crate::compliance::ComplianceGate;
use crate::events::{EventKind, Journal, LedgerEvent};
use crate::fees::calculate_fee;
use crate::governance::{GovernanceRegistry, GovernanceSnapshot};
use crate::metrics::Metrics;
use crate::types::{CallContext, Principal, Stablecoin, Transfer, TransferId, TransferStatus};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Aggregate ledger figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    /// Sum of all deposits
    pub total_deposits: u128,
    /// Sum of sender-side balances
    pub sender_balances: u128,
    /// Sum of recipient-side balances
    pub recipient_balances: u128,
    /// Amount + fee held for open transfers
    pub outstanding_escrow: u128,
    /// Fees kept by the system
    pub fees_retained: u128,
    /// Transfers created
    pub transfer_count: u64,
}

impl LedgerTotals {
    /// Whether every deposited unit is accounted for
    pub fn is_balanced(&self) -> bool {
        self.sender_balances + self.recipient_balances + self.outstanding_escrow + self.fees_retained
            == self.total_deposits
    }
}

/// Remittance processor
#[derive(Debug)]
pub struct RemittanceProcessor {
    governance: GovernanceRegistry,
    compliance: ComplianceGate,
    balances: BalanceStore,
    transfers: Vec<Transfer>,
    journal: Journal,
    total_deposits: u128,
    fees_retained: u128,
    metrics: Option<Metrics>,
}

impl RemittanceProcessor {
    /// Create processor over a governance registry and compliance gate
    pub fn new(governance: GovernanceRegistry, compliance: ComplianceGate) -> Self {
        Self {
            governance,
            compliance,
            balances: BalanceStore::new(),
            transfers: Vec::new(),
            journal: Journal::new(),
            total_deposits: 0,
            fees_retained: 0,
            metrics: None,
        }
    }

    /// Attach metrics collector
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    // ---------------------------------------------------------------------
    // Governance
    // ---------------------------------------------------------------------

    /// Install the authority principal (once)
    pub fn set_authority_contract(&mut self, ctx: &CallContext, authority: Principal) -> Result<()> {
        let result = self.governance.set_authority_contract(authority.clone());
        self.observe("set_authority_contract", &result);
        result?;

        self.journal
            .append(&ctx.caller, ctx.height, EventKind::AuthorityContractSet { authority });
        Ok(())
    }

    /// Change the timeout window for new transfers
    pub fn set_default_timeout(&mut self, ctx: &CallContext, blocks: u64) -> Result<()> {
        let result = self.governance.set_default_timeout(blocks);
        self.observe("set_default_timeout", &result);
        result?;

        self.journal
            .append(&ctx.caller, ctx.height, EventKind::DefaultTimeoutUpdated { blocks });
        Ok(())
    }

    /// Change the fee for new transfers
    pub fn set_fee_percentage(&mut self, ctx: &CallContext, bps: u32) -> Result<()> {
        let result = self.governance.set_fee_percentage(bps);
        self.observe("set_fee_percentage", &result);
        result?;

        self.journal
            .append(&ctx.caller, ctx.height, EventKind::FeePercentageUpdated { bps });
        Ok(())
    }

    /// Membership query against the authority set
    pub fn is_verified_authority(&self, principal: &Principal) -> bool {
        self.governance.is_verified_authority(principal)
    }

    /// Governance parameters
    pub fn governance(&self) -> GovernanceSnapshot {
        self.governance.snapshot()
    }

    /// Fee for `amount` under the current fee percentage
    pub fn calculate_fee(&self, amount: u64) -> Result<u64> {
        calculate_fee(amount, self.governance.fee_percentage())
    }

    /// Run the compliance gate for `sender`
    pub fn check_compliance(&self, sender: &Principal) -> Result<()> {
        self.compliance.check_compliance(sender)
    }

    // ---------------------------------------------------------------------
    // Balances
    // ---------------------------------------------------------------------

    /// Credit the caller's sender-side balance
    ///
    /// Balance plus open refunds owed to the caller must stay within `u64`.
    pub fn deposit(&mut self, ctx: &CallContext, amount: u64) -> Result<u64> {
        let result = self
            .check_refund_headroom(&ctx.caller, amount)
            .and_then(|()| self.balances.deposit(&ctx.caller, amount));
        self.observe("deposit", &result);
        let balance = result?;

        self.total_deposits += u128::from(amount);
        self.journal
            .append(&ctx.caller, ctx.height, EventKind::Deposited { amount });
        if let Some(metrics) = &self.metrics {
            metrics.deposits_total.inc();
        }

        info!(principal = %ctx.caller, amount, balance, "Deposit credited");
        Ok(balance)
    }

    /// Sender-side balance
    pub fn sender_balance(&self, principal: &Principal) -> u64 {
        self.balances.sender_balance(principal)
    }

    /// Recipient-side balance
    pub fn recipient_balance(&self, principal: &Principal) -> u64 {
        self.balances.recipient_balance(principal)
    }

    // ---------------------------------------------------------------------
    // Transfers
    // ---------------------------------------------------------------------

    /// Create a transfer and escrow `amount + fee` from the caller
    ///
    /// Preconditions are checked in order and the first failure wins:
    /// governance initialized, positive amount, recipient present, supported
    /// stablecoin, non-zero fee, sufficient balance, compliance.
    pub fn initiate_transfer(
        &mut self,
        ctx: &CallContext,
        recipient: &Principal,
        amount: u64,
        stablecoin: &str,
    ) -> Result<TransferId> {
        let result = self.try_initiate(ctx, recipient, amount, stablecoin);
        self.observe("initiate_transfer", &result);
        result
    }

    fn try_initiate(
        &mut self,
        ctx: &CallContext,
        recipient: &Principal,
        amount: u64,
        stablecoin: &str,
    ) -> Result<TransferId> {
        self.governance.require_initialized()?;

        if amount == 0 {
            return Err(Error::InvalidAmount("amount must be positive".to_string()));
        }

        if recipient.is_blank() {
            return Err(Error::InvalidRecipient("recipient is empty".to_string()));
        }

        let stablecoin: Stablecoin = stablecoin.parse()?;

        let fee = self.calculate_fee(amount)?;

        let total_cost = amount
            .checked_add(fee)
            .ok_or_else(|| Error::InvalidAmount("amount plus fee overflows".to_string()))?;
        let available = self.balances.sender_balance(&ctx.caller);
        if available < total_cost {
            return Err(Error::InsufficientBalance {
                required: total_cost,
                available,
            });
        }

        let timeout = ctx
            .height
            .checked_add(self.governance.default_timeout_blocks())
            .ok_or_else(|| Error::InvalidTimeout(self.governance.default_timeout_blocks()))?;

        self.compliance.check_compliance(&ctx.caller)?;

        // Effects
        self.balances.debit_sender(&ctx.caller, total_cost)?;

        let id = self.transfers.len() as TransferId;
        let transfer = Transfer {
            id,
            sender: ctx.caller.clone(),
            recipient: recipient.clone(),
            amount,
            stablecoin,
            status: TransferStatus::Initiated,
            timestamp: ctx.height,
            fee,
            timeout,
        };
        self.transfers.push(transfer);

        self.journal.append(
            &ctx.caller,
            ctx.height,
            EventKind::TransferInitiated {
                id,
                recipient: recipient.clone(),
                amount,
                fee,
                stablecoin,
                timeout,
            },
        );
        if let Some(metrics) = &self.metrics {
            metrics.transfers_initiated.inc();
        }
        self.update_escrow_gauge();

        info!(
            transfer_id = id,
            sender = %ctx.caller,
            recipient = %recipient,
            amount,
            fee,
            %stablecoin,
            timeout,
            "Transfer initiated"
        );
        Ok(id)
    }

    /// Move an initiated transfer into locked escrow
    ///
    /// Only the authority contract or a verified authority may lock.
    pub fn lock_transfer(&mut self, ctx: &CallContext, id: TransferId) -> Result<()> {
        let result = self.try_lock(ctx, id);
        self.observe("lock_transfer", &result);
        result
    }

    fn try_lock(&mut self, ctx: &CallContext, id: TransferId) -> Result<()> {
        let transfer = self.transfer_ref(id)?;

        if !self.governance.may_lock(&ctx.caller) {
            return Err(Error::NotAuthorized(format!(
                "{} may not lock transfers",
                ctx.caller
            )));
        }
        if transfer.status != TransferStatus::Initiated {
            return Err(Error::EscrowLockFailed(id));
        }
        if transfer.is_expired(ctx.height) {
            return Err(Error::TimeoutExceeded {
                id,
                timeout: transfer.timeout,
                height: ctx.height,
            });
        }

        self.transfer_mut(id)?.status = TransferStatus::Locked;

        self.journal
            .append(&ctx.caller, ctx.height, EventKind::TransferLocked { id });
        if let Some(metrics) = &self.metrics {
            metrics.transfers_locked.inc();
        }

        info!(transfer_id = id, locked_by = %ctx.caller, "Transfer locked");
        Ok(())
    }

    /// Settle a locked transfer to its recipient
    ///
    /// The fee is retained by the system.
    pub fn confirm_transfer(&mut self, ctx: &CallContext, id: TransferId) -> Result<()> {
        let result = self.try_confirm(ctx, id);
        self.observe("confirm_transfer", &result);
        result
    }

    fn try_confirm(&mut self, ctx: &CallContext, id: TransferId) -> Result<()> {
        let transfer = self.transfer_ref(id)?;

        if transfer.recipient != ctx.caller {
            return Err(Error::NotAuthorized(format!(
                "{} is not the recipient of transfer {}",
                ctx.caller, id
            )));
        }
        if transfer.status != TransferStatus::Locked {
            return Err(Error::TransferAlreadyConfirmed(id));
        }
        if transfer.is_expired(ctx.height) {
            return Err(Error::TimeoutExceeded {
                id,
                timeout: transfer.timeout,
                height: ctx.height,
            });
        }

        let (amount, fee) = (transfer.amount, transfer.fee);

        // Effects: the credit is the only fallible step, so it goes first
        self.balances.credit_recipient(&ctx.caller, amount)?;
        self.transfer_mut(id)?.status = TransferStatus::Confirmed;
        self.fees_retained += u128::from(fee);

        self.journal.append(
            &ctx.caller,
            ctx.height,
            EventKind::TransferConfirmed { id, credited: amount },
        );
        if let Some(metrics) = &self.metrics {
            metrics.transfers_confirmed.inc();
        }
        self.update_escrow_gauge();

        info!(transfer_id = id, recipient = %ctx.caller, amount, fee, "Transfer confirmed");
        Ok(())
    }

    /// Abort an open transfer, returning `amount - fee` to the sender
    pub fn cancel_transfer(&mut self, ctx: &CallContext, id: TransferId) -> Result<()> {
        let result = self.try_cancel(ctx, id);
        self.observe("cancel_transfer", &result);
        result
    }

    fn try_cancel(&mut self, ctx: &CallContext, id: TransferId) -> Result<()> {
        let transfer = self.transfer_ref(id)?;

        if transfer.sender != ctx.caller {
            return Err(Error::NotAuthorized(format!(
                "{} is not the sender of transfer {}",
                ctx.caller, id
            )));
        }
        if transfer.status.is_terminal() {
            return Err(Error::CancelNotAllowed(id));
        }
        if transfer.is_expired(ctx.height) {
            return Err(Error::TimeoutExceeded {
                id,
                timeout: transfer.timeout,
                height: ctx.height,
            });
        }

        let (total_cost, fee) = (transfer.total_cost(), transfer.fee);
        // fee <= amount / 10, so this cannot underflow
        let refund = transfer.amount - fee;

        self.balances.credit_sender(&ctx.caller, refund)?;
        self.transfer_mut(id)?.status = TransferStatus::Cancelled;
        self.fees_retained += u128::from(total_cost - refund);

        self.journal.append(
            &ctx.caller,
            ctx.height,
            EventKind::TransferCancelled { id, refunded: refund },
        );
        if let Some(metrics) = &self.metrics {
            metrics.transfers_cancelled.inc();
        }
        self.update_escrow_gauge();

        info!(transfer_id = id, sender = %ctx.caller, refund, fee, "Transfer cancelled");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    /// Transfer by id
    pub fn get_transfer(&self, id: TransferId) -> Option<&Transfer> {
        usize::try_from(id).ok().and_then(|idx| self.transfers.get(idx))
    }

    /// Number of transfers ever created (also the next id)
    pub fn transfer_count(&self) -> u64 {
        self.transfers.len() as u64
    }

    /// Transfers currently in `status`
    pub fn transfers_by_status(&self, status: TransferStatus) -> Vec<&Transfer> {
        self.transfers.iter().filter(|t| t.status == status).collect()
    }

    /// Amount + fee held for transfers that are not yet terminal
    pub fn outstanding_escrow(&self) -> u128 {
        self.transfers
            .iter()
            .filter(|t| t.status.is_escrowed())
            .map(|t| u128::from(t.total_cost()))
            .sum()
    }

    /// Fees kept on confirmation plus cancellation forfeits
    pub fn fees_retained(&self) -> u128 {
        self.fees_retained
    }

    /// Sum of all deposits ever credited
    pub fn total_deposits(&self) -> u128 {
        self.total_deposits
    }

    /// Verify that every deposited unit is accounted for
    pub fn check_conservation(&self) -> bool {
        self.totals().is_balanced()
    }

    /// Aggregate figures behind [`check_conservation`](Self::check_conservation)
    pub fn totals(&self) -> LedgerTotals {
        LedgerTotals {
            total_deposits: self.total_deposits,
            sender_balances: self.balances.total_sender(),
            recipient_balances: self.balances.total_recipient(),
            outstanding_escrow: self.outstanding_escrow(),
            fees_retained: self.fees_retained,
            transfer_count: self.transfer_count(),
        }
    }

    /// Full journal
    pub fn events(&self) -> &[LedgerEvent] {
        self.journal.events()
    }

    /// Journal entries from `sequence` onwards
    pub fn events_since(&self, sequence: u64) -> &[LedgerEvent] {
        self.journal.since(sequence)
    }

    /// Journal entries for one transfer
    pub fn transfer_history(&self, id: TransferId) -> Vec<LedgerEvent> {
        self.journal.for_transfer(id)
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn check_refund_headroom(&self, principal: &Principal, amount: u64) -> Result<()> {
        let refunds: u128 = self
            .transfers
            .iter()
            .filter(|t| t.status.is_escrowed() && &t.sender == principal)
            .map(|t| u128::from(t.amount.saturating_sub(t.fee)))
            .sum();
        let projected =
            u128::from(self.balances.sender_balance(principal)) + refunds + u128::from(amount);

        if projected > u128::from(u64::MAX) {
            return Err(Error::InvalidAmount(format!(
                "deposit would leave no room to refund open transfers of {}",
                principal
            )));
        }
        Ok(())
    }

    fn transfer_ref(&self, id: TransferId) -> Result<&Transfer> {
        self.get_transfer(id).ok_or(Error::TransferNotFound(id))
    }

    fn transfer_mut(&mut self, id: TransferId) -> Result<&mut Transfer> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.transfers.get_mut(idx))
            .ok_or(Error::TransferNotFound(id))
    }

    fn observe<T>(&self, operation: &'static str, result: &Result<T>) {
        if let Err(err) = result {
            warn!(operation, kind = err.kind(), code = ?err.code(), "Operation rejected: {}", err);
            if let Some(metrics) = &self.metrics {
                metrics.record_rejection(operation, err.kind());
            }
        }
    }

    fn update_escrow_gauge(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.set_escrow_outstanding(self.outstanding_escrow());
        }
    }
}
