//! Actor-based concurrency for the processor
//!
//! Single-writer pattern: one task owns the [`RemittanceProcessor`] and
//! applies requests one at a time, so every check-then-mutate sequence
//! (balance check + debit, status check + transition) is indivisible.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │             ProcessorHandle (Clone)                  │
//! │      Senders, recipients, authorities, readers       │
//! └─────────────────────┬────────────────────────────────┘
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │             ProcessorActor (Single Task)             │
//! │   owns RemittanceProcessor, replies via oneshot      │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::events::LedgerEvent;
use crate::governance::GovernanceSnapshot;
use crate::processor::{LedgerTotals, RemittanceProcessor};
use crate::types::{CallContext, Principal, Transfer, TransferId};
use crate::{Error, Result};
use tokio::sync::{mpsc, oneshot};

/// Message sent to the processor actor
#[derive(Debug)]
pub enum ProcessorMessage {
    /// Credit caller's sender-side balance
    Deposit {
        /// Caller and height
        ctx: CallContext,
        /// Amount in base units
        amount: u64,
        /// Reply channel
        response: oneshot::Sender<Result<u64>>,
    },

    /// Install authority principal
    SetAuthorityContract {
        /// Caller and height
        ctx: CallContext,
        /// Authority principal
        authority: Principal,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Change timeout window
    SetDefaultTimeout {
        /// Caller and height
        ctx: CallContext,
        /// Timeout window in blocks
        blocks: u64,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Change fee percentage
    SetFeePercentage {
        /// Caller and height
        ctx: CallContext,
        /// Fee in basis points
        bps: u32,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Create transfer
    InitiateTransfer {
        /// Caller and height
        ctx: CallContext,
        /// Receiving principal
        recipient: Principal,
        /// Amount in base units
        amount: u64,
        /// Stablecoin symbol
        stablecoin: String,
        /// Reply channel
        response: oneshot::Sender<Result<TransferId>>,
    },

    /// Lock transfer into escrow
    LockTransfer {
        /// Caller and height
        ctx: CallContext,
        /// Transfer id
        id: TransferId,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Settle transfer to recipient
    ConfirmTransfer {
        /// Caller and height
        ctx: CallContext,
        /// Transfer id
        id: TransferId,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Cancel transfer
    CancelTransfer {
        /// Caller and height
        ctx: CallContext,
        /// Transfer id
        id: TransferId,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Fee quote under current parameters
    CalculateFee {
        /// Amount in base units
        amount: u64,
        /// Reply channel
        response: oneshot::Sender<Result<u64>>,
    },

    /// Authority set membership
    IsVerifiedAuthority {
        /// Principal to query
        principal: Principal,
        /// Reply channel
        response: oneshot::Sender<bool>,
    },

    /// Get transfer
    GetTransfer {
        /// Transfer id
        id: TransferId,
        /// Reply channel
        response: oneshot::Sender<Option<Transfer>>,
    },

    /// Get sender-side balance
    GetSenderBalance {
        /// Principal to query
        principal: Principal,
        /// Reply channel
        response: oneshot::Sender<u64>,
    },

    /// Get recipient-side balance
    GetRecipientBalance {
        /// Principal to query
        principal: Principal,
        /// Reply channel
        response: oneshot::Sender<u64>,
    },

    /// Get transfer count
    GetTransferCount {
        /// Reply channel
        response: oneshot::Sender<u64>,
    },

    /// Get governance parameters
    GetGovernance {
        /// Reply channel
        response: oneshot::Sender<GovernanceSnapshot>,
    },

    /// Get aggregate totals
    GetTotals {
        /// Reply channel
        response: oneshot::Sender<LedgerTotals>,
    },

    /// Get journal entries of one transfer
    GetTransferHistory {
        /// Transfer id
        id: TransferId,
        /// Reply channel
        response: oneshot::Sender<Vec<LedgerEvent>>,
    },

    /// Get journal entries from a sequence number
    GetEvents {
        /// First sequence number
        since: u64,
        /// Reply channel
        response: oneshot::Sender<Vec<LedgerEvent>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that owns the processor
#[derive(Debug)]
pub struct ProcessorActor {
    processor: RemittanceProcessor,
    mailbox: mpsc::Receiver<ProcessorMessage>,
}

impl ProcessorActor {
    /// Create new actor
    pub fn new(processor: RemittanceProcessor, mailbox: mpsc::Receiver<ProcessorMessage>) -> Self {
        Self { processor, mailbox }
    }

    /// Run until shutdown or until every handle is dropped
    pub async fn run(mut self) -> RemittanceProcessor {
        while let Some(msg) = self.mailbox.recv().await {
            if let ProcessorMessage::Shutdown = msg {
                tracing::info!("Processor actor shutting down");
                break;
            }
            self.handle_message(msg);
        }
        self.processor
    }

    /// Apply one message; replies to dropped requesters are discarded
    fn handle_message(&mut self, msg: ProcessorMessage) {
        let p = &mut self.processor;
        match msg {
            ProcessorMessage::Deposit { ctx, amount, response } => {
                let _ = response.send(p.deposit(&ctx, amount));
            }
            ProcessorMessage::SetAuthorityContract { ctx, authority, response } => {
                let _ = response.send(p.set_authority_contract(&ctx, authority));
            }
            ProcessorMessage::SetDefaultTimeout { ctx, blocks, response } => {
                let _ = response.send(p.set_default_timeout(&ctx, blocks));
            }
            ProcessorMessage::SetFeePercentage { ctx, bps, response } => {
                let _ = response.send(p.set_fee_percentage(&ctx, bps));
            }
            ProcessorMessage::InitiateTransfer {
                ctx,
                recipient,
                amount,
                stablecoin,
                response,
            } => {
                let _ = response.send(p.initiate_transfer(&ctx, &recipient, amount, &stablecoin));
            }
            ProcessorMessage::LockTransfer { ctx, id, response } => {
                let _ = response.send(p.lock_transfer(&ctx, id));
            }
            ProcessorMessage::ConfirmTransfer { ctx, id, response } => {
                let _ = response.send(p.confirm_transfer(&ctx, id));
            }
            ProcessorMessage::CancelTransfer { ctx, id, response } => {
                let _ = response.send(p.cancel_transfer(&ctx, id));
            }
            ProcessorMessage::CalculateFee { amount, response } => {
                let _ = response.send(p.calculate_fee(amount));
            }
            ProcessorMessage::IsVerifiedAuthority { principal, response } => {
                let _ = response.send(p.is_verified_authority(&principal));
            }
            ProcessorMessage::GetTransfer { id, response } => {
                tracing::debug!(transfer_id = id, "Transfer lookup");
                let _ = response.send(p.get_transfer(id).cloned());
            }
            ProcessorMessage::GetSenderBalance { principal, response } => {
                let _ = response.send(p.sender_balance(&principal));
            }
            ProcessorMessage::GetRecipientBalance { principal, response } => {
                let _ = response.send(p.recipient_balance(&principal));
            }
            ProcessorMessage::GetTransferCount { response } => {
                let _ = response.send(p.transfer_count());
            }
            ProcessorMessage::GetGovernance { response } => {
                let _ = response.send(p.governance());
            }
            ProcessorMessage::GetTotals { response } => {
                let _ = response.send(p.totals());
            }
            ProcessorMessage::GetTransferHistory { id, response } => {
                let _ = response.send(p.transfer_history(id));
            }
            ProcessorMessage::GetEvents { since, response } => {
                let _ = response.send(p.events_since(since).to_vec());
            }
            ProcessorMessage::Shutdown => {
                // Handled in run loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Debug, Clone)]
pub struct ProcessorHandle {
    sender: mpsc::Sender<ProcessorMessage>,
}

impl ProcessorHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<ProcessorMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> ProcessorMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Credit caller's sender-side balance
    pub async fn deposit(&self, ctx: CallContext, amount: u64) -> Result<u64> {
        self.request(|response| ProcessorMessage::Deposit { ctx, amount, response })
            .await?
    }

    /// Install authority principal
    pub async fn set_authority_contract(&self, ctx: CallContext, authority: Principal) -> Result<()> {
        self.request(|response| ProcessorMessage::SetAuthorityContract {
            ctx,
            authority,
            response,
        })
        .await?
    }

    /// Change timeout window
    pub async fn set_default_timeout(&self, ctx: CallContext, blocks: u64) -> Result<()> {
        self.request(|response| ProcessorMessage::SetDefaultTimeout { ctx, blocks, response })
            .await?
    }

    /// Change fee percentage
    pub async fn set_fee_percentage(&self, ctx: CallContext, bps: u32) -> Result<()> {
        self.request(|response| ProcessorMessage::SetFeePercentage { ctx, bps, response })
            .await?
    }

    /// Create transfer
    pub async fn initiate_transfer(
        &self,
        ctx: CallContext,
        recipient: Principal,
        amount: u64,
        stablecoin: impl Into<String>,
    ) -> Result<TransferId> {
        let stablecoin = stablecoin.into();
        self.request(|response| ProcessorMessage::InitiateTransfer {
            ctx,
            recipient,
            amount,
            stablecoin,
            response,
        })
        .await?
    }

    /// Lock transfer into escrow
    pub async fn lock_transfer(&self, ctx: CallContext, id: TransferId) -> Result<()> {
        self.request(|response| ProcessorMessage::LockTransfer { ctx, id, response })
            .await?
    }

    /// Settle transfer to recipient
    pub async fn confirm_transfer(&self, ctx: CallContext, id: TransferId) -> Result<()> {
        self.request(|response| ProcessorMessage::ConfirmTransfer { ctx, id, response })
            .await?
    }

    /// Cancel transfer
    pub async fn cancel_transfer(&self, ctx: CallContext, id: TransferId) -> Result<()> {
        self.request(|response| ProcessorMessage::CancelTransfer { ctx, id, response })
            .await?
    }

    /// Fee quote under current parameters
    pub async fn calculate_fee(&self, amount: u64) -> Result<u64> {
        self.request(|response| ProcessorMessage::CalculateFee { amount, response })
            .await?
    }

    /// Authority set membership
    pub async fn is_verified_authority(&self, principal: Principal) -> Result<bool> {
        self.request(|response| ProcessorMessage::IsVerifiedAuthority { principal, response })
            .await
    }

    /// Get transfer
    pub async fn get_transfer(&self, id: TransferId) -> Result<Option<Transfer>> {
        self.request(|response| ProcessorMessage::GetTransfer { id, response })
            .await
    }

    /// Get sender-side balance
    pub async fn sender_balance(&self, principal: Principal) -> Result<u64> {
        self.request(|response| ProcessorMessage::GetSenderBalance { principal, response })
            .await
    }

    /// Get recipient-side balance
    pub async fn recipient_balance(&self, principal: Principal) -> Result<u64> {
        self.request(|response| ProcessorMessage::GetRecipientBalance { principal, response })
            .await
    }

    /// Get transfer count
    pub async fn transfer_count(&self) -> Result<u64> {
        self.request(|response| ProcessorMessage::GetTransferCount { response })
            .await
    }

    /// Get governance parameters
    pub async fn governance(&self) -> Result<GovernanceSnapshot> {
        self.request(|response| ProcessorMessage::GetGovernance { response })
            .await
    }

    /// Get aggregate totals
    pub async fn totals(&self) -> Result<LedgerTotals> {
        self.request(|response| ProcessorMessage::GetTotals { response })
            .await
    }

    /// Get journal entries of one transfer
    pub async fn transfer_history(&self, id: TransferId) -> Result<Vec<LedgerEvent>> {
        self.request(|response| ProcessorMessage::GetTransferHistory { id, response })
            .await
    }

    /// Get journal entries from `since`
    pub async fn events(&self, since: u64) -> Result<Vec<LedgerEvent>> {
        self.request(|response| ProcessorMessage::GetEvents { since, response })
            .await
    }

    /// Ask the actor to stop after draining earlier messages
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(ProcessorMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the processor actor
///
/// The returned join handle yields the processor back after shutdown.
pub fn spawn_processor_actor(
    processor: RemittanceProcessor,
    mailbox_capacity: usize,
) -> (ProcessorHandle, tokio::task::JoinHandle<RemittanceProcessor>) {
    let (tx, rx) = mpsc::channel(mailbox_capacity); // Bounded channel for backpressure
    let actor = ProcessorActor::new(processor, rx);

    let join = tokio::spawn(actor.run());

    (ProcessorHandle::new(tx), join)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::ComplianceGate;
    use crate::governance::{GovernanceRegistry, StaticAuthoritySet};
    use std::sync::Arc;

    fn spawn() -> (ProcessorHandle, tokio::task::JoinHandle<RemittanceProcessor>) {
        let governance = GovernanceRegistry::new(Arc::new(StaticAuthoritySet::default()));
        let processor = RemittanceProcessor::new(governance, ComplianceGate::default());
        spawn_processor_actor(processor, 16)
    }

    #[tokio::test]
    async fn test_actor_spawn_and_shutdown() {
        let (handle, join) = spawn();
        handle.shutdown().await.unwrap();
        let processor = join.await.unwrap();
        assert_eq!(processor.transfer_count(), 0);

        // Mailbox closed after shutdown
        let err = handle.transfer_count().await.unwrap_err();
        assert!(matches!(err, Error::Concurrency(_)));
    }

    #[tokio::test]
    async fn test_actor_round_trip() {
        let (handle, _join) = spawn();

        handle
            .set_authority_contract(CallContext::new("ST2TEST", 0), Principal::new("ST2TEST"))
            .await
            .unwrap();
        handle.deposit(CallContext::new("ST1TEST", 0), 2000).await.unwrap();

        let id = handle
            .initiate_transfer(CallContext::new("ST1TEST", 0), Principal::new("ST3RECIP"), 1000, "USDC")
            .await
            .unwrap();
        assert_eq!(id, 0);

        let transfer = handle.get_transfer(0).await.unwrap().unwrap();
        assert_eq!(transfer.fee, 5);
        assert_eq!(handle.sender_balance(Principal::new("ST1TEST")).await.unwrap(), 995);
        assert!(handle.totals().await.unwrap().is_balanced());

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_domain_errors_pass_through() {
        let (handle, _join) = spawn();
        let err = handle
            .initiate_transfer(CallContext::new("ST1TEST", 0), Principal::new("ST3RECIP"), 1000, "USDC")
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(100));
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_initiations_never_overdraw() {
        let (handle, _join) = spawn();
        handle
            .set_authority_contract(CallContext::new("ST2TEST", 0), Principal::new("ST2TEST"))
            .await
            .unwrap();
        // Enough for exactly three transfers of 1000 + 5
        handle.deposit(CallContext::new("ST1TEST", 0), 3015).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..10 {
            let h = handle.clone();
            tasks.push(tokio::spawn(async move {
                h.initiate_transfer(CallContext::new("ST1TEST", 0), Principal::new("ST3RECIP"), 1000, "USDT")
                    .await
            }));
        }

        let mut ok = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                ok += 1;
            }
        }

        assert_eq!(ok, 3);
        assert_eq!(handle.transfer_count().await.unwrap(), 3);
        assert_eq!(handle.sender_balance(Principal::new("ST1TEST")).await.unwrap(), 0);
        handle.shutdown().await.unwrap();
    }
}
