//! Append-only audit journal
//!
//! Every successful mutation appends one event. Rejected operations leave
//! no trace here (they are counted in metrics instead).

use crate::types::{BlockHeight, Principal, Stablecoin, TransferId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Journal entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Unique event ID (UUIDv7 for time-ordering)
    pub event_id: Uuid,

    /// Position in the journal (dense, from 0)
    pub sequence: u64,

    /// Principal whose call produced the event
    pub caller: Principal,

    /// Block height of the call
    pub height: BlockHeight,

    /// Wall-clock time of recording (audit only)
    pub recorded_at: DateTime<Utc>,

    /// What happened
    pub kind: EventKind,
}

/// State change recorded in the journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Sender-side balance credited
    Deposited {
        /// Credited amount
        amount: u64,
    },
    /// Governance initialized
    AuthorityContractSet {
        /// New authority
        authority: Principal,
    },
    /// Timeout window changed
    DefaultTimeoutUpdated {
        /// New window in blocks
        blocks: u64,
    },
    /// Fee percentage changed
    FeePercentageUpdated {
        /// New fee in basis points
        bps: u32,
    },
    /// Transfer created and funds escrowed
    TransferInitiated {
        /// Transfer id
        id: TransferId,
        /// Beneficiary
        recipient: Principal,
        /// Principal value
        amount: u64,
        /// Fee charged
        fee: u64,
        /// Asset
        stablecoin: Stablecoin,
        /// Timeout height
        timeout: BlockHeight,
    },
    /// Escrow locked
    TransferLocked {
        /// Transfer id
        id: TransferId,
    },
    /// Funds settled to the recipient
    TransferConfirmed {
        /// Transfer id
        id: TransferId,
        /// Amount credited to the recipient
        credited: u64,
    },
    /// Transfer aborted, restitution paid to the sender
    TransferCancelled {
        /// Transfer id
        id: TransferId,
        /// Amount returned to the sender
        refunded: u64,
    },
}

impl EventKind {
    /// Transfer this event belongs to, if any
    pub fn transfer_id(&self) -> Option<TransferId> {
        match self {
            EventKind::TransferInitiated { id, .. }
            | EventKind::TransferLocked { id }
            | EventKind::TransferConfirmed { id, .. }
            | EventKind::TransferCancelled { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// In-memory journal
#[derive(Debug, Clone, Default)]
pub struct Journal {
    events: Vec<LedgerEvent>,
}

impl Journal {
    /// Empty journal
    pub fn new() -> Self {
        Self::default()
    }

    /// Append event, returning its sequence number
    pub fn append(&mut self, caller: &Principal, height: BlockHeight, kind: EventKind) -> u64 {
        let sequence = self.events.len() as u64;
        self.events.push(LedgerEvent {
            event_id: Uuid::now_v7(),
            sequence,
            caller: caller.clone(),
            height,
            recorded_at: Utc::now(),
            kind,
        });
        sequence
    }

    /// All events in order
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Events from `sequence` onwards
    pub fn since(&self, sequence: u64) -> &[LedgerEvent] {
        let start = usize::try_from(sequence).unwrap_or(usize::MAX).min(self.events.len());
        &self.events[start..]
    }

    /// History of one transfer
    pub fn for_transfer(&self, id: TransferId) -> Vec<LedgerEvent> {
        self.events
            .iter()
            .filter(|e| e.kind.transfer_id() == Some(id))
            .cloned()
            .collect()
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the journal is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_dense() {
        let mut journal = Journal::new();
        let caller = Principal::new("ST1TEST");
        assert_eq!(journal.append(&caller, 0, EventKind::Deposited { amount: 10 }), 0);
        assert_eq!(journal.append(&caller, 1, EventKind::TransferLocked { id: 0 }), 1);
        assert_eq!(journal.len(), 2);
        assert_eq!(journal.since(1).len(), 1);
        assert!(journal.since(99).is_empty());
    }

    #[test]
    fn test_for_transfer_filters() {
        let mut journal = Journal::new();
        let caller = Principal::new("ST1TEST");
        journal.append(&caller, 0, EventKind::Deposited { amount: 10 });
        journal.append(&caller, 0, EventKind::TransferLocked { id: 0 });
        journal.append(&caller, 0, EventKind::TransferLocked { id: 1 });
        journal.append(&caller, 0, EventKind::TransferCancelled { id: 0, refunded: 5 });

        let history = journal.for_transfer(0);
        assert_eq!(history.len(), 2);
        assert!(matches!(history[1].kind, EventKind::TransferCancelled { refunded: 5, .. }));
    }

    #[test]
    fn test_event_serializes_tagged() {
        let kind = EventKind::TransferConfirmed { id: 3, credited: 1000 };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "transfer_confirmed");
        assert_eq!(json["credited"], 1000);
    }
}
