//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the processor.
//!
//! # Metrics
//!
//! - `remittance_deposits_total` - Successful deposits
//! - `remittance_transfers_initiated_total` - Transfers created
//! - `remittance_transfers_locked_total` - Transfers locked into escrow
//! - `remittance_transfers_confirmed_total` - Transfers settled to recipients
//! - `remittance_transfers_cancelled_total` - Transfers cancelled by senders
//! - `remittance_rejections_total{operation,kind}` - Rejected operations
//! - `remittance_escrow_outstanding` - Amount + fee held for open transfers

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Successful deposits
    pub deposits_total: IntCounter,

    /// Transfers created
    pub transfers_initiated: IntCounter,

    /// Transfers locked
    pub transfers_locked: IntCounter,

    /// Transfers confirmed
    pub transfers_confirmed: IntCounter,

    /// Transfers cancelled
    pub transfers_cancelled: IntCounter,

    /// Rejections by operation and error kind
    pub rejections: IntCounterVec,

    /// Outstanding escrow
    pub escrow_outstanding: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let deposits_total = IntCounter::new("remittance_deposits_total", "Successful deposits")?;
        registry.register(Box::new(deposits_total.clone()))?;

        let transfers_initiated = IntCounter::new(
            "remittance_transfers_initiated_total",
            "Transfers created",
        )?;
        registry.register(Box::new(transfers_initiated.clone()))?;

        let transfers_locked = IntCounter::new(
            "remittance_transfers_locked_total",
            "Transfers locked into escrow",
        )?;
        registry.register(Box::new(transfers_locked.clone()))?;

        let transfers_confirmed = IntCounter::new(
            "remittance_transfers_confirmed_total",
            "Transfers settled to recipients",
        )?;
        registry.register(Box::new(transfers_confirmed.clone()))?;

        let transfers_cancelled = IntCounter::new(
            "remittance_transfers_cancelled_total",
            "Transfers cancelled by senders",
        )?;
        registry.register(Box::new(transfers_cancelled.clone()))?;

        let rejections = IntCounterVec::new(
            Opts::new("remittance_rejections_total", "Rejected operations"),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(rejections.clone()))?;

        let escrow_outstanding = IntGauge::new(
            "remittance_escrow_outstanding",
            "Amount plus fee held for open transfers",
        )?;
        registry.register(Box::new(escrow_outstanding.clone()))?;

        Ok(Self {
            deposits_total,
            transfers_initiated,
            transfers_locked,
            transfers_confirmed,
            transfers_cancelled,
            rejections,
            escrow_outstanding,
            registry,
        })
    }

    /// Record rejected operation
    pub fn record_rejection(&self, operation: &str, kind: &str) {
        self.rejections.with_label_values(&[operation, kind]).inc();
    }

    /// Update outstanding escrow (saturates at i64::MAX)
    pub fn set_escrow_outstanding(&self, amount: u128) {
        self.escrow_outstanding
            .set(i64::try_from(amount).unwrap_or(i64::MAX));
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render in Prometheus text exposition format
    pub fn encode_text(&self) -> crate::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| crate::Error::Metrics(e.to_string()))
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("transfers_initiated", &self.transfers_initiated.get())
            .field("transfers_confirmed", &self.transfers_confirmed.get())
            .field("transfers_cancelled", &self.transfers_cancelled.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.transfers_initiated.get(), 0);
        assert_eq!(metrics.escrow_outstanding.get(), 0);

        // Private registries never collide
        let second = Metrics::new().unwrap();
        assert_eq!(second.deposits_total.get(), 0);
    }

    #[test]
    fn test_record_rejection() {
        let metrics = Metrics::new().unwrap();
        metrics.record_rejection("initiate", "insufficient_balance");
        metrics.record_rejection("initiate", "insufficient_balance");
        assert_eq!(
            metrics
                .rejections
                .with_label_values(&["initiate", "insufficient_balance"])
                .get(),
            2
        );
    }

    #[test]
    fn test_escrow_gauge_saturates() {
        let metrics = Metrics::new().unwrap();
        metrics.set_escrow_outstanding(1005);
        assert_eq!(metrics.escrow_outstanding.get(), 1005);
        metrics.set_escrow_outstanding(u128::MAX);
        assert_eq!(metrics.escrow_outstanding.get(), i64::MAX);
    }

    #[test]
    fn test_encode_text() {
        let metrics = Metrics::new().unwrap();
        metrics.transfers_initiated.inc();
        let text = metrics.encode_text().unwrap();
        assert!(text.contains("remittance_transfers_initiated_total 1"));
    }
}
