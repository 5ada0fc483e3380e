//! Block height source
//!
//! Timeouts are evaluated against heights only, never wall-clock time.

use crate::types::BlockHeight;
use crate::{Error, Result};
use parking_lot::RwLock;
use std::sync::Arc;

/// Supplies the current block height (monotonically non-decreasing)
pub trait HeightOracle: Send + Sync {
    /// Current block height
    fn current_height(&self) -> BlockHeight;
}

/// In-process height counter driven by the embedding application or tests
#[derive(Debug, Clone, Default)]
pub struct ManualHeight {
    height: Arc<RwLock<BlockHeight>>,
}

impl ManualHeight {
    /// Start at `height`
    pub fn new(height: BlockHeight) -> Self {
        Self {
            height: Arc::new(RwLock::new(height)),
        }
    }

    /// Advance by `blocks`, returning the new height
    pub fn advance(&self, blocks: u64) -> BlockHeight {
        let mut height = self.height.write();
        *height = height.saturating_add(blocks);
        *height
    }

    /// Jump to `height`; moving backwards is rejected
    pub fn set(&self, height: BlockHeight) -> Result<()> {
        let mut current = self.height.write();
        if height < *current {
            return Err(Error::HeightRegression {
                current: *current,
                requested: height,
            });
        }
        *current = height;
        Ok(())
    }
}

impl HeightOracle for ManualHeight {
    fn current_height(&self) -> BlockHeight {
        *self.height.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_and_set() {
        let oracle = ManualHeight::new(10);
        assert_eq!(oracle.advance(5), 15);
        oracle.set(200).unwrap();
        assert_eq!(oracle.current_height(), 200);
    }

    #[test]
    fn test_set_rejects_regression() {
        let oracle = ManualHeight::new(100);
        let err = oracle.set(99).unwrap_err();
        assert_eq!(err, Error::HeightRegression { current: 100, requested: 99 });
        assert_eq!(oracle.current_height(), 100);
    }

    #[test]
    fn test_clones_share_height() {
        let oracle = ManualHeight::default();
        let view = oracle.clone();
        oracle.advance(3);
        assert_eq!(view.current_height(), 3);
    }
}
