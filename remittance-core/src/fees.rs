//! Fee calculation

use crate::{Error, Result};

/// Basis-point denominator
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Highest fee governance may set (10%)
pub const MAX_FEE_BPS: u32 = 1_000;

/// `floor(amount * fee_bps / 10000)`
///
/// A fee that rounds to zero is rejected so tiny transfers cannot bypass
/// the fee model.
pub fn calculate_fee(amount: u64, fee_bps: u32) -> Result<u64> {
    let fee = u128::from(amount) * u128::from(fee_bps) / u128::from(BPS_DENOMINATOR);

    if fee == 0 {
        return Err(Error::FeeCalculationFailed { amount, fee_bps });
    }

    // Only overflows when fee_bps exceeds the denominator.
    u64::try_from(fee).map_err(|_| Error::FeeCalculationFailed { amount, fee_bps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_rate() {
        assert_eq!(calculate_fee(1000, 50).unwrap(), 5);
        assert_eq!(calculate_fee(500, 50).unwrap(), 2);
    }

    #[test]
    fn test_fee_rounds_down() {
        assert_eq!(calculate_fee(399, 50).unwrap(), 1);
        assert_eq!(calculate_fee(1999, 100).unwrap(), 19);
    }

    #[test]
    fn test_zero_fee_rejected() {
        assert_eq!(
            calculate_fee(199, 50),
            Err(Error::FeeCalculationFailed { amount: 199, fee_bps: 50 })
        );
        assert!(calculate_fee(1_000_000, 0).is_err());
    }

    #[test]
    fn test_no_overflow_at_u64_max() {
        let fee = calculate_fee(u64::MAX, MAX_FEE_BPS).unwrap();
        assert_eq!(fee, u64::MAX / 10);
    }

    proptest! {
        #[test]
        fn prop_fee_never_exceeds_ten_percent(amount in 1u64.., bps in 0u32..=MAX_FEE_BPS) {
            if let Ok(fee) = calculate_fee(amount, bps) {
                prop_assert!(fee > 0);
                prop_assert!(fee <= amount / 10);
            }
        }
    }
}
