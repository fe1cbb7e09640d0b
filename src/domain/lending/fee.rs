//! Flash-loan fee calculation

use serde::{Deserialize, Serialize};

use crate::shared::errors::LendingError;
use crate::shared::types::{Amount, BPS_DENOMINATOR};

/// Rounding direction for `amount * fee_bps / 10000`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeRounding {
    /// Truncating division. Lenders refuse loans whose fee truncates to zero.
    #[default]
    Down,
    /// Ceiling division; any non-zero loan pays at least one unit
    Up,
}

pub fn compute_flash_fee(
    amount: Amount,
    fee_bps: u16,
    rounding: FeeRounding,
) -> Result<Amount, LendingError> {
    if fee_bps as u64 > BPS_DENOMINATOR {
        return Err(LendingError::FeeOverflow);
    }
    let fee = match rounding {
        FeeRounding::Down => amount.mul_bps_floor(fee_bps),
        FeeRounding::Up => amount.mul_bps_ceil(fee_bps),
    };
    fee.ok_or(LendingError::FeeOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thirty_bps_on_one_thousand() {
        let fee = compute_flash_fee(Amount::new(1000), 30, FeeRounding::Down).unwrap();
        assert_eq!(fee, Amount::new(3));
    }

    #[test]
    fn test_rounding_direction_on_small_loans() {
        let amount = Amount::new(333);
        assert_eq!(
            compute_flash_fee(amount, 30, FeeRounding::Down).unwrap(),
            Amount::ZERO
        );
        assert_eq!(
            compute_flash_fee(amount, 30, FeeRounding::Up).unwrap(),
            Amount::new(1)
        );
    }

    #[test]
    fn test_rejects_fee_above_one_hundred_percent() {
        assert_eq!(
            compute_flash_fee(Amount::new(1), 10_001, FeeRounding::Down),
            Err(LendingError::FeeOverflow)
        );
    }
}
