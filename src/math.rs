// src/math.rs
use crate::shared::types::{Amount, BPS_DENOMINATOR};

/// Minimum acceptable output for a quoted amount under `slippage_bps` tolerance.
/// Rounds down so the bound never exceeds what the quote allows.
pub fn calculate_min_out(quoted: Amount, slippage_bps: u16) -> Amount {
    let keep_bps = BPS_DENOMINATOR.saturating_sub(slippage_bps as u64) as u128;
    let bounded = (quoted.value() as u128) * keep_bps / (BPS_DENOMINATOR as u128);
    // bounded <= quoted, so it always fits
    Amount::new(bounded as u64)
}

/// Constant-product (x*y=k) output with the trade fee taken from the input:
/// `out = in*(10000-fee)*R_out / (R_in*10000 + in*(10000-fee))`
pub fn constant_product_amount_out(
    amount_in: Amount,
    reserve_in: Amount,
    reserve_out: Amount,
    fee_bps: u16,
) -> Option<Amount> {
    if reserve_in.is_zero() || reserve_out.is_zero() || fee_bps as u64 > BPS_DENOMINATOR {
        return None;
    }

    let in_after_fee = (amount_in.value() as u128)
        .checked_mul((BPS_DENOMINATOR - fee_bps as u64) as u128)?;
    let numerator = in_after_fee.checked_mul(reserve_out.value() as u128)?;
    let denominator = (reserve_in.value() as u128)
        .checked_mul(BPS_DENOMINATOR as u128)?
        .checked_add(in_after_fee)?;

    u64::try_from(numerator / denominator).ok().map(Amount::new)
}

/// Net result of a cycle in the loan asset: `returned - principal - fee`.
/// Negative results (a losing path) are `None`.
pub fn calculate_net_profit(returned: Amount, principal: Amount, fee: Amount) -> Option<Amount> {
    returned.checked_sub(principal.checked_add(fee)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_min_out() {
        assert_eq!(calculate_min_out(Amount::new(10_000), 50), Amount::new(9_950));
        assert_eq!(calculate_min_out(Amount::new(999), 100), Amount::new(989));
        assert_eq!(calculate_min_out(Amount::new(100), 0), Amount::new(100));
        assert_eq!(calculate_min_out(Amount::new(100), 10_000), Amount::ZERO);
    }

    #[test]
    fn test_constant_product_amount_out() {
        // 1_000_000 / 1_000_000 pool, 30 bps fee, 1_000 in:
        // 997_000 * 1_000_000 / (1_000_000_000 + 997_000) = 996.006... -> 996
        let out = constant_product_amount_out(
            Amount::new(1_000),
            Amount::new(1_000_000),
            Amount::new(1_000_000),
            30,
        );
        assert_eq!(out, Some(Amount::new(996)));
    }

    #[test]
    fn test_constant_product_rejects_empty_pool() {
        assert_eq!(
            constant_product_amount_out(Amount::new(10), Amount::ZERO, Amount::new(10), 30),
            None
        );
    }

    #[test]
    fn test_constant_product_never_drains_pool() {
        let out = constant_product_amount_out(
            Amount::new(u64::MAX),
            Amount::new(1_000),
            Amount::new(1_000),
            0,
        )
        .unwrap();
        assert!(out < Amount::new(1_000));
    }

    #[test]
    fn test_calculate_net_profit() {
        assert_eq!(
            calculate_net_profit(Amount::new(1050), Amount::new(1000), Amount::new(3)),
            Some(Amount::new(47))
        );
        assert_eq!(
            calculate_net_profit(Amount::new(1002), Amount::new(1000), Amount::new(3)),
            None
        );
    }
}
