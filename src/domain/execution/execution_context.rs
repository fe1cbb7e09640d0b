//! Per-cycle execution context

use serde::Serialize;
use uuid::Uuid;

use crate::shared::errors::ExecutionError;
use crate::shared::types::{Amount, AssetId, VenueId};

/// Realized result of one hop
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HopReceipt {
    pub venue: VenueId,
    pub token_in: AssetId,
    pub token_out: AssetId,
    pub amount_in: Amount,
    /// Balance delta observed on the executor, not the venue's report
    pub amount_out: Amount,
}

/// Solvency and profit figures of a settled cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleOutcome {
    pub balance_after: Amount,
    pub amount_owed: Amount,
    pub profit: Amount,
}

/// State of a single borrow-swap-repay cycle. Created on loan receipt,
/// dropped when the cycle ends; never persisted. Only the executor opens
/// and settles one.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    cycle_id: Uuid,
    asset: AssetId,
    principal: Amount,
    fee: Amount,
    /// Executor balance of `asset` on callback entry, loan included
    balance_before: Amount,
    /// Funds the executor held before the loan arrived
    pre_loan_balance: Amount,
    hops: Vec<HopReceipt>,
    outcome: Option<CycleOutcome>,
}

impl ExecutionContext {
    pub(crate) fn open(
        cycle_id: Uuid,
        asset: AssetId,
        principal: Amount,
        fee: Amount,
        balance_before: Amount,
    ) -> Result<Self, ExecutionError> {
        // The lender must have delivered the principal before calling back
        let pre_loan_balance =
            balance_before
                .checked_sub(principal)
                .ok_or_else(|| ExecutionError::InsufficientBalance {
                    asset: asset.clone(),
                    needed: principal,
                    available: balance_before,
                })?;

        Ok(Self {
            cycle_id,
            asset,
            principal,
            fee,
            balance_before,
            pre_loan_balance,
            hops: Vec::new(),
            outcome: None,
        })
    }

    pub(crate) fn record_hop(&mut self, hop: HopReceipt) {
        self.hops.push(hop);
    }

    pub fn cycle_id(&self) -> Uuid {
        self.cycle_id
    }

    pub fn asset(&self) -> &AssetId {
        &self.asset
    }

    pub fn principal(&self) -> Amount {
        self.principal
    }

    pub fn fee(&self) -> Amount {
        self.fee
    }

    pub fn balance_before(&self) -> Amount {
        self.balance_before
    }

    pub fn pre_loan_balance(&self) -> Amount {
        self.pre_loan_balance
    }

    pub fn hops(&self) -> &[HopReceipt] {
        &self.hops
    }

    pub fn outcome(&self) -> Option<&CycleOutcome> {
        self.outcome.as_ref()
    }

    pub fn amount_owed(&self) -> Result<Amount, ExecutionError> {
        self.principal
            .checked_add(self.fee)
            .ok_or(ExecutionError::ArithmeticOverflow)
    }

    /// Verify the cycle can repay `principal + fee` and cleared `min_profit`.
    ///
    /// Funds held before the loan are excluded, so an idle treasury never
    /// covers for a losing path.
    pub(crate) fn settle(
        &mut self,
        balance_after: Amount,
        min_profit: Amount,
    ) -> Result<CycleOutcome, ExecutionError> {
        let amount_owed = self.amount_owed()?;
        let available = balance_after.saturating_sub(self.pre_loan_balance);

        if available < amount_owed {
            return Err(ExecutionError::InsufficientRepayment {
                owed: amount_owed,
                available,
            });
        }

        let profit = available.saturating_sub(amount_owed);
        if profit < min_profit {
            return Err(ExecutionError::InsufficientProfit {
                required: min_profit,
                actual: profit,
            });
        }

        let outcome = CycleOutcome {
            balance_after,
            amount_owed,
            profit,
        };
        self.outcome = Some(outcome);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(balance_before: u64) -> ExecutionContext {
        ExecutionContext::open(
            Uuid::new_v4(),
            AssetId::from("A"),
            Amount::new(1000),
            Amount::new(3),
            Amount::new(balance_before),
        )
        .unwrap()
    }

    #[test]
    fn test_settle_reference_scenario() {
        let mut ctx = context(1000);
        let outcome = ctx.settle(Amount::new(1050), Amount::ZERO).unwrap();
        assert_eq!(outcome.amount_owed, Amount::new(1003));
        assert_eq!(outcome.profit, Amount::new(47));
        assert_eq!(ctx.outcome(), Some(&outcome));
    }

    #[test]
    fn test_settle_insolvent() {
        let mut ctx = context(1000);
        assert_eq!(
            ctx.settle(Amount::new(1002), Amount::ZERO),
            Err(ExecutionError::InsufficientRepayment {
                owed: Amount::new(1003),
                available: Amount::new(1002),
            })
        );
        assert!(ctx.outcome().is_none());
    }

    #[test]
    fn test_settle_profit_threshold() {
        let mut ctx = context(1000);
        assert_eq!(
            ctx.settle(Amount::new(1008), Amount::new(10)),
            Err(ExecutionError::InsufficientProfit {
                required: Amount::new(10),
                actual: Amount::new(5),
            })
        );
        assert_eq!(
            ctx.settle(Amount::new(1008), Amount::new(5)).unwrap().profit,
            Amount::new(5)
        );
    }

    #[test]
    fn test_treasury_does_not_mask_loss() {
        // 500 already held; path returned only 990 of the 1000 borrowed
        let mut ctx = context(1500);
        assert_eq!(ctx.pre_loan_balance(), Amount::new(500));
        assert!(matches!(
            ctx.settle(Amount::new(1490), Amount::ZERO),
            Err(ExecutionError::InsufficientRepayment { .. })
        ));
    }

    #[test]
    fn test_open_requires_delivered_principal() {
        let result = ExecutionContext::open(
            Uuid::new_v4(),
            AssetId::from("A"),
            Amount::new(1000),
            Amount::new(3),
            Amount::new(999),
        );
        assert!(matches!(
            result,
            Err(ExecutionError::InsufficientBalance { .. })
        ));
    }
}
