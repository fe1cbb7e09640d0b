//! Arbitrage plan representation and validation

use serde::{Deserialize, Serialize};

use crate::shared::errors::ExecutionError;
use crate::shared::types::{Amount, AssetId, LoanRequest, UnixTimestamp, VenueId};

/// Single hop in an arbitrage plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapStep {
    pub venue: VenueId,
    pub token_in: AssetId,
    pub token_out: AssetId,
    pub amount_in: Amount,
    #[serde(default)]
    pub min_amount_out: Amount,
    /// Unix seconds after which the hop must not execute. Always
    /// serialized: the callback parameters use a positional encoding.
    #[serde(default)]
    pub deadline: Option<UnixTimestamp>,
}

impl SwapStep {
    pub fn new(
        venue: impl Into<VenueId>,
        token_in: impl Into<AssetId>,
        token_out: impl Into<AssetId>,
        amount_in: u64,
        min_amount_out: u64,
    ) -> Self {
        Self {
            venue: venue.into(),
            token_in: token_in.into(),
            token_out: token_out.into(),
            amount_in: Amount::new(amount_in),
            min_amount_out: Amount::new(min_amount_out),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: UnixTimestamp) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Ordered swap path. Executed as given; never re-routed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArbitragePlan {
    steps: Vec<SwapStep>,
}

impl ArbitragePlan {
    pub fn new(steps: Vec<SwapStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[SwapStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn venues(&self) -> impl Iterator<Item = &VenueId> {
        self.steps.iter().map(|step| &step.venue)
    }

    /// Check the plan against the loan it will run on.
    ///
    /// The path must start and end in the borrowed asset, and each hop's
    /// output must be the next hop's input.
    pub fn validate(&self, loan: &LoanRequest, max_hops: usize) -> Result<(), ExecutionError> {
        let (first, last) = match (self.steps.first(), self.steps.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ExecutionError::InvalidPlan("plan has no steps".to_string())),
        };

        if self.steps.len() > max_hops {
            return Err(ExecutionError::InvalidPlan(format!(
                "plan has {} steps, limit is {}",
                self.steps.len(),
                max_hops
            )));
        }

        if first.token_in != loan.asset {
            return Err(ExecutionError::InvalidPlan(format!(
                "first step spends {}, loan asset is {}",
                first.token_in, loan.asset
            )));
        }

        if last.token_out != loan.asset {
            return Err(ExecutionError::InvalidPlan(format!(
                "last step returns {}, loan asset is {}",
                last.token_out, loan.asset
            )));
        }

        for (index, step) in self.steps.iter().enumerate() {
            if step.amount_in.is_zero() {
                return Err(ExecutionError::InvalidPlan(format!(
                    "step {} has zero amount_in",
                    index
                )));
            }
            if step.token_in == step.token_out {
                return Err(ExecutionError::InvalidPlan(format!(
                    "step {} swaps {} into itself",
                    index, step.token_in
                )));
            }
        }

        for (index, pair) in self.steps.windows(2).enumerate() {
            if pair[0].token_out != pair[1].token_in {
                return Err(ExecutionError::InvalidPlan(format!(
                    "step {} outputs {} but step {} spends {}",
                    index,
                    pair[0].token_out,
                    index + 1,
                    pair[1].token_in
                )));
            }
        }

        Ok(())
    }
}

/// On-disk plan: the loan, the path and the caller's profit floor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanFile {
    #[serde(default)]
    pub min_profit: Amount,
    pub loan: LoanRequest,
    pub steps: ArbitragePlan,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loan() -> LoanRequest {
        LoanRequest::new("A", 1000)
    }

    #[test]
    fn test_valid_round_trip_path() {
        let plan = ArbitragePlan::new(vec![
            SwapStep::new("alpha", "A", "B", 1000, 0),
            SwapStep::new("beta", "B", "A", 2000, 0),
        ]);
        assert!(plan.validate(&loan(), 8).is_ok());
    }

    #[test]
    fn test_rejects_empty_plan() {
        let err = ArbitragePlan::default().validate(&loan(), 8).unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidPlan(_)));
    }

    #[test]
    fn test_rejects_broken_chain() {
        let plan = ArbitragePlan::new(vec![
            SwapStep::new("alpha", "A", "B", 1000, 0),
            SwapStep::new("beta", "C", "A", 2000, 0),
        ]);
        let err = plan.validate(&loan(), 8).unwrap_err();
        match err {
            ExecutionError::InvalidPlan(reason) => assert!(reason.contains("step 1 spends C")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_path_not_returning_to_loan_asset() {
        let plan = ArbitragePlan::new(vec![SwapStep::new("alpha", "A", "B", 1000, 0)]);
        assert!(matches!(
            plan.validate(&loan(), 8),
            Err(ExecutionError::InvalidPlan(_))
        ));

        let plan = ArbitragePlan::new(vec![
            SwapStep::new("alpha", "B", "C", 1000, 0),
            SwapStep::new("beta", "C", "A", 1000, 0),
        ]);
        assert!(matches!(
            plan.validate(&loan(), 8),
            Err(ExecutionError::InvalidPlan(_))
        ));
    }

    #[test]
    fn test_rejects_zero_amount_and_self_swap() {
        let plan = ArbitragePlan::new(vec![
            SwapStep::new("alpha", "A", "B", 0, 0),
            SwapStep::new("beta", "B", "A", 10, 0),
        ]);
        assert!(plan.validate(&loan(), 8).is_err());

        let plan = ArbitragePlan::new(vec![SwapStep::new("alpha", "A", "A", 10, 0)]);
        assert!(plan.validate(&loan(), 8).is_err());
    }

    #[test]
    fn test_rejects_too_many_hops() {
        let plan = ArbitragePlan::new(vec![
            SwapStep::new("alpha", "A", "B", 10, 0),
            SwapStep::new("beta", "B", "C", 10, 0),
            SwapStep::new("gamma", "C", "A", 10, 0),
        ]);
        assert!(plan.validate(&loan(), 3).is_ok());
        assert!(plan.validate(&loan(), 2).is_err());
    }

    #[test]
    fn test_plan_file_parses_from_toml() {
        let raw = r#"
            min_profit = 5

            [loan]
            asset = "USDC"
            amount = 1000

            [[steps]]
            venue = "alpha"
            token_in = "USDC"
            token_out = "WETH"
            amount_in = 1000
            min_amount_out = 990
            deadline = 1700000000

            [[steps]]
            venue = "beta"
            token_in = "WETH"
            token_out = "USDC"
            amount_in = 990
        "#;
        let file: PlanFile = toml::from_str(raw).unwrap();
        assert_eq!(file.min_profit, Amount::new(5));
        assert_eq!(file.loan, LoanRequest::new("USDC", 1000));
        assert_eq!(file.steps.len(), 2);
        assert_eq!(file.steps.steps()[0].deadline, Some(1_700_000_000));
        assert_eq!(file.steps.steps()[1].min_amount_out, Amount::ZERO);
        assert!(file.steps.validate(&file.loan, 8).is_ok());
    }
}
