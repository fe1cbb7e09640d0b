// src/report.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;

use crate::domain::execution::{ExecutionReceipt, LedgerStats};
use crate::domain::plan::{PlanFile, QuotedPlan};
use crate::math::calculate_net_profit;
use crate::shared::types::{AccountId, Amount, AssetId};
use crate::shared::utils::format_bps;

/// A cycle that was aborted
#[derive(Debug, Clone, Serialize)]
pub struct CycleFailure {
    pub attempt: usize,
    pub error: String,
}

/// Outcome of a `simulate` run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub executor: AccountId,
    pub receipts: Vec<ExecutionReceipt>,
    pub failures: Vec<CycleFailure>,
    pub stats: LedgerStats,
    pub executor_balances: Vec<(AssetId, Amount)>,
    pub events_emitted: usize,
    pub timestamp: DateTime<Utc>,
}

impl SimulationReport {
    pub fn new(executor: AccountId, stats: LedgerStats) -> Self {
        Self {
            executor,
            receipts: Vec::new(),
            failures: Vec::new(),
            stats,
            executor_balances: Vec::new(),
            events_emitted: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn with_receipts(mut self, receipts: Vec<ExecutionReceipt>) -> Self {
        self.receipts = receipts;
        self
    }

    pub fn with_failures(mut self, failures: Vec<CycleFailure>) -> Self {
        self.failures = failures;
        self
    }

    pub fn with_balances(mut self, balances: Vec<(AssetId, Amount)>) -> Self {
        self.executor_balances = balances;
        self
    }

    pub fn with_events_emitted(mut self, count: usize) -> Self {
        self.events_emitted = count;
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Simulation for executor {}", self.executor);

        for receipt in &self.receipts {
            let _ = writeln!(
                out,
                "  cycle {}: borrowed {} {}, fee {}, repaid {}, profit {}",
                receipt.cycle_id,
                receipt.amount,
                receipt.asset,
                receipt.fee,
                receipt.amount_owed,
                receipt.profit
            );
            for (i, hop) in receipt.hops.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "    {}. {} {} {} -> {} {}",
                    i + 1,
                    hop.venue,
                    hop.amount_in,
                    hop.token_in,
                    hop.amount_out,
                    hop.token_out
                );
            }
        }
        for failure in &self.failures {
            let _ = writeln!(out, "  attempt {} aborted: {}", failure.attempt, failure.error);
        }

        let _ = writeln!(
            out,
            "Completed {} of {} attempts ({} events)",
            self.receipts.len(),
            self.receipts.len() + self.failures.len(),
            self.events_emitted
        );
        for asset in self.stats.assets() {
            let _ = writeln!(
                out,
                "  {}: volume {}, profit {}, fees {}",
                asset,
                self.stats.total_volume(asset),
                self.stats.total_profit(asset),
                self.stats.total_fees_paid(asset)
            );
        }
        for (asset, amount) in &self.executor_balances {
            let _ = writeln!(out, "  balance {} {}", amount, asset);
        }
        out
    }
}

/// Quoted path with the lender fee applied
#[derive(Debug, Clone, Serialize)]
pub struct QuoteReport {
    pub quoted: QuotedPlan,
    pub fee: Amount,
    pub fee_bps: u16,
    pub slippage_bps: u16,
    /// `None` when the path loses money after the fee
    pub expected_profit: Option<Amount>,
    pub worst_case_profit: Option<Amount>,
}

impl QuoteReport {
    pub fn new(quoted: QuotedPlan, fee: Amount, fee_bps: u16, slippage_bps: u16) -> Self {
        let principal = quoted.loan.amount;
        Self {
            expected_profit: calculate_net_profit(quoted.expected_return, principal, fee),
            worst_case_profit: calculate_net_profit(quoted.worst_case_return, principal, fee),
            quoted,
            fee,
            fee_bps,
            slippage_bps,
        }
    }

    /// Plan file the `simulate` command accepts
    pub fn to_plan_toml(&self, min_profit: Amount) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&PlanFile {
            min_profit,
            loan: self.quoted.loan.clone(),
            steps: self.quoted.plan.clone(),
        })
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let loan = &self.quoted.loan;
        let _ = writeln!(
            out,
            "Borrow {} {} (fee {} at {}), slippage {}",
            loan.amount,
            loan.asset,
            self.fee,
            format_bps(self.fee_bps),
            format_bps(self.slippage_bps)
        );
        for (i, step) in self.quoted.plan.steps().iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. {}: {} {} -> >= {} {}",
                i + 1,
                step.venue,
                step.amount_in,
                step.token_in,
                step.min_amount_out,
                step.token_out
            );
        }
        let _ = writeln!(
            out,
            "Expected return {} (profit {}), worst case {} (profit {})",
            self.quoted.expected_return,
            describe_profit(self.expected_profit),
            self.quoted.worst_case_return,
            describe_profit(self.worst_case_profit)
        );
        out
    }
}

fn describe_profit(profit: Option<Amount>) -> String {
    match profit {
        Some(amount) => amount.to_string(),
        None => "loss".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::{ArbitragePlan, SwapStep};
    use crate::shared::types::LoanRequest;

    fn quoted(expected: u64, worst: u64) -> QuotedPlan {
        QuotedPlan {
            loan: LoanRequest::new("A", 1000),
            plan: ArbitragePlan::new(vec![
                SwapStep::new("ab", "A", "B", 1000, 1990),
                SwapStep::new("ba", "B", "A", 1990, worst),
            ]),
            expected_return: Amount::new(expected),
            worst_case_return: Amount::new(worst),
        }
    }

    #[test]
    fn test_quote_report_profit() {
        let report = QuoteReport::new(quoted(1050, 1001), Amount::new(3), 30, 50);
        assert_eq!(report.expected_profit, Some(Amount::new(47)));
        assert_eq!(report.worst_case_profit, None);

        let text = report.render_text();
        assert!(text.contains("fee 3 at 0.30%"));
        assert!(text.contains("worst case 1001 (profit loss)"));
    }

    #[test]
    fn test_quote_report_plan_toml_parses_back() {
        let report = QuoteReport::new(quoted(1050, 1020), Amount::new(3), 30, 50);
        let raw = report.to_plan_toml(Amount::new(5)).unwrap();
        let parsed: PlanFile = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.min_profit, Amount::new(5));
        assert_eq!(parsed.steps, report.quoted.plan);
    }

    #[test]
    fn test_simulation_report_serialization() {
        let report = SimulationReport::new(AccountId::from("executor"), LedgerStats::new())
            .with_failures(vec![CycleFailure {
                attempt: 1,
                error: "Executor is paused".to_string(),
            }])
            .with_events_emitted(2);

        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["executor"], "executor");
        assert_eq!(value["failures"][0]["attempt"], 1);
        assert!(report.render_text().contains("Completed 0 of 1 attempts (2 events)"));
    }
}
