//! Plan domain - the ordered swap path a cycle executes

mod arbitrage_plan;
mod plan_builder;

pub use arbitrage_plan::{ArbitragePlan, PlanFile, SwapStep};
pub use plan_builder::{quote_path, PathHop, QuotedPlan};
