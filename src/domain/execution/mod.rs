//! Execution domain - the flash-loan cycle and its bookkeeping

mod cycle_guard;
mod execution_context;
mod flash_executor;
mod ledger_stats;

pub use cycle_guard::CyclePhase;
pub use execution_context::{CycleOutcome, ExecutionContext, HopReceipt};
pub use flash_executor::{ExecutionReceipt, ExecutorConfig, FlashArbExecutor};
pub use ledger_stats::LedgerStats;
