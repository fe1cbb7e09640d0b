//! flasharb - flash-loan arbitrage executor
//! Built with Domain-Driven Design principles

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod math;
pub mod report;
pub mod shared;

// Re-export main types for convenience
pub use domain::execution::{ExecutionReceipt, ExecutorConfig, FlashArbExecutor};
pub use domain::plan::{ArbitragePlan, SwapStep};
pub use domain::venue::{SwapVenue, VenueRegistry};
pub use infrastructure::SimulatedEnvironment;
pub use shared::errors::{AppError, ExecutionError};
pub use shared::types::{AccountId, Amount, AssetId, LoanRequest, VenueId};
