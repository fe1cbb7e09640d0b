//! In-process ledger, lender and venues providing all-or-nothing cycles

mod bank;
mod constant_product_venue;
mod environment;
mod pool_lender;
mod scripted_venue;

pub use bank::{Bank, BankState};
pub use constant_product_venue::ConstantProductVenue;
pub use environment::SimulatedEnvironment;
pub use pool_lender::PoolLender;
pub use scripted_venue::ScriptedVenue;
