//! Infrastructure layer - concrete ledger, lender, venue and event sink implementations

pub mod event_sinks;
pub mod simulated;

pub use event_sinks::{FanoutEventSink, MemoryEventSink};
pub use simulated::SimulatedEnvironment;
