//! Domain layer - core business logic and entities

pub mod assets;
pub mod events;
pub mod execution;
pub mod lending;
pub mod plan;
pub mod venue;
