//! Venue domain - exchange adapters and the authorized venue set

mod venue_interface;
mod venue_registry;

pub use venue_interface::{SwapRequest, SwapVenue};
pub use venue_registry::{VenueInfo, VenueRegistry};
