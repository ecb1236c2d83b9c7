//! Core types, lookup algorithm, and polling for the wastecast bridge.

/// Bounded-retry lookup of the next collection date for an address.
pub mod lookup;
/// Domain models shared by the lookup client and the MQTT sink.
pub mod model;
/// Periodic lookup scheduling across all configured addresses.
pub mod poll;
/// Traits describing the upstream collection API boundary.
pub mod ports;
/// Statically declared mapping from record fields to MQTT sensors.
pub mod schema;

pub use lookup::*;
pub use model::*;
pub use poll::*;
pub use ports::*;
pub use schema::*;
