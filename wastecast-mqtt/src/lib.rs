//! MQTT publishing engine for wastecast.

/// Home Assistant discovery descriptors.
pub mod discovery;
/// Broker session, reconnect policy, and the publish capability trait.
pub mod session;
/// The record-to-MQTT publishing sink.
pub mod sink;
/// Topic layout shared by state, availability, and discovery publishes.
pub mod topic;

pub use discovery::*;
pub use session::*;
pub use sink::*;
pub use topic::*;
