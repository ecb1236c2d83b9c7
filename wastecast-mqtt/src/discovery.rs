//! Home Assistant discovery descriptors.
//!
//! Descriptors are derived, never stored: the sink regenerates them on
//! every discovery publish and relies on the broker's retain flag for
//! persistence.

use serde::Serialize;

use wastecast_core::schema::FieldSpec;

use crate::topic::TopicScheme;

/// Device block shared by every descriptor published by this bridge.
///
/// The identifier is the availability topic, which is stable per broker
/// configuration.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    /// Device identifiers array.
    pub identifiers: Vec<String>,
    /// Human-readable device name.
    pub name: String,
    /// Software version.
    pub sw_version: String,
}

/// Discovery payload for one (device, field) pair.
#[derive(Debug, Serialize)]
pub struct Descriptor {
    /// Human-readable entity name.
    pub name: String,
    /// Topic the entity state is published on.
    pub state_topic: String,
    /// Unique identifier.
    pub unique_id: String,
    /// Topic announcing bridge availability.
    pub availability_topic: String,
    /// Device metadata.
    pub device: DeviceInfo,
}

impl Descriptor {
    /// Build the descriptor for a schema field on a device.
    #[must_use]
    pub fn build(
        discovery_name: &str,
        device: &str,
        field: &FieldSpec,
        scheme: &TopicScheme,
    ) -> Self {
        let availability_topic = scheme.availability();
        Self {
            name: join_non_empty(&[discovery_name, device, field.name], " "),
            state_topic: scheme.state(device, field.name),
            unique_id: join_non_empty(&[discovery_name, device, field.name], "."),
            availability_topic: availability_topic.clone(),
            device: DeviceInfo {
                identifiers: vec![availability_topic],
                name: discovery_name.to_owned(),
                sw_version: env!("CARGO_PKG_VERSION").to_owned(),
            },
        }
    }
}

fn join_non_empty(segments: &[&str], separator: &str) -> String {
    segments
        .iter()
        .copied()
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}
