//! Topic layout shared by state, availability, and discovery publishes.

/// Builds the topics the sink publishes to.
///
/// Empty device names drop their topic segment, so a single-address setup
/// publishes directly under the topic prefix.
#[derive(Debug, Clone)]
pub struct TopicScheme {
    topic_prefix: String,
    discovery_prefix: String,
}

impl TopicScheme {
    /// Create a scheme from the configured prefixes.
    #[must_use]
    pub fn new<T: Into<String>, D: Into<String>>(topic_prefix: T, discovery_prefix: D) -> Self {
        Self {
            topic_prefix: topic_prefix.into(),
            discovery_prefix: discovery_prefix.into(),
        }
    }

    /// Fixed availability topic, `<prefix>/status`.
    #[must_use]
    pub fn availability(&self) -> String {
        format!("{}/status", self.topic_prefix)
    }

    /// State topic for a field, `<prefix>[/<device>]/<field>/state`.
    #[must_use]
    pub fn state(&self, device: &str, field: &str) -> String {
        if device.is_empty() {
            format!("{}/{field}/state", self.topic_prefix)
        } else {
            format!("{}/{device}/{field}/state", self.topic_prefix)
        }
    }

    /// Discovery config topic,
    /// `<discovery-prefix>/<component>[/<device>]/<field>/config`.
    #[must_use]
    pub fn discovery(&self, component: &str, device: &str, field: &str) -> String {
        if device.is_empty() {
            format!("{}/{component}/{field}/config", self.discovery_prefix)
        } else {
            format!("{}/{component}/{device}/{field}/config", self.discovery_prefix)
        }
    }
}
